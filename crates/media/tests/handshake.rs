//! Handshake zwischen zwei Relay-Instanzen ueber aufgezeichnete Datagramme
//! sowie ueber echte UDP-Sockets auf Loopback.

use mediarelay_core::{DtlsRolle, StreamId};
use mediarelay_crypto::{DtlsIdentity, DtlsKonfig, Fingerprint, SessionZustand};
use mediarelay_media::{
    AusgehendesDatagramm, DatagrammSender, DtlsTransport, MediaStream, PktinfoSender, Zustellung,
};
use mediarelay_observability::DtlsMetrics;
use parking_lot::Mutex;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

#[derive(Default)]
struct Aufzeichner {
    gesendet: Mutex<Vec<Vec<u8>>>,
}

impl Aufzeichner {
    fn entnehmen(&self) -> Vec<Vec<u8>> {
        std::mem::take(&mut *self.gesendet.lock())
    }
}

impl DatagrammSender for Aufzeichner {
    fn senden(&self, d: &AusgehendesDatagramm<'_>) -> io::Result<usize> {
        self.gesendet.lock().push(d.nutzdaten.to_vec());
        Ok(d.nutzdaten.len())
    }
}

struct Seite {
    transport: DtlsTransport,
    metriken: DtlsMetrics,
    sender: Arc<Aufzeichner>,
    stream: MediaStream,
}

fn seite(rolle: DtlsRolle, lokal: &str, peer: &str) -> Seite {
    let identity = Arc::new(DtlsIdentity::erzeugen().unwrap());
    let sender = Arc::new(Aufzeichner::default());
    let metriken = DtlsMetrics::neu().unwrap();
    let transport = DtlsTransport::neu(identity, DtlsKonfig::default(), sender.clone())
        .mit_metriken(metriken.clone());
    let stream = MediaStream::neu(StreamId::new(), rolle, lokal.parse().unwrap());
    stream.endpunkt_setzen(peer.parse::<SocketAddr>().unwrap().into());
    Seite {
        transport,
        metriken,
        sender,
        stream,
    }
}

fn paar() -> (Seite, Seite) {
    let a = seite(DtlsRolle::Aktiv, "10.0.0.1:4000", "10.0.0.2:5000");
    let b = seite(DtlsRolle::Passiv, "10.0.0.2:5000", "10.0.0.1:4000");
    (a, b)
}

fn fingerprints_austauschen(a: &Seite, b: &Seite) {
    a.stream
        .fingerprint_setzen(b.transport.identity().fingerprint().clone());
    b.stream
        .fingerprint_setzen(a.transport.identity().fingerprint().clone());
}

/// Pendelt Datagramme, bis nichts mehr unterwegs ist; liefert die Zahl der
/// Flights A->B
fn pendeln(a: &Seite, b: &Seite) -> usize {
    a.transport.verbindung_initialisieren(&a.stream).unwrap();
    let mut flights = 0;
    for _ in 0..10 {
        let von_a = a.sender.entnehmen();
        if !von_a.is_empty() {
            flights += 1;
        }
        for d in von_a {
            let _ = b.transport.datagramm_verarbeiten(&b.stream, &d, None);
        }
        let von_b = b.sender.entnehmen();
        if von_b.is_empty() && a.sender.gesendet.lock().is_empty() {
            break;
        }
        for d in von_b {
            let _ = a.transport.datagramm_verarbeiten(&a.stream, &d, None);
        }
    }
    flights
}

#[test]
fn handshake_mit_passenden_fingerprints() {
    let (a, b) = paar();
    fingerprints_austauschen(&a, &b);

    let flights = pendeln(&a, &b);

    assert_eq!(a.stream.dtls_zustand(), SessionZustand::Verbunden);
    assert_eq!(b.stream.dtls_zustand(), SessionZustand::Verbunden);
    assert_eq!(flights, 2, "ClientHello und Client-Flight");

    assert_eq!(a.metriken.handshakes_total.get(), 1);
    assert_eq!(b.metriken.handshakes_total.get(), 1);
    // ein Aufruf pro Pruefschritt der Kette, mindestens einer
    assert!(a.metriken.peer_certs_accepted_total.get() >= 1);
    assert!(b.metriken.peer_certs_accepted_total.get() >= 1);
}

#[test]
fn srtp_schluessel_passen_ueberkreuz() {
    let (a, b) = paar();
    fingerprints_austauschen(&a, &b);
    pendeln(&a, &b);

    let ka = a.stream.srtp_schluessel().unwrap();
    let kb = b.stream.srtp_schluessel().unwrap();
    assert_eq!(ka.suite.name, "AES_CM_128_HMAC_SHA1_80");
    assert_eq!(ka.suite, kb.suite);
    assert_eq!(ka.lokal, kb.entfernt);
    assert_eq!(ka.entfernt, kb.lokal);
    assert_eq!(ka.lokal.len(), 30);
}

#[test]
fn verbundener_stream_bleibt_unveraendert() {
    let (a, b) = paar();
    fingerprints_austauschen(&a, &b);
    pendeln(&a, &b);

    let gesendet_vorher = a.metriken.datagrams_sent_total.get();
    for _ in 0..2 {
        assert_eq!(
            a.transport.verbindung_initialisieren(&a.stream).unwrap(),
            Zustellung::Nichts
        );
    }
    assert_eq!(a.stream.dtls_zustand(), SessionZustand::Verbunden);
    assert_eq!(a.metriken.datagrams_sent_total.get(), gesendet_vorher);
    assert_eq!(a.metriken.handshakes_total.get(), 1);
}

#[test]
fn falscher_fingerprint_wird_abgelehnt() {
    let (a, b) = paar();
    let fremd = DtlsIdentity::erzeugen().unwrap();
    a.stream
        .fingerprint_setzen(b.transport.identity().fingerprint().clone());
    b.stream.fingerprint_setzen(fremd.fingerprint().clone());

    pendeln(&a, &b);

    assert_ne!(b.stream.dtls_zustand(), SessionZustand::Verbunden);
    assert_ne!(a.stream.dtls_zustand(), SessionZustand::Verbunden);
    assert!(
        b.metriken
            .peer_certs_rejected_total
            .with_label_values(&["abweichung"])
            .get()
            >= 1
    );
    assert_eq!(b.metriken.handshakes_total.get(), 0);
}

#[test]
fn fehlender_fingerprint_wird_abgelehnt() {
    let (a, b) = paar();
    a.stream
        .fingerprint_setzen(b.transport.identity().fingerprint().clone());

    pendeln(&a, &b);

    assert_ne!(b.stream.dtls_zustand(), SessionZustand::Verbunden);
    assert!(
        b.metriken
            .peer_certs_rejected_total
            .with_label_values(&["kein_fingerprint"])
            .get()
            >= 1
    );
}

#[test]
fn nachgereichter_fingerprint_erlaubt_neuen_handshake() {
    let (a, b) = paar();
    a.stream
        .fingerprint_setzen(b.transport.identity().fingerprint().clone());

    pendeln(&a, &b);
    assert_eq!(b.stream.dtls_zustand(), SessionZustand::Initialisiert);
    assert_eq!(b.metriken.handshakes_total.get(), 0);

    // Signalisierung liefert den Fingerprint nach, die aktive Seite startet neu
    b.stream
        .fingerprint_setzen(a.transport.identity().fingerprint().clone());
    a.stream.dtls_zuruecksetzen();
    pendeln(&a, &b);

    assert_eq!(a.stream.dtls_zustand(), SessionZustand::Verbunden);
    assert_eq!(b.stream.dtls_zustand(), SessionZustand::Verbunden);
    assert_eq!(b.metriken.handshakes_total.get(), 1);
    let ka = a.stream.srtp_schluessel().unwrap();
    let kb = b.stream.srtp_schluessel().unwrap();
    assert_eq!(ka.lokal, kb.entfernt);
}

#[test]
fn gesendetes_datagramm_ist_der_ganze_flight() {
    let a = seite(DtlsRolle::Aktiv, "10.0.0.1:4000", "10.0.0.2:5000");

    let z = a.transport.verbindung_initialisieren(&a.stream).unwrap();
    let gesendet = a.sender.entnehmen();
    assert_eq!(gesendet.len(), 1);
    match z {
        Zustellung::Gesendet { bytes, .. } => assert_eq!(bytes, gesendet[0].len()),
        andere => panic!("unerwartete Zustellung: {andere:?}"),
    }
}

#[test]
fn fingerprint_mit_sha256_wird_akzeptiert() {
    let (a, b) = paar();
    let sha256 = mediarelay_crypto::hash_funktion_suchen("sha-256").unwrap();
    a.stream.fingerprint_setzen(
        b.transport.identity().fingerprint_mit(sha256).unwrap(),
    );
    let text = a.transport.identity().fingerprint_mit(sha256).unwrap().to_string();
    b.stream.fingerprint_setzen(Fingerprint::parsen(&text).unwrap());

    pendeln(&a, &b);

    assert!(a.stream.ist_verbunden());
    assert!(b.stream.ist_verbunden());
}

#[test]
fn gemeinsame_identitaet_fuer_mehrere_streams() {
    let identity = Arc::new(DtlsIdentity::erzeugen().unwrap());
    let peer = DtlsIdentity::erzeugen().unwrap();
    let sender = Arc::new(Aufzeichner::default());
    let transport = DtlsTransport::neu(Arc::clone(&identity), DtlsKonfig::default(), sender.clone());

    let streams: Vec<MediaStream> = (0..3)
        .map(|i| {
            let s = MediaStream::neu(
                StreamId::new(),
                DtlsRolle::Aktiv,
                format!("10.0.0.1:{}", 4000 + i).parse().unwrap(),
            );
            s.endpunkt_setzen("10.0.0.9:9000".parse::<SocketAddr>().unwrap().into());
            s.fingerprint_setzen(peer.fingerprint().clone());
            s
        })
        .collect();

    for s in &streams {
        transport.verbindung_initialisieren(s).unwrap();
        assert_eq!(s.dtls_zustand(), SessionZustand::Initialisiert);
    }
    assert_eq!(sender.entnehmen().len(), 3);
}

#[tokio::test]
async fn handshake_ueber_udp_loopback() {
    let sock_a = PktinfoSender::binden("127.0.0.1:0".parse().unwrap()).await.unwrap();
    let sock_b = PktinfoSender::binden("127.0.0.1:0".parse().unwrap()).await.unwrap();
    let addr_a = sock_a.lokale_adresse().unwrap();
    let addr_b = sock_b.lokale_adresse().unwrap();
    let empfang_a = Arc::clone(sock_a.socket());
    let empfang_b = Arc::clone(sock_b.socket());

    let id_a = Arc::new(DtlsIdentity::erzeugen().unwrap());
    let id_b = Arc::new(DtlsIdentity::erzeugen().unwrap());

    let transport_a = DtlsTransport::neu(Arc::clone(&id_a), DtlsKonfig::default(), Arc::new(sock_a));
    let transport_b = DtlsTransport::neu(Arc::clone(&id_b), DtlsKonfig::default(), Arc::new(sock_b));

    let stream_a = MediaStream::neu(StreamId::new(), DtlsRolle::Aktiv, addr_a);
    let stream_b = MediaStream::neu(StreamId::new(), DtlsRolle::Passiv, addr_b);
    stream_a.endpunkt_setzen(addr_b.into());
    stream_a.fingerprint_setzen(id_b.fingerprint().clone());
    stream_b.fingerprint_setzen(id_a.fingerprint().clone());

    let z = transport_a.verbindung_initialisieren(&stream_a).unwrap();
    assert!(matches!(z, Zustellung::Gesendet { ziel, .. } if ziel == addr_b));

    let mut buf_a = vec![0u8; 65536];
    let mut buf_b = vec![0u8; 65536];
    while !(stream_a.ist_verbunden() && stream_b.ist_verbunden()) {
        tokio::select! {
            empfangen = empfang_b.recv_from(&mut buf_b) => {
                let (n, von) = empfangen.unwrap();
                stream_b.endpunkt_setzen(von.into());
                transport_b.datagramm_verarbeiten(&stream_b, &buf_b[..n], None).unwrap();
            }
            empfangen = empfang_a.recv_from(&mut buf_a) => {
                let (n, _) = empfangen.unwrap();
                transport_a.datagramm_verarbeiten(&stream_a, &buf_a[..n], None).unwrap();
            }
            _ = tokio::time::sleep(Duration::from_secs(5)) => panic!("Handshake-Timeout"),
        }
    }

    let ka = stream_a.srtp_schluessel().unwrap();
    let kb = stream_b.srtp_schluessel().unwrap();
    assert_eq!(ka.lokal, kb.entfernt);
}
