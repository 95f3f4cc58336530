//! DTLS-Transport-Treiber
//!
//! Verbindet die DTLS-Session eines Streams mit dem Netzwerk: legt die
//! Session beim ersten Bedarf an, treibt sie mit eingehenden Datagrammen,
//! versendet die erzeugten Records und pflegt die Metriken.
//!
//! ```text
//! Empfangs-Loop (extern)
//!     |  datagramm_verarbeiten(stream, daten, ziel)
//!     v
//! DtlsTransport
//!     |-- session_sicherstellen()   <- lazy, Fehler: Session verwerfen
//!     |-- DtlsSession::treiben()    <- ein Handshake-Schritt
//!     |-- Pruefergebnisse zaehlen
//!     v
//! DatagrammSender::senden()         <- ein Versuch, keine Wiederholung
//! ```

use mediarelay_crypto::{
    CryptoError, DtlsAktion, DtlsIdentity, DtlsKonfig, DtlsSession, PruefErgebnis,
};
use mediarelay_observability::DtlsMetrics;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::error::MediaResult;
use crate::stream::MediaStream;
use crate::udp::{AusgehendesDatagramm, DatagrammSender};

/// Wohin Records ohne explizite Zieladresse gehen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZielWahl {
    /// An den zuletzt bekannten Endpunkt des Streams
    #[default]
    LetzterEndpunkt,
    /// Nur an explizit uebergebene Adressen
    NurExplizit,
}

/// Was mit dem Ergebnis eines Handshake-Schritts passiert ist
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Zustellung {
    /// Kein Record zu senden
    Nichts,
    Gesendet { ziel: SocketAddr, bytes: usize },
    /// Ausgangspuffer ueber der Sicherheitsgrenze, nichts gesendet
    Verworfen,
    /// Weder explizites Ziel noch bekannter Endpunkt
    KeinZiel,
    /// Sendeversuch fehlgeschlagen, wird nicht wiederholt
    Sendefehler,
}

pub struct DtlsTransport {
    identity: Arc<DtlsIdentity>,
    konfig: Arc<DtlsKonfig>,
    sender: Arc<dyn DatagrammSender>,
    metriken: Option<DtlsMetrics>,
    zielwahl: ZielWahl,
}

impl DtlsTransport {
    pub fn neu(
        identity: Arc<DtlsIdentity>,
        konfig: DtlsKonfig,
        sender: Arc<dyn DatagrammSender>,
    ) -> Self {
        Self {
            identity,
            konfig: Arc::new(konfig),
            sender,
            metriken: None,
            zielwahl: ZielWahl::default(),
        }
    }

    pub fn mit_metriken(mut self, metriken: DtlsMetrics) -> Self {
        self.metriken = Some(metriken);
        self
    }

    pub fn mit_zielwahl(mut self, zielwahl: ZielWahl) -> Self {
        self.zielwahl = zielwahl;
        self
    }

    pub fn identity(&self) -> &DtlsIdentity {
        &self.identity
    }

    pub fn konfig(&self) -> &DtlsKonfig {
        &self.konfig
    }

    /// Legt die DTLS-Session des Streams an und fuehrt den ersten Schritt aus
    ///
    /// Die aktive Rolle sendet dabei ihren ClientHello, die passive wartet.
    /// Auf einem bereits initialisierten Stream wird nur ein Schritt ohne
    /// Eingang ausgefuehrt.
    pub fn verbindung_initialisieren(&self, stream: &MediaStream) -> MediaResult<Zustellung> {
        self.treiben(stream, None, None)
    }

    /// Verarbeitet ein empfangenes DTLS-Datagramm
    ///
    /// `ziel` ueberschreibt die Zieladresse der Antwort; ohne wird nach
    /// [`ZielWahl`] entschieden.
    pub fn datagramm_verarbeiten(
        &self,
        stream: &MediaStream,
        daten: &[u8],
        ziel: Option<SocketAddr>,
    ) -> MediaResult<Zustellung> {
        self.treiben(stream, Some(daten), ziel)
    }

    fn treiben(
        &self,
        stream: &MediaStream,
        eingang: Option<&[u8]>,
        ziel: Option<SocketAddr>,
    ) -> MediaResult<Zustellung> {
        let mut slot = stream.dtls_sperren();
        let session = self.session_sicherstellen(stream, &mut slot)?;

        let war_verbunden = session.ist_verbunden();
        let ergebnis = session.treiben(eingang);
        self.pruefungen_zaehlen(&session.pruefungen_entnehmen());

        if !war_verbunden && session.ist_verbunden() {
            if let Some(m) = &self.metriken {
                m.handshakes_total.inc();
            }
        }

        let daten = match ergebnis {
            Ok(DtlsAktion::Keine) => return Ok(Zustellung::Nichts),
            Ok(DtlsAktion::Senden(daten)) => daten,
            Err(CryptoError::PufferUeberlauf { ausstehend, grenze }) => {
                tracing::error!(
                    stream = %stream.id(),
                    ausstehend,
                    grenze,
                    "DTLS-Ausgangspuffer uebergelaufen, verworfen"
                );
                if let Some(m) = &self.metriken {
                    m.buffer_overflows_total.inc();
                }
                return Ok(Zustellung::Verworfen);
            }
            Err(e) => {
                tracing::error!(stream = %stream.id(), fehler = %e, "DTLS-Session verworfen");
                *slot = None;
                return Err(e.into());
            }
        };
        drop(slot);

        Ok(self.senden(stream, &daten, ziel))
    }

    fn session_sicherstellen<'a>(
        &self,
        stream: &MediaStream,
        slot: &'a mut Option<DtlsSession>,
    ) -> MediaResult<&'a mut DtlsSession> {
        let init = slot
            .get_or_insert_with(|| DtlsSession::neu(stream.id().to_string()))
            .initialisieren(
                stream.rolle(),
                &self.identity,
                &self.konfig,
                stream.fingerprint_slot(),
            );
        if let Err(e) = init {
            tracing::error!(
                stream = %stream.id(),
                fehler = %e,
                "DTLS-Session konnte nicht initialisiert werden"
            );
            if let Some(m) = &self.metriken {
                m.session_init_failures_total.inc();
            }
            *slot = None;
            return Err(e.into());
        }

        slot.as_mut()
            .ok_or_else(|| CryptoError::NichtInitialisiert.into())
    }

    fn pruefungen_zaehlen(&self, pruefungen: &[PruefErgebnis]) {
        let Some(m) = &self.metriken else {
            return;
        };
        for pruefung in pruefungen {
            match pruefung {
                PruefErgebnis::Akzeptiert => m.peer_certs_accepted_total.inc(),
                PruefErgebnis::Abgelehnt(grund) => m
                    .peer_certs_rejected_total
                    .with_label_values(&[grund.als_str()])
                    .inc(),
            }
        }
    }

    /// Bestimmt die Zieladresse eines Records
    pub fn ziel_bestimmen(&self, stream: &MediaStream, explizit: Option<SocketAddr>) -> Option<SocketAddr> {
        match (explizit, self.zielwahl) {
            (Some(ziel), _) => Some(ziel),
            (None, ZielWahl::LetzterEndpunkt) => stream.endpunkt().map(|e| e.socket_addr()),
            (None, ZielWahl::NurExplizit) => None,
        }
    }

    fn senden(&self, stream: &MediaStream, daten: &[u8], ziel: Option<SocketAddr>) -> Zustellung {
        let Some(ziel) = self.ziel_bestimmen(stream, ziel) else {
            tracing::warn!(
                stream = %stream.id(),
                bytes = daten.len(),
                "Kein Ziel fuer DTLS-Record bekannt, verworfen"
            );
            return Zustellung::KeinZiel;
        };

        let datagramm = AusgehendesDatagramm {
            quelle: stream.lokal(),
            ziel,
            nutzdaten: daten,
        };

        match self.sender.senden(&datagramm) {
            Ok(bytes) => {
                tracing::trace!(stream = %stream.id(), bytes, ziel = %ziel, "DTLS-Record gesendet");
                if let Some(m) = &self.metriken {
                    m.datagrams_sent_total.inc();
                    m.sent_bytes.observe(bytes as f64);
                }
                Zustellung::Gesendet { ziel, bytes }
            }
            Err(e) => {
                tracing::warn!(stream = %stream.id(), fehler = %e, ziel = %ziel, "DTLS-Sendefehler");
                if let Some(m) = &self.metriken {
                    m.send_errors_total.inc();
                }
                Zustellung::Sendefehler
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
