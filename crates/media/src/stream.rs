//! Media-Stream – DTLS-relevanter Zustand eines Streams
//!
//! Die Signalisierung legt Rolle und erwarteten Peer-Fingerprint fest, die
//! Session-Verwaltung den Endpunkt des Peers. Die DTLS-Session selbst wird
//! erst beim ersten Handshake-Schritt vom Transport-Treiber angelegt.
//!
//! Thread-safe: Endpunkt und Fingerprint liegen hinter `RwLock`, die Session
//! hinter einem `Mutex`, der `treiben()`-Aufrufe pro Stream serialisiert.

use mediarelay_core::{DtlsRolle, Endpunkt, StreamId};
use mediarelay_crypto::{
    CryptoError, DtlsSession, Fingerprint, FingerprintSlot, SessionZustand, SrtpSchluessel,
};
use parking_lot::{Mutex, MutexGuard, RwLock};
use std::net::SocketAddr;
use std::sync::Arc;

use crate::error::MediaResult;

pub struct MediaStream {
    id: StreamId,
    rolle: DtlsRolle,
    /// Lokale Adresse, von der DTLS-Records gesendet werden
    lokal: SocketAddr,
    /// Zuletzt bekannter Endpunkt des Peers
    endpunkt: RwLock<Option<Endpunkt>>,
    erwartet: FingerprintSlot,
    dtls: Mutex<Option<DtlsSession>>,
}

impl MediaStream {
    pub fn neu(id: StreamId, rolle: DtlsRolle, lokal: SocketAddr) -> Self {
        Self {
            id,
            rolle,
            lokal,
            endpunkt: RwLock::new(None),
            erwartet: Arc::new(RwLock::new(None)),
            dtls: Mutex::new(None),
        }
    }

    pub fn id(&self) -> StreamId {
        self.id
    }

    pub fn rolle(&self) -> DtlsRolle {
        self.rolle
    }

    pub fn lokal(&self) -> SocketAddr {
        self.lokal
    }

    pub fn endpunkt(&self) -> Option<Endpunkt> {
        *self.endpunkt.read()
    }

    pub fn endpunkt_setzen(&self, endpunkt: Endpunkt) {
        let alt = self.endpunkt.write().replace(endpunkt);
        if alt.is_some_and(|alt| alt != endpunkt) {
            tracing::debug!(stream = %self.id, endpunkt = %endpunkt, "Peer-Endpunkt gewechselt");
        }
    }

    /// Setzt den erwarteten Peer-Fingerprint
    ///
    /// Wirkt auch auf eine bereits laufende Session, da deren Verify-Callback
    /// denselben Slot liest.
    pub fn fingerprint_setzen(&self, fingerprint: Fingerprint) {
        tracing::debug!(stream = %self.id, fingerprint = %fingerprint, "Peer-Fingerprint gesetzt");
        *self.erwartet.write() = Some(fingerprint);
    }

    /// Uebernimmt Algorithmus und Digest aus der Signalisierung
    ///
    /// Ein Digest, dessen Laenge nicht zum Algorithmus passt, wird hier
    /// abgewiesen und der bisherige Fingerprint bleibt bestehen.
    pub fn fingerprint_signalisiert(&self, algorithmus: &str, digest: Vec<u8>) -> MediaResult<()> {
        let fingerprint = Fingerprint::aus_name(algorithmus, digest).inspect_err(|e| {
            tracing::warn!(stream = %self.id, fehler = %e, "Signalisierter Fingerprint ungueltig");
        })?;
        self.fingerprint_setzen(fingerprint);
        Ok(())
    }

    pub fn erwarteter_fingerprint(&self) -> Option<Fingerprint> {
        self.erwartet.read().clone()
    }

    pub(crate) fn fingerprint_slot(&self) -> &FingerprintSlot {
        &self.erwartet
    }

    pub(crate) fn dtls_sperren(&self) -> MutexGuard<'_, Option<DtlsSession>> {
        self.dtls.lock()
    }

    /// Zustand der DTLS-Session; ohne Session `Uninitialisiert`
    pub fn dtls_zustand(&self) -> SessionZustand {
        self.dtls
            .lock()
            .as_ref()
            .map_or(SessionZustand::Uninitialisiert, DtlsSession::zustand)
    }

    pub fn ist_verbunden(&self) -> bool {
        self.dtls_zustand() == SessionZustand::Verbunden
    }

    /// Verwirft die DTLS-Session samt Puffern und SSL-Kontext
    pub fn dtls_zuruecksetzen(&self) {
        if self.dtls.lock().take().is_some() {
            tracing::debug!(stream = %self.id, "DTLS-Session verworfen");
        }
    }

    /// Ausgehandeltes SRTP-Schluesselmaterial des verbundenen Streams
    pub fn srtp_schluessel(&self) -> MediaResult<SrtpSchluessel> {
        let dtls = self.dtls.lock();
        let session = dtls.as_ref().ok_or(CryptoError::NichtInitialisiert)?;
        Ok(session.srtp_schluessel()?)
    }
}

impl std::fmt::Debug for MediaStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaStream")
            .field("id", &self.id)
            .field("rolle", &self.rolle)
            .field("lokal", &self.lokal)
            .field("endpunkt", &self.endpunkt())
            .field("dtls", &self.dtls_zustand())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MediaError;

    fn stream(rolle: DtlsRolle) -> MediaStream {
        MediaStream::neu(StreamId::new(), rolle, "127.0.0.1:40000".parse().unwrap())
    }

    #[test]
    fn neuer_stream_ohne_session() {
        let s = stream(DtlsRolle::Passiv);
        assert_eq!(s.dtls_zustand(), SessionZustand::Uninitialisiert);
        assert!(!s.ist_verbunden());
        assert!(s.endpunkt().is_none());
        assert!(s.erwarteter_fingerprint().is_none());
    }

    #[test]
    fn endpunkt_setzen_und_wechseln() {
        let s = stream(DtlsRolle::Aktiv);
        let a: SocketAddr = "10.0.0.1:5000".parse().unwrap();
        let b: SocketAddr = "10.0.0.2:6000".parse().unwrap();
        s.endpunkt_setzen(a.into());
        assert_eq!(s.endpunkt().unwrap().socket_addr(), a);
        s.endpunkt_setzen(b.into());
        assert_eq!(s.endpunkt().unwrap().socket_addr(), b);
    }

    #[test]
    fn signalisierter_fingerprint_wird_uebernommen() {
        let s = stream(DtlsRolle::Aktiv);
        s.fingerprint_signalisiert("SHA-256", vec![0xAB; 32]).unwrap();
        let fp = s.erwarteter_fingerprint().unwrap();
        assert_eq!(fp.hash_funktion().name, "sha-256");
        assert_eq!(fp.digest(), &[0xAB; 32][..]);
    }

    #[test]
    fn falsche_digest_laenge_wird_abgewiesen() {
        let s = stream(DtlsRolle::Aktiv);
        s.fingerprint_signalisiert("sha-1", vec![1; 20]).unwrap();

        let err = s.fingerprint_signalisiert("sha-1", vec![2; 32]).unwrap_err();
        assert!(err.ist_konfigurationsfehler());
        assert!(matches!(
            err,
            MediaError::Dtls(CryptoError::UngueltigeDigestLaenge { erwartet: 20, erhalten: 32, .. })
        ));
        // alter Wert bleibt bestehen
        assert_eq!(s.erwarteter_fingerprint().unwrap().digest(), &[1; 20][..]);
    }

    #[test]
    fn unbekannter_algorithmus_wird_abgewiesen() {
        let s = stream(DtlsRolle::Passiv);
        let err = s.fingerprint_signalisiert("md5", vec![0; 16]).unwrap_err();
        assert!(matches!(err, MediaError::Dtls(CryptoError::UnbekannteHashFunktion(_))));
    }

    #[test]
    fn srtp_schluessel_ohne_session() {
        let s = stream(DtlsRolle::Aktiv);
        assert!(matches!(
            s.srtp_schluessel(),
            Err(MediaError::Dtls(CryptoError::NichtInitialisiert))
        ));
    }

    #[test]
    fn zuruecksetzen_ohne_session_ist_noop() {
        let s = stream(DtlsRolle::Aktiv);
        s.dtls_zuruecksetzen();
        assert_eq!(s.dtls_zustand(), SessionZustand::Uninitialisiert);
    }
}
