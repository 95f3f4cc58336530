//! DTLS-Handshake-Session eines Media-Streams
//!
//! Zustaende: `Uninitialisiert -> Initialisiert -> Verbunden`. Einen
//! Fehlerzustand gibt es nicht: nach einem fehlgeschlagenen Handshake-Schritt
//! wird die OpenSSL-Verbindung aus dem gespeicherten Kontext neu aufgesetzt,
//! die Session bleibt `Initialisiert` und das naechste Datagramm loest einen
//! neuen Versuch aus. Ein bereits geschriebener Alert wird noch gesendet.
//!
//! Eine Session ist nicht fuer parallele Aufrufe gedacht; der besitzende
//! Stream serialisiert `treiben()`.

use bytes::Bytes;
use mediarelay_core::DtlsRolle;
use openssl::error::ErrorStack;
use openssl::ssl::{ErrorCode, Ssl, SslContext, SslMethod, SslStream, SslVerifyMode};
use std::sync::Arc;

use crate::dtls::config::DtlsKonfig;
use crate::dtls::puffer::DatagrammPuffer;
use crate::dtls::srtp::{schluessel_exportieren, SrtpSchluessel};
use crate::dtls::verify::{callback_bauen, FingerprintSlot, PruefErgebnis, PruefProtokoll};
use crate::error::{CryptoError, CryptoResult};
use crate::identity::DtlsIdentity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionZustand {
    Uninitialisiert,
    Initialisiert,
    Verbunden,
}

/// Ergebnis eines `treiben()`-Aufrufs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DtlsAktion {
    /// Nichts zu senden
    Keine,
    /// Record(s) fuer den Peer, genau der Inhalt des Ausgangspuffers
    Senden(Bytes),
}

type Verbindung = SslStream<DatagrammPuffer>;

/// DTLS-Zustand eines Media-Streams
pub struct DtlsSession {
    kennung: String,
    zustand: SessionZustand,
    rolle: Option<DtlsRolle>,
    kontext: Option<SslContext>,
    mtu: u32,
    verbindung: Option<Verbindung>,
    max_ausgang: usize,
    pruefungen: PruefProtokoll,
}

impl DtlsSession {
    /// Erstellt eine uninitialisierte Session; `kennung` erscheint in Logs
    pub fn neu(kennung: impl Into<String>) -> Self {
        Self {
            kennung: kennung.into(),
            zustand: SessionZustand::Uninitialisiert,
            rolle: None,
            kontext: None,
            mtu: 0,
            verbindung: None,
            max_ausgang: 0,
            pruefungen: Default::default(),
        }
    }

    /// Baut den SSL-Kontext gegen die gemeinsame Identitaet auf
    ///
    /// Auf einer bereits initialisierten Session ein No-Op.
    pub fn initialisieren(
        &mut self,
        rolle: DtlsRolle,
        identity: &DtlsIdentity,
        konfig: &DtlsKonfig,
        erwartet: &FingerprintSlot,
    ) -> CryptoResult<()> {
        if self.zustand != SessionZustand::Uninitialisiert {
            return Ok(());
        }

        let mtu = u32::try_from(konfig.mtu).unwrap_or(u32::MAX);
        let kontext = self
            .kontext_bauen(identity, konfig, erwartet)
            .map_err(CryptoError::kontext)?;
        let verbindung =
            verbindung_oeffnen(&kontext, rolle, mtu).map_err(CryptoError::kontext)?;

        self.kontext = Some(kontext);
        self.verbindung = Some(verbindung);
        self.rolle = Some(rolle);
        self.mtu = mtu;
        self.max_ausgang = konfig.max_ausgang;
        self.zustand = SessionZustand::Initialisiert;

        tracing::debug!(stream = %self.kennung, rolle = %rolle, "DTLS-Session initialisiert");
        Ok(())
    }

    fn kontext_bauen(
        &self,
        identity: &DtlsIdentity,
        konfig: &DtlsKonfig,
        erwartet: &FingerprintSlot,
    ) -> Result<SslContext, ErrorStack> {
        let mut ctx = SslContext::builder(SslMethod::dtls())?;

        // RSA-1024 liegt unterhalb von Security-Level 2
        ctx.set_security_level(1);

        ctx.set_certificate(identity.zertifikat())?;
        ctx.set_private_key(identity.schluessel())?;
        ctx.check_private_key()?;

        ctx.set_verify_callback(
            SslVerifyMode::PEER | SslVerifyMode::FAIL_IF_NO_PEER_CERT,
            callback_bauen(
                Arc::downgrade(erwartet),
                self.kennung.clone(),
                Arc::clone(&self.pruefungen),
            ),
        );
        ctx.set_verify_depth(konfig.verify_tiefe);
        ctx.set_cipher_list(&konfig.cipher_liste)?;
        ctx.set_tlsext_use_srtp(&konfig.srtp_profile)?;
        Ok(ctx.build())
    }

    /// Ersetzt die OpenSSL-Verbindung durch eine frische mit gleicher Rolle
    ///
    /// Noch nicht abgeholte Ausgangsdaten (z.B. ein Alert) wandern mit.
    fn neu_aufsetzen(&mut self) -> CryptoResult<()> {
        let (Some(kontext), Some(rolle)) = (&self.kontext, self.rolle) else {
            return Err(CryptoError::NichtInitialisiert);
        };
        let mut neu = verbindung_oeffnen(kontext, rolle, self.mtu).map_err(CryptoError::kontext)?;

        if let Some(alt) = self.verbindung.as_mut() {
            let rest = alt.get_mut().ausgang_entnehmen();
            neu.get_mut().ausgang_anhaengen(&rest);
        }
        self.verbindung = Some(neu);
        Ok(())
    }

    /// Nimmt ein Datagramm entgegen, fuehrt einen Handshake-Schritt aus und
    /// liefert die zu sendenden Records
    ///
    /// Ohne Eingang aufgerufen startet die aktive Rolle den Handshake.
    pub fn treiben(&mut self, eingang: Option<&[u8]>) -> CryptoResult<DtlsAktion> {
        if self.zustand == SessionZustand::Verbunden {
            return Ok(DtlsAktion::Keine);
        }

        let verbindung = self
            .verbindung
            .as_mut()
            .ok_or(CryptoError::NichtInitialisiert)?;

        if let Some(daten) = eingang {
            verbindung.get_mut().eingang_anhaengen(daten);
        }

        match verbindung.do_handshake() {
            Ok(()) => {
                self.zustand = SessionZustand::Verbunden;
                tracing::debug!(stream = %self.kennung, "DTLS-Handshake erfolgreich");
            }
            Err(e) if e.code() == ErrorCode::WANT_READ || e.code() == ErrorCode::WANT_WRITE => {
                tracing::trace!(stream = %self.kennung, "DTLS-Handshake wartet auf Peer");
            }
            Err(e) => {
                tracing::debug!(
                    stream = %self.kennung,
                    grund = %e,
                    "DTLS-Handshake-Schritt fehlgeschlagen, Verbindung wird neu aufgesetzt"
                );
                self.neu_aufsetzen()?;
            }
        }

        let verbindung = self
            .verbindung
            .as_mut()
            .ok_or(CryptoError::NichtInitialisiert)?;
        Self::ausgang_leeren(verbindung.get_mut(), self.max_ausgang)
    }

    fn ausgang_leeren(puffer: &mut DatagrammPuffer, grenze: usize) -> CryptoResult<DtlsAktion> {
        let ausstehend = puffer.ausgang_ausstehend();
        if ausstehend == 0 {
            return Ok(DtlsAktion::Keine);
        }

        if ausstehend > grenze {
            puffer.ausgang_verwerfen();
            return Err(CryptoError::PufferUeberlauf { ausstehend, grenze });
        }

        Ok(DtlsAktion::Senden(puffer.ausgang_entnehmen()))
    }

    pub fn zustand(&self) -> SessionZustand {
        self.zustand
    }

    pub fn ist_verbunden(&self) -> bool {
        self.zustand == SessionZustand::Verbunden
    }

    pub fn rolle(&self) -> Option<DtlsRolle> {
        self.rolle
    }

    pub fn kennung(&self) -> &str {
        &self.kennung
    }

    pub fn eingang_ausstehend(&self) -> usize {
        self.verbindung
            .as_ref()
            .map_or(0, |v| v.get_ref().eingang_ausstehend())
    }

    pub fn ausgang_ausstehend(&self) -> usize {
        self.verbindung
            .as_ref()
            .map_or(0, |v| v.get_ref().ausgang_ausstehend())
    }

    /// Entnimmt die Ergebnisse aller Zertifikatspruefungen seit dem letzten Aufruf
    pub fn pruefungen_entnehmen(&self) -> Vec<PruefErgebnis> {
        std::mem::take(&mut *self.pruefungen.lock())
    }

    /// SRTP-Profil und Schluesselmaterial, sobald die Session verbunden ist
    pub fn srtp_schluessel(&self) -> CryptoResult<SrtpSchluessel> {
        let (Some(verbindung), Some(rolle)) = (&self.verbindung, self.rolle) else {
            return Err(CryptoError::NichtInitialisiert);
        };
        if !self.ist_verbunden() {
            return Err(CryptoError::NichtVerbunden);
        }
        schluessel_exportieren(verbindung.ssl(), rolle.ist_aktiv())
    }

    #[cfg(test)]
    fn puffer_fuer_test(&mut self) -> &mut DatagrammPuffer {
        self.verbindung.as_mut().unwrap().get_mut()
    }
}

fn verbindung_oeffnen(
    kontext: &SslContext,
    rolle: DtlsRolle,
    mtu: u32,
) -> Result<Verbindung, ErrorStack> {
    let mut ssl = Ssl::new(kontext)?;
    ssl.set_mtu(mtu)?;
    match rolle {
        DtlsRolle::Aktiv => ssl.set_connect_state(),
        DtlsRolle::Passiv => ssl.set_accept_state(),
    }
    SslStream::new(ssl, DatagrammPuffer::neu())
}

impl std::fmt::Debug for DtlsSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DtlsSession")
            .field("kennung", &self.kennung)
            .field("zustand", &self.zustand)
            .field("rolle", &self.rolle)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
