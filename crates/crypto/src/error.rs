//! Fehlertypen fuer das Kryptografie-Subsystem
//!
//! OpenSSL-Fehler werden hier in eigene Varianten uebersetzt und verlassen
//! das Crate nie als `ErrorStack`.

use thiserror::Error;

/// Fehler im Kryptografie-Subsystem
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Zertifikat-Generierung fehlgeschlagen: {0}")]
    ZertifikatGenerierung(String),

    #[error("Unbekannte Hashfunktion: {0}")]
    UnbekannteHashFunktion(String),

    #[error("Ungueltige Digest-Laenge fuer {algorithmus}: erwartet {erwartet}, erhalten {erhalten}")]
    UngueltigeDigestLaenge {
        algorithmus: &'static str,
        erwartet: usize,
        erhalten: usize,
    },

    #[error("Ungueltiger Fingerprint: {0}")]
    UngueltigerFingerprint(String),

    #[error("DTLS-Kontext konnte nicht aufgebaut werden: {0}")]
    KontextAufbau(String),

    #[error("DTLS-Ausgangspuffer uebergelaufen: {ausstehend} Bytes (Grenze {grenze})")]
    PufferUeberlauf { ausstehend: usize, grenze: usize },

    #[error("DTLS-Session nicht initialisiert")]
    NichtInitialisiert,

    #[error("DTLS-Session noch nicht verbunden")]
    NichtVerbunden,

    #[error("Kein SRTP-Profil ausgehandelt")]
    KeinSrtpProfil,

    #[error("Schluesselexport fehlgeschlagen: {0}")]
    Schluesselexport(String),

    #[error("TLS-Fehler: {0}")]
    Tls(String),

    #[error("Konfigurationsfehler: {0}")]
    Konfiguration(#[from] mediarelay_core::RelayError),
}

impl From<openssl::error::ErrorStack> for CryptoError {
    fn from(e: openssl::error::ErrorStack) -> Self {
        Self::Tls(e.to_string())
    }
}

impl CryptoError {
    /// Fehler aus einem OpenSSL-Fehlerstapel beim Kontextaufbau
    pub(crate) fn kontext(e: openssl::error::ErrorStack) -> Self {
        Self::KontextAufbau(fehlergrund(&e))
    }
}

/// Liefert den Grund des letzten OpenSSL-Fehlers im Stapel
pub(crate) fn fehlergrund(e: &openssl::error::ErrorStack) -> String {
    e.errors()
        .last()
        .and_then(|err| err.reason())
        .map(str::to_string)
        .unwrap_or_else(|| e.to_string())
}

pub type CryptoResult<T> = Result<T, CryptoError>;
