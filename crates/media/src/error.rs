//! Fehlertypen des Media-Crates

use mediarelay_core::RelayError;
use mediarelay_crypto::CryptoError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("DTLS-Fehler: {0}")]
    Dtls(#[from] CryptoError),

    #[error("Relay-Fehler: {0}")]
    Relay(#[from] RelayError),

    #[error("IO-Fehler: {0}")]
    Io(#[from] std::io::Error),
}

pub type MediaResult<T> = std::result::Result<T, MediaError>;

impl MediaError {
    /// Fehler aus der Signalisierung (z.B. Fingerprint mit falscher Laenge)
    pub fn ist_konfigurationsfehler(&self) -> bool {
        match self {
            Self::Dtls(e) => matches!(
                e,
                CryptoError::UngueltigeDigestLaenge { .. }
                    | CryptoError::UnbekannteHashFunktion(_)
                    | CryptoError::UngueltigerFingerprint(_)
                    | CryptoError::Konfiguration(_)
            ),
            Self::Relay(e) => e.ist_konfigurationsfehler(),
            Self::Io(_) => false,
        }
    }
}
