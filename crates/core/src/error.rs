//! Fehlertypen fuer mediarelay
//!
//! Zentraler Fehler-Enum fuer die Relay-Ebene. Die Kryptografie- und
//! Media-Crates definieren eigene Fehler und konvertieren bei Bedarf.

use thiserror::Error;

/// Globaler Result-Alias fuer mediarelay
pub type Result<T> = std::result::Result<T, RelayError>;

/// Fehler auf Relay-Ebene (Startup, Konfiguration)
#[derive(Debug, Error)]
pub enum RelayError {
    // --- Konfiguration ---
    #[error("Konfigurationsfehler: {0}")]
    Konfiguration(String),

    #[error("Unbekannte SRTP-Suite: {0}")]
    UnbekannteSuite(String),

    // --- Startup ---
    #[error("Startup abgebrochen: {0}")]
    Startup(String),
}

impl RelayError {
    /// Fehler in der Konfiguration (im Gegensatz zu Laufzeitfehlern beim Start)
    pub fn ist_konfigurationsfehler(&self) -> bool {
        matches!(self, Self::Konfiguration(_) | Self::UnbekannteSuite(_))
    }
}
