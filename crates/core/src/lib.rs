//! mediarelay-core – Gemeinsame Typen, SRTP-Suiten und Fehlertypen
//!
//! Dieses Crate stellt die fundamentalen Bausteine bereit, die von allen
//! anderen mediarelay-Crates gemeinsam genutzt werden.

pub mod error;
pub mod suite;
pub mod types;

// Re-Exporte fuer bequemen Zugriff
pub use error::{RelayError, Result};
pub use suite::{srtp_profil_liste, suiten_aufloesen, CryptoSuite, CRYPTO_SUITES};
pub use types::{DtlsRolle, Endpunkt, StreamId};
