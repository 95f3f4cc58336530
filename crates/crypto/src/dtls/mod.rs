//! DTLS-SRTP-Handshake pro Media-Stream
//!
//! Der Handshake laeuft vollstaendig gegen In-Memory-Puffer: eingehende
//! Datagramme werden in den Eingangspuffer gelegt, jeder Schritt der
//! Zustandsmaschine schreibt Records in den Ausgangspuffer, den der
//! Transport-Treiber anschliessend als UDP-Datagramm versendet.
//!
//! ## Architektur
//!
//! ```text
//! Datagramm vom Peer
//!     |
//!     v
//! DtlsSession::treiben()      <- Eingangspuffer + ein Handshake-Schritt
//!     |         |
//!     |         +--> Verifikations-Callback (Fingerprint-Vergleich)
//!     v
//! DtlsAktion::Senden(record)  <- Inhalt des Ausgangspuffers
//! ```

pub mod config;
pub mod puffer;
pub mod session;
pub mod srtp;
pub mod verify;

pub use config::{DtlsKonfig, CIPHER_LISTE, MAX_AUSGANG_BYTES, VERIFY_TIEFE};
pub use puffer::DatagrammPuffer;
pub use session::{DtlsAktion, DtlsSession, SessionZustand};
pub use srtp::SrtpSchluessel;
pub use verify::{zertifikat_pruefen, AblehnGrund, FingerprintSlot, PruefErgebnis};
