//! mediarelay-media – Media-Streams und DTLS-Transport
//!
//! Verbindet die DTLS-Sessions aus `mediarelay-crypto` mit dem Netzwerk.
//!
//! ## Module
//! - [`stream`] – Media-Stream mit Rolle, Endpunkt, erwartetem Fingerprint und DTLS-Session
//! - [`transport`] – Transport-Treiber: Session treiben, Records versenden, Metriken
//! - [`udp`] – UDP-Versand mit expliziter Quelladresse (IP_PKTINFO)
//! - [`error`] – Fehlertypen

pub mod error;
pub mod stream;
pub mod transport;
pub mod udp;

pub use error::{MediaError, MediaResult};
pub use stream::MediaStream;
pub use transport::{DtlsTransport, ZielWahl, Zustellung};
pub use udp::{AusgehendesDatagramm, DatagrammSender, PktinfoSender};
