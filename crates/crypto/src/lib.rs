//! # mediarelay-crypto
//!
//! DTLS-SRTP-Schluesselaushandlung fuer den Media-Relay.
//!
//! ## Module
//! - `hash` - Registry der Fingerprint-Hashfunktionen (sha-1 bis sha-512)
//! - `fingerprint` - Fingerprint-Werttyp (Hashfunktion + Digest)
//! - `identity` - Selbstsigniertes RSA-Zertifikat des Relays
//! - `dtls` - Handshake-Session, Peer-Verifikation, SRTP-Schluesselexport
//! - `error` - Fehlertypen

pub mod dtls;
pub mod error;
pub mod fingerprint;
pub mod hash;
pub mod identity;

// Bequeme Re-Exports
pub use error::{CryptoError, CryptoResult};
pub use fingerprint::Fingerprint;
pub use hash::{hash_funktion_suchen, HashFunktion, HASH_FUNKTIONEN};
pub use identity::{DtlsIdentity, IdentitaetsParameter};

pub use dtls::{
    zertifikat_pruefen, AblehnGrund, DtlsAktion, DtlsKonfig, DtlsSession, FingerprintSlot,
    PruefErgebnis, SessionZustand, SrtpSchluessel,
};
