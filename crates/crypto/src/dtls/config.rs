//! DTLS-Konfiguration
//!
//! Wird einmal beim Start aus der Relay-Konfiguration gebaut und von allen
//! Sessions gemeinsam gelesen.

use mediarelay_core::suite::{srtp_profil_liste, CryptoSuite};

use crate::error::CryptoResult;

/// Cipher-Liste: keine anonymen, Export-, schwachen oder MD5-Suiten
pub const CIPHER_LISTE: &str = "ALL:!ADH:!LOW:!EXP:!MD5:@STRENGTH";

/// Maximale Tiefe der Zertifikatskette beim Peer
pub const VERIFY_TIEFE: u32 = 4;

/// Sicherheitsgrenze fuer den Ausgangspuffer (64 KiB)
pub const MAX_AUSGANG_BYTES: usize = 0x10000;

/// Standard-MTU fuer DTLS-Records
pub const STANDARD_MTU: usize = 1200;

/// Gemeinsame DTLS-Parameter aller Sessions
#[derive(Debug, Clone)]
pub struct DtlsKonfig {
    /// Doppelpunkt-getrennte SRTP-Profile fuer `use_srtp`
    pub srtp_profile: String,
    pub cipher_liste: String,
    pub verify_tiefe: u32,
    /// Record-Groesse, nach der OpenSSL Handshake-Nachrichten fragmentiert
    pub mtu: usize,
    /// Ab dieser Groesse wird der Ausgangspuffer verworfen
    pub max_ausgang: usize,
}

impl DtlsKonfig {
    /// Baut die Konfiguration aus den konfigurierten SRTP-Suiten
    ///
    /// Die Profil-Reihenfolge entspricht der Reihenfolge der Suiten.
    pub fn aus_suiten(suiten: &[&CryptoSuite]) -> CryptoResult<Self> {
        Ok(Self {
            srtp_profile: srtp_profil_liste(suiten)?,
            cipher_liste: CIPHER_LISTE.into(),
            verify_tiefe: VERIFY_TIEFE,
            mtu: STANDARD_MTU,
            max_ausgang: MAX_AUSGANG_BYTES,
        })
    }
}

impl Default for DtlsKonfig {
    fn default() -> Self {
        let alle: Vec<&CryptoSuite> = mediarelay_core::CRYPTO_SUITES.iter().collect();
        let srtp_profile = srtp_profil_liste(&alle).unwrap_or_default();
        Self {
            srtp_profile,
            cipher_liste: CIPHER_LISTE.into(),
            verify_tiefe: VERIFY_TIEFE,
            mtu: STANDARD_MTU,
            max_ausgang: MAX_AUSGANG_BYTES,
        }
    }
}
