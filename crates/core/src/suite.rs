//! SRTP-Crypto-Suiten
//!
//! Statische Tabelle der vom Relay unterstuetzten SRTP-Suiten. Suiten mit
//! DTLS-SRTP-Profilnamen (RFC 5764) werden im Handshake angeboten, in der
//! konfigurierten Reihenfolge.

use crate::error::{RelayError, Result};

/// Eine SRTP-Crypto-Suite
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CryptoSuite {
    /// SDES-Name (z.B. `AES_CM_128_HMAC_SHA1_80`)
    pub name: &'static str,
    /// DTLS-SRTP-Profilname in OpenSSL-Schreibweise, falls vorhanden
    pub dtls_name: Option<&'static str>,
    /// Laenge des Master-Keys in Bytes
    pub master_key_len: usize,
    /// Laenge des Master-Salts in Bytes
    pub master_salt_len: usize,
}

pub const CRYPTO_SUITES: &[CryptoSuite] = &[
    CryptoSuite {
        name: "AES_CM_128_HMAC_SHA1_80",
        dtls_name: Some("SRTP_AES128_CM_SHA1_80"),
        master_key_len: 16,
        master_salt_len: 14,
    },
    CryptoSuite {
        name: "AES_CM_128_HMAC_SHA1_32",
        dtls_name: Some("SRTP_AES128_CM_SHA1_32"),
        master_key_len: 16,
        master_salt_len: 14,
    },
    // F8 hat kein DTLS-SRTP-Profil
    CryptoSuite {
        name: "F8_128_HMAC_SHA1_80",
        dtls_name: None,
        master_key_len: 16,
        master_salt_len: 14,
    },
];

impl CryptoSuite {
    /// Sucht eine Suite anhand ihres SDES-Namens (Gross-/Kleinschreibung egal)
    pub fn suchen(name: &str) -> Option<&'static CryptoSuite> {
        CRYPTO_SUITES
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
    }

    /// Sucht eine Suite anhand ihres DTLS-SRTP-Profilnamens
    pub fn aus_dtls_profil(profil: &str) -> Option<&'static CryptoSuite> {
        CRYPTO_SUITES
            .iter()
            .find(|s| s.dtls_name.is_some_and(|d| d.eq_ignore_ascii_case(profil)))
    }

    /// Laenge von Master-Key + Master-Salt
    pub fn master_len(&self) -> usize {
        self.master_key_len + self.master_salt_len
    }
}

/// Loest eine Liste von Suite-Namen gegen die Tabelle auf
pub fn suiten_aufloesen<S: AsRef<str>>(namen: &[S]) -> Result<Vec<&'static CryptoSuite>> {
    namen
        .iter()
        .map(|n| {
            CryptoSuite::suchen(n.as_ref())
                .ok_or_else(|| RelayError::UnbekannteSuite(n.as_ref().to_string()))
        })
        .collect()
}

/// Baut die Doppelpunkt-getrennte Profil-Liste fuer `use_srtp`
///
/// Suiten ohne DTLS-Profil werden uebersprungen. Ergibt sich eine leere
/// Liste, ist die Konfiguration unbrauchbar.
pub fn srtp_profil_liste(suiten: &[&CryptoSuite]) -> Result<String> {
    let profile: Vec<&str> = suiten.iter().filter_map(|s| s.dtls_name).collect();

    if profile.is_empty() {
        return Err(RelayError::Konfiguration(
            "keine Crypto-Suite mit DTLS-SRTP-Profil konfiguriert".into(),
        ));
    }

    Ok(profile.join(":"))
}
