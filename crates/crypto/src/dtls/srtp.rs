//! Export des SRTP-Schluesselmaterials nach abgeschlossenem Handshake
//!
//! Layout laut RFC 5764 Abschnitt 4.2:
//! `client_key | server_key | client_salt | server_salt`

use mediarelay_core::suite::CryptoSuite;
use openssl::ssl::SslRef;

use crate::error::{fehlergrund, CryptoError, CryptoResult};

const EXPORTER_LABEL: &str = "EXTRACTOR-dtls_srtp";

/// Ausgehandeltes SRTP-Profil und Master-Key+Salt beider Richtungen
#[derive(Clone, PartialEq, Eq)]
pub struct SrtpSchluessel {
    pub suite: &'static CryptoSuite,
    /// Master-Key || Master-Salt fuer ausgehende Pakete
    pub lokal: Vec<u8>,
    /// Master-Key || Master-Salt fuer eingehende Pakete
    pub entfernt: Vec<u8>,
}

impl std::fmt::Debug for SrtpSchluessel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SrtpSchluessel")
            .field("suite", &self.suite.name)
            .field("lokal", &"[redacted]")
            .field("entfernt", &"[redacted]")
            .finish()
    }
}

pub(crate) fn schluessel_exportieren(ssl: &SslRef, aktiv: bool) -> CryptoResult<SrtpSchluessel> {
    let profil = ssl
        .selected_srtp_profile()
        .ok_or(CryptoError::KeinSrtpProfil)?;
    let suite = CryptoSuite::aus_dtls_profil(profil.name()).ok_or_else(|| {
        CryptoError::Schluesselexport(format!("unbekanntes SRTP-Profil {}", profil.name()))
    })?;

    let k = suite.master_key_len;
    let s = suite.master_salt_len;
    let mut material = vec![0u8; 2 * suite.master_len()];
    ssl.export_keying_material(&mut material, EXPORTER_LABEL, None)
        .map_err(|e| CryptoError::Schluesselexport(fehlergrund(&e)))?;

    let (client_key, rest) = material.split_at(k);
    let (server_key, rest) = rest.split_at(k);
    let (client_salt, server_salt) = rest.split_at(s);

    let client = [client_key, client_salt].concat();
    let server = [server_key, server_salt].concat();

    let (lokal, entfernt) = if aktiv {
        (client, server)
    } else {
        (server, client)
    };

    Ok(SrtpSchluessel {
        suite,
        lokal,
        entfernt,
    })
}
