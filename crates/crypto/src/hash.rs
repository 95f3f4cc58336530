//! Registry der Fingerprint-Hashfunktionen
//!
//! Feste Tabelle der Algorithmen, mit denen Zertifikats-Fingerprints
//! (RFC 8122) gebildet werden. Der Digest wird ueber die DER-Kodierung des
//! Zertifikats berechnet.

use openssl::x509::X509Ref;
use sha1::Sha1;
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};

use crate::error::CryptoResult;

/// Eine Hashfunktion fuer Zertifikats-Fingerprints
pub struct HashFunktion {
    /// Textname laut IANA-Registry (z.B. `sha-256`)
    pub name: &'static str,
    /// Digest-Laenge in Bytes
    pub laenge: usize,
    berechnen: fn(&[u8]) -> Vec<u8>,
}

pub static HASH_FUNKTIONEN: [HashFunktion; 5] = [
    HashFunktion {
        name: "sha-1",
        laenge: 160 / 8,
        berechnen: sha_1,
    },
    HashFunktion {
        name: "sha-224",
        laenge: 224 / 8,
        berechnen: sha_224,
    },
    HashFunktion {
        name: "sha-256",
        laenge: 256 / 8,
        berechnen: sha_256,
    },
    HashFunktion {
        name: "sha-384",
        laenge: 384 / 8,
        berechnen: sha_384,
    },
    HashFunktion {
        name: "sha-512",
        laenge: 512 / 8,
        berechnen: sha_512,
    },
];

/// Sucht eine Hashfunktion anhand ihres Namens (Gross-/Kleinschreibung egal)
pub fn hash_funktion_suchen(name: &str) -> Option<&'static HashFunktion> {
    HASH_FUNKTIONEN
        .iter()
        .find(|hf| hf.name.eq_ignore_ascii_case(name))
}

impl HashFunktion {
    /// Standard-Hashfunktion fuer den eigenen Fingerprint (sha-1)
    pub fn standard() -> &'static HashFunktion {
        &HASH_FUNKTIONEN[0]
    }

    /// Berechnet den Digest ueber ein DER-kodiertes Zertifikat
    ///
    /// Das Ergebnis ist immer genau `self.laenge` Bytes lang.
    pub fn digest(&self, zertifikat_der: &[u8]) -> Vec<u8> {
        let digest = (self.berechnen)(zertifikat_der);
        debug_assert_eq!(digest.len(), self.laenge);
        digest
    }

    /// Berechnet den Digest eines OpenSSL-Zertifikats
    pub fn zertifikat_digest(&self, zertifikat: &X509Ref) -> CryptoResult<Vec<u8>> {
        let der = zertifikat.to_der()?;
        Ok(self.digest(&der))
    }
}

impl PartialEq for HashFunktion {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for HashFunktion {}

impl std::fmt::Debug for HashFunktion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashFunktion")
            .field("name", &self.name)
            .field("laenge", &self.laenge)
            .finish()
    }
}

impl std::fmt::Display for HashFunktion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name)
    }
}

fn sha_1(daten: &[u8]) -> Vec<u8> {
    Sha1::digest(daten).to_vec()
}

fn sha_224(daten: &[u8]) -> Vec<u8> {
    Sha224::digest(daten).to_vec()
}

fn sha_256(daten: &[u8]) -> Vec<u8> {
    Sha256::digest(daten).to_vec()
}

fn sha_384(daten: &[u8]) -> Vec<u8> {
    Sha384::digest(daten).to_vec()
}

fn sha_512(daten: &[u8]) -> Vec<u8> {
    Sha512::digest(daten).to_vec()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
