//! Zertifikats-Fingerprint (Hashfunktion + Digest)
//!
//! Zwei Quellen: der eigene Fingerprint der Relay-Identitaet (wird ueber die
//! Signalisierung beworben) und der erwartete Fingerprint des Peers, den die
//! Signalisierung pro Stream liefert. Ein Fingerprint ist nach dem Erzeugen
//! unveraenderlich und hat immer genau die Digest-Laenge seiner Hashfunktion.
//!
//! Textform wie im SDP-Attribut `a=fingerprint`: `sha-256 AB:CD:...:EF`

use serde::{Deserialize, Serialize};

use crate::error::{CryptoError, CryptoResult};
use crate::hash::{hash_funktion_suchen, HashFunktion};

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "FingerprintDto", into = "FingerprintDto")]
pub struct Fingerprint {
    hash: &'static HashFunktion,
    digest: Vec<u8>,
}

/// Serialisierte Form fuer die Signalisierung
#[derive(Debug, Clone, Serialize, Deserialize)]
struct FingerprintDto {
    algorithmus: String,
    wert: String,
}

impl Fingerprint {
    /// Erstellt einen Fingerprint und prueft die Digest-Laenge
    pub fn neu(hash: &'static HashFunktion, digest: Vec<u8>) -> CryptoResult<Self> {
        if digest.len() != hash.laenge {
            return Err(CryptoError::UngueltigeDigestLaenge {
                algorithmus: hash.name,
                erwartet: hash.laenge,
                erhalten: digest.len(),
            });
        }
        Ok(Self { hash, digest })
    }

    /// Erstellt einen Fingerprint aus Algorithmus-Name und Digest-Bytes
    pub fn aus_name(algorithmus: &str, digest: Vec<u8>) -> CryptoResult<Self> {
        let hash = hash_funktion_suchen(algorithmus)
            .ok_or_else(|| CryptoError::UnbekannteHashFunktion(algorithmus.to_string()))?;
        Self::neu(hash, digest)
    }

    /// Berechnet den Fingerprint eines DER-kodierten Zertifikats
    pub fn berechnen(hash: &'static HashFunktion, zertifikat_der: &[u8]) -> Self {
        Self {
            hash,
            digest: hash.digest(zertifikat_der),
        }
    }

    /// Parst die Textform `<algorithmus> <HEX:HEX:...>`
    pub fn parsen(text: &str) -> CryptoResult<Self> {
        let mut teile = text.split_whitespace();
        let (Some(algorithmus), Some(wert), None) = (teile.next(), teile.next(), teile.next())
        else {
            return Err(CryptoError::UngueltigerFingerprint(text.to_string()));
        };
        Self::aus_name(algorithmus, hex_parsen(wert)?)
    }

    pub fn hash_funktion(&self) -> &'static HashFunktion {
        self.hash
    }

    pub fn digest(&self) -> &[u8] {
        &self.digest
    }

    /// Digest als Doppelpunkt-getrennte Hex-Bytes (Grossbuchstaben)
    pub fn hex(&self) -> String {
        self.digest
            .iter()
            .map(|b| hex::encode_upper([*b]))
            .collect::<Vec<_>>()
            .join(":")
    }
}

/// Dekodiert `AB:CD:...`; jede Gruppe muss aus genau zwei Hex-Ziffern bestehen
fn hex_parsen(wert: &str) -> CryptoResult<Vec<u8>> {
    let ungueltig = || CryptoError::UngueltigerFingerprint(wert.to_string());

    let mut ziffern = String::with_capacity(wert.len());
    for gruppe in wert.split(':') {
        if gruppe.len() != 2 {
            return Err(ungueltig());
        }
        ziffern.push_str(gruppe);
    }
    hex::decode(ziffern).map_err(|_| ungueltig())
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.hash.name, self.hex())
    }
}

impl std::fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Fingerprint({self})")
    }
}

impl TryFrom<FingerprintDto> for Fingerprint {
    type Error = CryptoError;

    fn try_from(dto: FingerprintDto) -> CryptoResult<Self> {
        Self::aus_name(&dto.algorithmus, hex_parsen(&dto.wert)?)
    }
}

impl From<Fingerprint> for FingerprintDto {
    fn from(fp: Fingerprint) -> Self {
        Self {
            algorithmus: fp.hash.name.to_string(),
            wert: fp.hex(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
