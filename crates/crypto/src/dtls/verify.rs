//! Peer-Verifikation ueber den signalisierten Fingerprint
//!
//! Der Fingerprint-Vergleich ist die einzige Authentifizierung der Session:
//! es findet keine CA-Kettenpruefung statt. Der Callback haelt eine schwache
//! Referenz auf den Fingerprint-Slot des besitzenden Streams; ist der Stream
//! verschwunden, wird abgelehnt.

use std::sync::{Arc, Weak};

use openssl::x509::X509StoreContextRef;
use parking_lot::{Mutex, RwLock};

use crate::fingerprint::Fingerprint;

/// Erwarteter Peer-Fingerprint eines Streams, von der Signalisierung gesetzt
pub type FingerprintSlot = Arc<RwLock<Option<Fingerprint>>>;

/// Ergebnis einer Zertifikatspruefung
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PruefErgebnis {
    Akzeptiert,
    Abgelehnt(AblehnGrund),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AblehnGrund {
    /// Handshake-Kontext gehoert zu keinem gueltigen Stream mehr
    KeinStream,
    /// Signalisierung hat noch keinen Fingerprint geliefert
    KeinFingerprint,
    /// Peer hat kein (lesbares) Zertifikat praesentiert
    KeinZertifikat,
    /// Digest stimmt nicht mit dem erwarteten Fingerprint ueberein
    Abweichung,
}

impl PruefErgebnis {
    pub fn ist_akzeptiert(&self) -> bool {
        matches!(self, Self::Akzeptiert)
    }
}

impl AblehnGrund {
    /// Kurzname fuer Logs und Metrik-Labels
    pub fn als_str(&self) -> &'static str {
        match self {
            Self::KeinStream => "kein_stream",
            Self::KeinFingerprint => "kein_fingerprint",
            Self::KeinZertifikat => "kein_zertifikat",
            Self::Abweichung => "abweichung",
        }
    }
}

/// Prueft ein DER-kodiertes Peer-Zertifikat gegen den erwarteten Fingerprint
///
/// Akzeptiert genau dann, wenn der Digest unter der Hashfunktion des
/// erwarteten Fingerprints Byte fuer Byte uebereinstimmt.
pub fn zertifikat_pruefen(erwartet: Option<&Fingerprint>, zertifikat_der: &[u8]) -> PruefErgebnis {
    let Some(erwartet) = erwartet else {
        return PruefErgebnis::Abgelehnt(AblehnGrund::KeinFingerprint);
    };

    let berechnet = erwartet.hash_funktion().digest(zertifikat_der);
    let soll = erwartet.digest();

    if berechnet.len() != soll.len() || !openssl::memcmp::eq(&berechnet, soll) {
        return PruefErgebnis::Abgelehnt(AblehnGrund::Abweichung);
    }

    PruefErgebnis::Akzeptiert
}

/// Protokoll der Pruefergebnisse einer Session (wird vom Treiber abgeholt)
pub(crate) type PruefProtokoll = Arc<Mutex<Vec<PruefErgebnis>>>;

/// Baut den Verify-Callback fuer den SSL-Kontext einer Session
pub(crate) fn callback_bauen(
    slot: Weak<RwLock<Option<Fingerprint>>>,
    kennung: String,
    protokoll: PruefProtokoll,
) -> impl Fn(bool, &mut X509StoreContextRef) -> bool + Send + Sync + 'static {
    move |_vorpruefung, store| {
        let ergebnis = match slot.upgrade() {
            None => PruefErgebnis::Abgelehnt(AblehnGrund::KeinStream),
            Some(slot) => match store.current_cert().map(|cert| cert.to_der()) {
                Some(Ok(der)) => zertifikat_pruefen(slot.read().as_ref(), &der),
                _ => PruefErgebnis::Abgelehnt(AblehnGrund::KeinZertifikat),
            },
        };

        match ergebnis {
            PruefErgebnis::Akzeptiert => {
                tracing::info!(stream = %kennung, "Peer-Zertifikat akzeptiert");
            }
            PruefErgebnis::Abgelehnt(grund) => {
                tracing::warn!(
                    stream = %kennung,
                    grund = grund.als_str(),
                    "Peer-Zertifikat abgelehnt"
                );
            }
        }

        protokoll.lock().push(ergebnis);
        ergebnis.ist_akzeptiert()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
