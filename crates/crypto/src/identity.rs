//! Zertifikats-Identitaet des Relays
//!
//! Beim Start wird genau eine Identitaet erzeugt: RSA-Schluessel-Paar,
//! selbstsigniertes X.509-v1-Zertifikat und der sha-1-Fingerprint, den die
//! Signalisierung an Peers weitergibt. Die Identitaet ist danach
//! unveraenderlich und wird als `Arc<DtlsIdentity>` an alle Sessions
//! verteilt. Schlaegt die Erzeugung fehl, darf der Prozess nicht starten.

use std::time::{SystemTime, UNIX_EPOCH};

use openssl::asn1::Asn1Time;
use openssl::bn::{BigNum, MsbOption};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::{PKey, PKeyRef, Private};
use openssl::rsa::Rsa;
use openssl::x509::{X509Builder, X509NameBuilder, X509Ref, X509};

use crate::error::{fehlergrund, CryptoError, CryptoResult};
use crate::fingerprint::Fingerprint;
use crate::hash::HashFunktion;

/// Fester Common Name fuer Subject und Issuer
pub const STANDARD_COMMON_NAME: &str = "mediarelay";

const RSA_EXPONENT: u32 = 0x10001;
const MIN_RSA_BITS: u32 = 1024;

/// Parameter fuer die Zertifikats-Erzeugung
#[derive(Debug, Clone)]
pub struct IdentitaetsParameter {
    pub common_name: String,
    pub rsa_bits: u32,
    /// Gueltigkeit ab jetzt in Tagen
    pub gueltig_tage: u32,
    /// Rueckdatierung von notBefore in Sekunden (Uhrenabweichung der Peers)
    pub rueckdatierung_sek: u32,
}

impl Default for IdentitaetsParameter {
    fn default() -> Self {
        Self {
            common_name: STANDARD_COMMON_NAME.into(),
            rsa_bits: 1024,
            gueltig_tage: 30,
            rueckdatierung_sek: 60 * 60 * 24,
        }
    }
}

/// Die kryptografische Identitaet des Relays
pub struct DtlsIdentity {
    zertifikat: X509,
    schluessel: PKey<Private>,
    fingerprint: Fingerprint,
}

impl DtlsIdentity {
    /// Erzeugt die Identitaet mit Standard-Parametern (RSA-1024, 30 Tage)
    pub fn erzeugen() -> CryptoResult<Self> {
        Self::mit_parametern(&IdentitaetsParameter::default())
    }

    /// Erzeugt Schluessel-Paar, Zertifikat und Standard-Fingerprint
    pub fn mit_parametern(params: &IdentitaetsParameter) -> CryptoResult<Self> {
        if params.rsa_bits < MIN_RSA_BITS {
            return Err(CryptoError::ZertifikatGenerierung(format!(
                "RSA-Modulus zu klein: {} Bits (mindestens {MIN_RSA_BITS})",
                params.rsa_bits
            )));
        }

        let schluessel = schluessel_erzeugen(params.rsa_bits).map_err(generierungsfehler)?;
        let zertifikat = zertifikat_erzeugen(params, &schluessel).map_err(generierungsfehler)?;

        let der = zertifikat.to_der().map_err(generierungsfehler)?;
        let fingerprint = Fingerprint::berechnen(HashFunktion::standard(), &der);

        tracing::info!(
            common_name = %params.common_name,
            rsa_bits = params.rsa_bits,
            fingerprint = %fingerprint,
            "DTLS-Identitaet erzeugt"
        );

        Ok(Self {
            zertifikat,
            schluessel,
            fingerprint,
        })
    }

    pub fn zertifikat(&self) -> &X509Ref {
        &self.zertifikat
    }

    pub fn schluessel(&self) -> &PKeyRef<Private> {
        &self.schluessel
    }

    /// Der eigene sha-1-Fingerprint (fuer die Signalisierung)
    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    /// Fingerprint des eigenen Zertifikats mit einer anderen Hashfunktion
    pub fn fingerprint_mit(&self, hash: &'static HashFunktion) -> CryptoResult<Fingerprint> {
        let der = self.zertifikat.to_der()?;
        Ok(Fingerprint::berechnen(hash, &der))
    }

    /// PEM-kodiertes Zertifikat
    pub fn zertifikat_pem(&self) -> CryptoResult<String> {
        let pem = self.zertifikat.to_pem()?;
        String::from_utf8(pem).map_err(|e| CryptoError::Tls(e.to_string()))
    }
}

impl std::fmt::Debug for DtlsIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DtlsIdentity")
            .field("fingerprint", &self.fingerprint)
            .finish()
    }
}

fn generierungsfehler(e: openssl::error::ErrorStack) -> CryptoError {
    CryptoError::ZertifikatGenerierung(fehlergrund(&e))
}

fn schluessel_erzeugen(bits: u32) -> Result<PKey<Private>, openssl::error::ErrorStack> {
    let exponent = BigNum::from_u32(RSA_EXPONENT)?;
    let rsa = Rsa::generate_with_e(bits, &exponent)?;
    PKey::from_rsa(rsa)
}

fn zertifikat_erzeugen(
    params: &IdentitaetsParameter,
    schluessel: &PKeyRef<Private>,
) -> Result<X509, openssl::error::ErrorStack> {
    let mut builder = X509Builder::new()?;
    builder.set_pubkey(schluessel)?;

    let mut serial = BigNum::new()?;
    serial.rand(64, MsbOption::MAYBE_ZERO, false)?;
    let serial = serial.to_asn1_integer()?;
    builder.set_serial_number(&serial)?;

    // X.509 v1
    builder.set_version(0)?;

    let mut name = X509NameBuilder::new()?;
    name.append_entry_by_nid(Nid::COMMONNAME, &params.common_name)?;
    let name = name.build();
    builder.set_subject_name(&name)?;
    builder.set_issuer_name(&name)?;

    let jetzt = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0);
    let nicht_vor = Asn1Time::from_unix((jetzt - i64::from(params.rueckdatierung_sek)) as _)?;
    let nicht_nach = Asn1Time::days_from_now(params.gueltig_tage)?;
    builder.set_not_before(&nicht_vor)?;
    builder.set_not_after(&nicht_nach)?;

    builder.sign(schluessel, MessageDigest::sha1())?;
    Ok(builder.build())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::hash_funktion_suchen;
    use std::cmp::Ordering;

    fn common_name(name: &openssl::x509::X509NameRef) -> String {
        name.entries_by_nid(Nid::COMMONNAME)
            .next()
            .unwrap()
            .data()
            .as_utf8()
            .unwrap()
            .to_string()
    }

    #[test]
    fn identitaet_erzeugen() {
        let id = DtlsIdentity::erzeugen().unwrap();
        let cert = id.zertifikat();

        assert_eq!(cert.version(), 0);
        assert_eq!(
            cert.not_before().compare(cert.not_after()).unwrap(),
            Ordering::Less
        );
        assert_eq!(common_name(cert.subject_name()), STANDARD_COMMON_NAME);
        assert_eq!(common_name(cert.issuer_name()), common_name(cert.subject_name()));
    }

    #[test]
    fn schluessel_ist_rsa_1024_mit_exponent_65537() {
        let id = DtlsIdentity::erzeugen().unwrap();
        let rsa = id.schluessel().rsa().unwrap();
        assert_eq!(rsa.size() * 8, 1024);
        assert_eq!(rsa.e().to_vec(), vec![0x01, 0x00, 0x01]);
        assert!(id.zertifikat().public_key().unwrap().public_eq(id.schluessel()));
    }

    #[test]
    fn standard_fingerprint_ist_sha1_des_zertifikats() {
        let id = DtlsIdentity::erzeugen().unwrap();
        let sha1 = hash_funktion_suchen("sha-1").unwrap();
        let erwartet = sha1.zertifikat_digest(id.zertifikat()).unwrap();

        assert_eq!(id.fingerprint().hash_funktion().name, "sha-1");
        assert_eq!(id.fingerprint().digest(), erwartet.as_slice());

        let openssl_digest = id.zertifikat().digest(MessageDigest::sha1()).unwrap();
        assert_eq!(id.fingerprint().digest(), &openssl_digest[..]);
    }

    #[test]
    fn zertifikat_ist_selbstsigniert() {
        let id = DtlsIdentity::erzeugen().unwrap();
        let pubkey = id.zertifikat().public_key().unwrap();
        assert!(id.zertifikat().verify(&pubkey).unwrap());
    }

    #[test]
    fn rueckdatierung_liegt_in_der_vergangenheit() {
        let id = DtlsIdentity::erzeugen().unwrap();
        let jetzt = Asn1Time::days_from_now(0).unwrap();
        let diff = id.zertifikat().not_before().diff(&jetzt).unwrap();
        // notBefore ~ 1 Tag vor jetzt
        assert_eq!(diff.days, 1);
    }

    #[test]
    fn verschiedene_identitaeten_haben_verschiedene_fingerprints() {
        let a = DtlsIdentity::erzeugen().unwrap();
        let b = DtlsIdentity::erzeugen().unwrap();
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn zu_kleiner_modulus_wird_abgelehnt() {
        let params = IdentitaetsParameter {
            rsa_bits: 512,
            ..Default::default()
        };
        assert!(matches!(
            DtlsIdentity::mit_parametern(&params),
            Err(CryptoError::ZertifikatGenerierung(_))
        ));
    }

    #[test]
    fn fingerprint_mit_anderer_hashfunktion() {
        let id = DtlsIdentity::erzeugen().unwrap();
        let sha256 = hash_funktion_suchen("sha-256").unwrap();
        let fp = id.fingerprint_mit(sha256).unwrap();
        assert_eq!(fp.digest().len(), 32);
        assert!(id.zertifikat_pem().unwrap().contains("-----BEGIN CERTIFICATE-----"));
    }
}
