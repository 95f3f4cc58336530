//! Relay-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! sinnvolle Standardwerte, sodass der Relay ohne Konfigurationsdatei
//! lauffaehig ist.

use mediarelay_core::{suiten_aufloesen, RelayError};
use mediarelay_crypto::{CryptoResult, DtlsKonfig, IdentitaetsParameter};
use mediarelay_media::ZielWahl;
use mediarelay_observability::logging::{log_format_gueltig, log_level_gueltig};
use serde::{Deserialize, Serialize};

/// Vollstaendige Relay-Konfiguration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Allgemeine Relay-Einstellungen
    pub relay: RelayEinstellungen,
    /// Netzwerk-Einstellungen
    pub netzwerk: NetzwerkEinstellungen,
    /// DTLS-Identitaet und Handshake-Parameter
    pub dtls: DtlsEinstellungen,
    /// Logging-Einstellungen
    pub logging: LoggingEinstellungen,
    /// Observability-Einstellungen (Metriken)
    pub observability: ObservabilityEinstellungen,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayEinstellungen {
    /// Anzeigename des Relays
    pub name: String,
}

impl Default for RelayEinstellungen {
    fn default() -> Self {
        Self {
            name: "mediarelay".into(),
        }
    }
}

/// Netzwerk-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetzwerkEinstellungen {
    pub bind_adresse: String,
    /// Port fuer Media (DTLS/SRTP ueber UDP)
    pub udp_port: u16,
}

impl Default for NetzwerkEinstellungen {
    fn default() -> Self {
        Self {
            bind_adresse: "0.0.0.0".into(),
            udp_port: 40000,
        }
    }
}

/// DTLS-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DtlsEinstellungen {
    /// Common Name des selbstsignierten Zertifikats
    pub common_name: String,
    /// RSA-Schluessellaenge in Bit (mindestens 1024)
    pub rsa_bits: u32,
    /// Gueltigkeit des Zertifikats in Tagen
    pub gueltig_tage: u32,
    /// Rueckdatierung von notBefore in Sekunden
    pub rueckdatierung_sek: u32,
    /// SRTP-Crypto-Suiten in Praeferenzreihenfolge
    pub crypto_suiten: Vec<String>,
    /// Sicherheitsgrenze fuer den Ausgangspuffer einer Session in Bytes
    pub max_ausgang: usize,
    /// Record-Groesse fuer Handshake-Nachrichten
    pub mtu: usize,
    /// Ohne explizite Zieladresse an den letzten bekannten Endpunkt senden
    pub ziel_fallback: bool,
}

impl Default for DtlsEinstellungen {
    fn default() -> Self {
        let standard = IdentitaetsParameter::default();
        let konfig = DtlsKonfig::default();
        Self {
            common_name: standard.common_name,
            rsa_bits: standard.rsa_bits,
            gueltig_tage: standard.gueltig_tage,
            rueckdatierung_sek: standard.rueckdatierung_sek,
            crypto_suiten: vec![
                "AES_CM_128_HMAC_SHA1_80".into(),
                "AES_CM_128_HMAC_SHA1_32".into(),
            ],
            max_ausgang: konfig.max_ausgang,
            mtu: konfig.mtu,
            ziel_fallback: true,
        }
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

/// Observability-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityEinstellungen {
    /// Aktiviert den `/metrics`-Endpunkt
    pub aktiviert: bool,
    pub port: u16,
}

impl Default for ObservabilityEinstellungen {
    fn default() -> Self {
        Self {
            aktiviert: true,
            port: 9300,
        }
    }
}

impl RelayConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    pub fn laden(pfad: &str) -> anyhow::Result<Self> {
        let config: Self = match std::fs::read_to_string(pfad) {
            Ok(inhalt) => toml::from_str(&inhalt)
                .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}"))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    pfad = pfad,
                    "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
                );
                Self::default()
            }
            Err(e) => {
                return Err(anyhow::anyhow!(
                    "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
                ))
            }
        };
        config.validieren()?;
        Ok(config)
    }

    /// Prueft Werte, die serde allein nicht abfangen kann
    pub fn validieren(&self) -> mediarelay_core::Result<()> {
        if self.dtls.rsa_bits < 1024 {
            return Err(RelayError::Konfiguration(format!(
                "dtls.rsa_bits muss mindestens 1024 sein, ist {}",
                self.dtls.rsa_bits
            )));
        }
        if self.dtls.gueltig_tage == 0 {
            return Err(RelayError::Konfiguration(
                "dtls.gueltig_tage muss groesser als 0 sein".into(),
            ));
        }
        if self.dtls.max_ausgang == 0 || self.dtls.mtu == 0 {
            return Err(RelayError::Konfiguration(
                "dtls.max_ausgang und dtls.mtu muessen groesser als 0 sein".into(),
            ));
        }
        if self.dtls.crypto_suiten.is_empty() {
            return Err(RelayError::Konfiguration(
                "dtls.crypto_suiten darf nicht leer sein".into(),
            ));
        }
        let suiten = suiten_aufloesen(&self.dtls.crypto_suiten)?;
        mediarelay_core::srtp_profil_liste(&suiten)?;

        if !log_level_gueltig(&self.logging.level) {
            return Err(RelayError::Konfiguration(format!(
                "Unbekanntes Log-Level '{}'",
                self.logging.level
            )));
        }
        if !log_format_gueltig(&self.logging.format) {
            return Err(RelayError::Konfiguration(format!(
                "Unbekanntes Log-Format '{}'",
                self.logging.format
            )));
        }
        Ok(())
    }

    /// Parameter fuer die Erzeugung der Relay-Identitaet
    pub fn identitaets_parameter(&self) -> IdentitaetsParameter {
        IdentitaetsParameter {
            common_name: self.dtls.common_name.clone(),
            rsa_bits: self.dtls.rsa_bits,
            gueltig_tage: self.dtls.gueltig_tage,
            rueckdatierung_sek: self.dtls.rueckdatierung_sek,
        }
    }

    /// Gemeinsame DTLS-Parameter aller Sessions
    pub fn dtls_konfig(&self) -> CryptoResult<DtlsKonfig> {
        let suiten = suiten_aufloesen(&self.dtls.crypto_suiten)?;
        let mut konfig = DtlsKonfig::aus_suiten(&suiten)?;
        konfig.max_ausgang = self.dtls.max_ausgang;
        konfig.mtu = self.dtls.mtu;
        Ok(konfig)
    }

    pub fn zielwahl(&self) -> ZielWahl {
        if self.dtls.ziel_fallback {
            ZielWahl::LetzterEndpunkt
        } else {
            ZielWahl::NurExplizit
        }
    }

    /// Gibt die vollstaendige Bind-Adresse fuer UDP zurueck
    pub fn udp_bind_adresse(&self) -> String {
        format!("{}:{}", self.netzwerk.bind_adresse, self.netzwerk.udp_port)
    }

    /// Gibt die Bind-Adresse fuer den Observability-Server zurueck
    pub fn observability_bind_adresse(&self) -> String {
        format!("{}:{}", self.netzwerk.bind_adresse, self.observability.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_config_ist_valide() {
        let cfg = RelayConfig::default();
        cfg.validieren().unwrap();
        assert_eq!(cfg.dtls.rsa_bits, 1024);
        assert_eq!(cfg.dtls.gueltig_tage, 30);
        assert_eq!(cfg.dtls.max_ausgang, 0x10000);
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn bind_adressen() {
        let cfg = RelayConfig::default();
        assert_eq!(cfg.udp_bind_adresse(), "0.0.0.0:40000");
        assert_eq!(cfg.observability_bind_adresse(), "0.0.0.0:9300");
    }

    #[test]
    fn config_aus_toml_string() {
        let toml = r#"
            [relay]
            name = "Edge 1"

            [dtls]
            rsa_bits = 2048
            crypto_suiten = ["AES_CM_128_HMAC_SHA1_32"]
        "#;
        let cfg: RelayConfig = toml::from_str(toml).unwrap();
        cfg.validieren().unwrap();
        assert_eq!(cfg.relay.name, "Edge 1");
        assert_eq!(cfg.dtls.rsa_bits, 2048);
        // Nicht angegebene Felder behalten Standardwerte
        assert_eq!(cfg.dtls.gueltig_tage, 30);
        assert_eq!(cfg.netzwerk.udp_port, 40000);
        assert_eq!(
            cfg.dtls_konfig().unwrap().srtp_profile,
            "SRTP_AES128_CM_SHA1_32"
        );
    }

    #[test]
    fn zu_kleiner_rsa_schluessel_wird_abgelehnt() {
        let mut cfg = RelayConfig::default();
        cfg.dtls.rsa_bits = 512;
        assert!(matches!(cfg.validieren(), Err(RelayError::Konfiguration(_))));
    }

    #[test]
    fn unbekannte_suite_wird_abgelehnt() {
        let mut cfg = RelayConfig::default();
        cfg.dtls.crypto_suiten = vec!["AES_256_GCM".into()];
        assert!(matches!(cfg.validieren(), Err(RelayError::UnbekannteSuite(_))));
    }

    #[test]
    fn suiten_ohne_dtls_profil_werden_abgelehnt() {
        let mut cfg = RelayConfig::default();
        cfg.dtls.crypto_suiten = vec!["F8_128_HMAC_SHA1_80".into()];
        assert!(cfg.validieren().is_err());
    }

    #[test]
    fn leere_suitenliste_wird_abgelehnt() {
        let mut cfg = RelayConfig::default();
        cfg.dtls.crypto_suiten.clear();
        assert!(cfg.validieren().is_err());
    }

    #[test]
    fn ungueltiges_log_level_wird_abgelehnt() {
        let mut cfg = RelayConfig::default();
        cfg.logging.level = "laut".into();
        assert!(cfg.validieren().is_err());
    }

    #[test]
    fn dtls_konfig_uebernimmt_grenzen() {
        let mut cfg = RelayConfig::default();
        cfg.dtls.max_ausgang = 4096;
        cfg.dtls.mtu = 1400;
        let konfig = cfg.dtls_konfig().unwrap();
        assert_eq!(konfig.max_ausgang, 4096);
        assert_eq!(konfig.mtu, 1400);
        assert_eq!(
            konfig.srtp_profile,
            "SRTP_AES128_CM_SHA1_80:SRTP_AES128_CM_SHA1_32"
        );
    }

    #[test]
    fn zielwahl_aus_config() {
        let mut cfg = RelayConfig::default();
        assert_eq!(cfg.zielwahl(), ZielWahl::LetzterEndpunkt);
        cfg.dtls.ziel_fallback = false;
        assert_eq!(cfg.zielwahl(), ZielWahl::NurExplizit);
    }

    #[test]
    fn fehlende_datei_liefert_standardwerte() {
        let cfg = RelayConfig::laden("/nicht/vorhanden/mediarelay.toml").unwrap();
        assert_eq!(cfg.relay.name, "mediarelay");
    }
}
