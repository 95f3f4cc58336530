//! mediarelay-server – Bibliotheks-Root
//!
//! Baut beim Start die DTLS-Identitaet, den Transport-Treiber und die
//! Metriken auf. Der Empfangs-Loop, die Signalisierung und die
//! Stream-Verwaltung haengen sich an den fertigen [`Relay`].

pub mod config;

use anyhow::{Context, Result};
use config::RelayConfig;
use mediarelay_core::RelayError;
use mediarelay_crypto::DtlsIdentity;
use mediarelay_media::{DtlsTransport, PktinfoSender};
use mediarelay_observability::{observability_server_starten, DtlsMetrics};
use std::net::SocketAddr;
use std::sync::Arc;

/// Die beim Start aufgebauten DTLS-Bausteine
pub struct Relay {
    pub identity: Arc<DtlsIdentity>,
    pub transport: Arc<DtlsTransport>,
    pub metriken: DtlsMetrics,
    pub udp_adresse: SocketAddr,
}

/// Haelt den laufenden Relay-Zustand zusammen
pub struct Server {
    pub config: RelayConfig,
}

impl Server {
    /// Erstellt einen neuen Server aus der gegebenen Konfiguration
    pub fn neu(config: RelayConfig) -> Self {
        Self { config }
    }

    /// Erzeugt Identitaet, Metriken und Transport
    ///
    /// Schlaegt die Erzeugung der Identitaet fehl, darf der Relay nicht
    /// starten.
    pub async fn vorbereiten(&self) -> Result<Relay> {
        let identity = DtlsIdentity::mit_parametern(&self.config.identitaets_parameter())
            .map_err(|e| {
                RelayError::Startup(format!("DTLS-Identitaet konnte nicht erzeugt werden: {e}"))
            })?;
        let identity = Arc::new(identity);

        let konfig = self
            .config
            .dtls_konfig()
            .context("DTLS-Konfiguration ungueltig")?;

        tracing::info!(
            fingerprint = %identity.fingerprint(),
            srtp_profile = %konfig.srtp_profile,
            "DTLS-Identitaet erzeugt"
        );

        let metriken = DtlsMetrics::neu()?;

        let bind: SocketAddr = self
            .config
            .udp_bind_adresse()
            .parse()
            .context("Ungueltige UDP-Bind-Adresse")?;
        let sender = PktinfoSender::binden(bind).await?;
        let udp_adresse = sender.lokale_adresse()?;

        let transport = DtlsTransport::neu(Arc::clone(&identity), konfig, Arc::new(sender))
            .mit_metriken(metriken.clone())
            .mit_zielwahl(self.config.zielwahl());

        Ok(Relay {
            identity,
            transport: Arc::new(transport),
            metriken,
            udp_adresse,
        })
    }

    /// Startet alle Subsysteme und laeuft bis zum Shutdown-Signal
    ///
    /// Reihenfolge:
    /// 1. DTLS-Identitaet erzeugen (fatal bei Fehler)
    /// 2. UDP-Socket binden, Transport-Treiber aufbauen
    /// 3. Observability-Server starten (optional)
    /// 4. Auf Ctrl-C warten
    pub async fn starten(self) -> Result<()> {
        tracing::info!(
            relay = %self.config.relay.name,
            udp = %self.config.udp_bind_adresse(),
            "Relay startet"
        );

        let relay = self.vorbereiten().await?;
        tracing::info!(adresse = %relay.udp_adresse, "DTLS-Transport bereit");

        if self.config.observability.aktiviert {
            let addr: SocketAddr = self
                .config
                .observability_bind_adresse()
                .parse()
                .context("Ungueltige Observability-Bind-Adresse")?;
            let metriken = relay.metriken.clone();
            tokio::spawn(async move {
                if let Err(e) = observability_server_starten(addr, metriken).await {
                    tracing::error!(fehler = %e, "Observability-Server beendet");
                }
            });
        }

        tracing::info!("Relay laeuft. Warte auf Shutdown-Signal (Ctrl-C)...");
        tokio::signal::ctrl_c().await?;
        tracing::info!("Shutdown-Signal empfangen, Relay wird beendet");

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
