//! Prometheus-kompatible Metriken fuer mediarelay
//!
//! Registrierte Metriken:
//! - `mediarelay_dtls_handshakes_total` – Counter: Abgeschlossene Handshakes
//! - `mediarelay_dtls_peer_certs_accepted_total` – Counter: Akzeptierte Peer-Zertifikate
//! - `mediarelay_dtls_peer_certs_rejected_total` – Counter: Abgelehnte Peer-Zertifikate (grund)
//! - `mediarelay_dtls_session_init_failures_total` – Counter: Fehlgeschlagene Session-Initialisierungen
//! - `mediarelay_dtls_buffer_overflows_total` – Counter: Verworfene Ausgangspuffer
//! - `mediarelay_dtls_datagrams_sent_total` – Counter: Gesendete DTLS-Datagramme
//! - `mediarelay_dtls_send_errors_total` – Counter: Fehlgeschlagene Sendeversuche
//! - `mediarelay_dtls_sent_bytes` – Histogram: Groesse gesendeter Datagramme

use anyhow::Result;
use axum::{response::IntoResponse, routing::get, Router};
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

/// Alle DTLS-Metriken des Relays
#[derive(Clone)]
pub struct DtlsMetrics {
    pub registry: Arc<Registry>,

    // Handshake
    pub handshakes_total: IntCounter,
    pub peer_certs_accepted_total: IntCounter,
    pub peer_certs_rejected_total: IntCounterVec,
    pub session_init_failures_total: IntCounter,

    // Transport
    pub buffer_overflows_total: IntCounter,
    pub datagrams_sent_total: IntCounter,
    pub send_errors_total: IntCounter,
    pub sent_bytes: Histogram,
}

impl DtlsMetrics {
    /// Erstellt und registriert alle Metriken in einer neuen Registry
    pub fn neu() -> Result<Self> {
        let registry = Registry::new();

        // --- Handshake-Metriken ---
        let handshakes_total = IntCounter::with_opts(Opts::new(
            "mediarelay_dtls_handshakes_total",
            "Anzahl abgeschlossener DTLS-Handshakes",
        ))?;
        registry.register(Box::new(handshakes_total.clone()))?;

        let peer_certs_accepted_total = IntCounter::with_opts(Opts::new(
            "mediarelay_dtls_peer_certs_accepted_total",
            "Anzahl akzeptierter Peer-Zertifikate",
        ))?;
        registry.register(Box::new(peer_certs_accepted_total.clone()))?;

        let peer_certs_rejected_total = IntCounterVec::new(
            Opts::new(
                "mediarelay_dtls_peer_certs_rejected_total",
                "Anzahl abgelehnter Peer-Zertifikate",
            ),
            &["grund"],
        )?;
        registry.register(Box::new(peer_certs_rejected_total.clone()))?;

        let session_init_failures_total = IntCounter::with_opts(Opts::new(
            "mediarelay_dtls_session_init_failures_total",
            "Anzahl fehlgeschlagener DTLS-Session-Initialisierungen",
        ))?;
        registry.register(Box::new(session_init_failures_total.clone()))?;

        // --- Transport-Metriken ---
        let buffer_overflows_total = IntCounter::with_opts(Opts::new(
            "mediarelay_dtls_buffer_overflows_total",
            "Anzahl verworfener Ausgangspuffer ueber der Sicherheitsgrenze",
        ))?;
        registry.register(Box::new(buffer_overflows_total.clone()))?;

        let datagrams_sent_total = IntCounter::with_opts(Opts::new(
            "mediarelay_dtls_datagrams_sent_total",
            "Anzahl gesendeter DTLS-Datagramme",
        ))?;
        registry.register(Box::new(datagrams_sent_total.clone()))?;

        let send_errors_total = IntCounter::with_opts(Opts::new(
            "mediarelay_dtls_send_errors_total",
            "Anzahl fehlgeschlagener Sendeversuche",
        ))?;
        registry.register(Box::new(send_errors_total.clone()))?;

        let sent_bytes = Histogram::with_opts(
            HistogramOpts::new(
                "mediarelay_dtls_sent_bytes",
                "Groesse gesendeter DTLS-Datagramme in Bytes",
            )
            .buckets(vec![64.0, 128.0, 256.0, 512.0, 1024.0, 1500.0, 4096.0, 16384.0, 65536.0]),
        )?;
        registry.register(Box::new(sent_bytes.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            handshakes_total,
            peer_certs_accepted_total,
            peer_certs_rejected_total,
            session_init_failures_total,
            buffer_overflows_total,
            datagrams_sent_total,
            send_errors_total,
            sent_bytes,
        })
    }

    /// Exportiert alle Metriken im Prometheus-Textformat
    pub fn exportieren(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

/// Axum-Router fuer den `/metrics`-Endpunkt
pub fn metrics_router(metriken: DtlsMetrics) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metriken)
}

async fn metrics_handler(
    axum::extract::State(metriken): axum::extract::State<DtlsMetrics>,
) -> impl IntoResponse {
    match metriken.exportieren() {
        Ok(text) => (
            axum::http::StatusCode::OK,
            [(
                axum::http::header::CONTENT_TYPE,
                "text/plain; version=0.0.4",
            )],
            text,
        )
            .into_response(),
        Err(err) => {
            tracing::error!("Metriken-Export fehlgeschlagen: {err}");
            axum::http::StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
