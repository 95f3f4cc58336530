//! Structured Logging Setup via tracing-subscriber
//!
//! Konfigurierbar per Umgebungsvariable, die Vorrang vor der
//! Konfigurationsdatei hat:
//! - `MR_LOG_LEVEL`: Filter-Direktiven (z.B. `debug` oder
//!   `info,mediarelay_crypto=trace`)
//! - `MR_LOG_FORMAT`: `text` oder `json`
//!
//! DTLS-Logzeilen tragen die Stream-Kennung im Feld `stream`.

use std::str::FromStr;
use tracing_subscriber::{filter::Directive, fmt, EnvFilter};

const LEVEL_VAR: &str = "MR_LOG_LEVEL";
const FORMAT_VAR: &str = "MR_LOG_FORMAT";

/// HTTP-Stack des `/metrics`-Endpunkts nur bei Problemen
const LEISE_DIREKTIVEN: &[&str] = &["hyper=warn", "axum=warn"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            andere => Err(format!("unbekanntes Log-Format '{andere}'")),
        }
    }
}

/// Initialisiert das Logging-System.
///
/// Ein zweiter Aufruf (z.B. aus Tests) laesst den bestehenden Subscriber
/// unveraendert.
pub fn logging_initialisieren(level: &str, format: &str) {
    let filter = filter_bauen(std::env::var(LEVEL_VAR).ok().as_deref(), level);
    let format = format_waehlen(std::env::var(FORMAT_VAR).ok().as_deref(), format);

    let ergebnis = match format {
        LogFormat::Json => fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_current_span(true)
            .try_init(),
        LogFormat::Text => fmt().with_env_filter(filter).with_target(true).try_init(),
    };

    if ergebnis.is_err() {
        tracing::debug!("Logging bereits initialisiert");
    }
}

fn filter_bauen(aus_env: Option<&str>, standard: &str) -> EnvFilter {
    let basis = aus_env
        .and_then(|d| EnvFilter::try_new(d).ok())
        .or_else(|| EnvFilter::try_new(standard).ok())
        .unwrap_or_else(|| EnvFilter::new("info"));

    LEISE_DIREKTIVEN
        .iter()
        .filter_map(|d| d.parse::<Directive>().ok())
        .fold(basis, EnvFilter::add_directive)
}

fn format_waehlen(aus_env: Option<&str>, standard: &str) -> LogFormat {
    aus_env
        .and_then(|f| f.parse().ok())
        .or_else(|| standard.parse().ok())
        .unwrap_or_default()
}

/// Validiert ob ein Log-Level-String gueltig ist.
pub fn log_level_gueltig(level: &str) -> bool {
    matches!(level, "trace" | "debug" | "info" | "warn" | "error")
}

/// Validiert ob ein Log-Format-String gueltig ist.
pub fn log_format_gueltig(format: &str) -> bool {
    format.parse::<LogFormat>().is_ok()
}
