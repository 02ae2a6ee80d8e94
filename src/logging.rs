//! Tracing subscriber setup for processes embedding the load protocol.
//!
//! The library only emits `tracing` events; binaries call [`init_tracing`]
//! once at startup.
//!
//! Environment:
//!
//! - `RUST_LOG`: filter directives (default `vector_load_protocol=info,warn`)
//! - `VECLOAD_LOG_FORMAT`: `pretty`, `compact` or `json` (default `pretty`)

use anyhow::Result;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Tracing output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TracingFormat {
    Pretty,
    Json,
    /// Single line per event
    Compact,
}

impl TracingFormat {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => TracingFormat::Json,
            "compact" => TracingFormat::Compact,
            _ => TracingFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TracingConfig {
    pub format: TracingFormat,
    /// Filter directive, e.g. `vector_load_protocol=debug,info`
    pub filter: String,
    pub with_ansi: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        let format = std::env::var("VECLOAD_LOG_FORMAT")
            .map(|s| TracingFormat::parse(&s))
            .unwrap_or(TracingFormat::Pretty);
        let filter = std::env::var("RUST_LOG")
            .unwrap_or_else(|_| "vector_load_protocol=info,warn".to_string());

        Self {
            format,
            filter,
            with_ansi: true,
        }
    }
}

/// Install the global subscriber. Fails if the filter does not parse or a
/// subscriber is already installed.
pub fn init_tracing(config: TracingConfig) -> Result<()> {
    let filter = EnvFilter::try_new(&config.filter)?;

    match config.format {
        TracingFormat::Pretty => {
            let layer = fmt::layer()
                .pretty()
                .with_ansi(config.with_ansi)
                .with_filter(filter);
            tracing_subscriber::registry().with(layer).try_init()?;
        }
        TracingFormat::Json => {
            let layer = fmt::layer().json().with_filter(filter);
            tracing_subscriber::registry().with(layer).try_init()?;
        }
        TracingFormat::Compact => {
            let layer = fmt::layer()
                .compact()
                .with_ansi(config.with_ansi)
                .with_filter(filter);
            tracing_subscriber::registry().with(layer).try_init()?;
        }
    }

    Ok(())
}
