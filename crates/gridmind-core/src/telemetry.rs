//! Centralised tracing initialisation for Gridmind hosts.
//!
//! Call [`init_tracing`] once at program start. Safe to call more than once —
//! the global subscriber can only be set once per process and subsequent
//! calls are ignored.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Log line format for the global subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable text lines.
    Text,
    /// Newline-delimited JSON, for log aggregation pipelines.
    Json,
}

/// Initialise the global tracing subscriber.
///
/// Respects `RUST_LOG` for fine-grained filtering; falls back to `level`
/// when it is not set.
pub fn init_tracing(format: LogFormat, level: Level) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_target(false).json())
                .try_init()
                .ok();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_target(false))
                .try_init()
                .ok();
        }
    }
}
