//! Structured logging for btyd-core.
//!
//! Events carry an `event` name from [`event_names`] and a [`Stage`], and go
//! to stderr either as human-readable lines or as one JSON object per line.
//!
//! ```ignore
//! use btyd_core::logging::{event_names, init_logging, LogConfig, Stage};
//!
//! init_logging(&LogConfig::from_env());
//! tracing::info!(event = event_names::FIT_STARTED, stage = %Stage::Fit, customers = 1000);
//! ```
//!
//! `RUST_LOG` overrides the level filter entirely when it is set to a valid
//! directive string.

pub mod events;

pub use events::{event_names, Stage};

use std::io::IsTerminal;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Level for the btyd crates (`trace` .. `error`, or `off`).
pub const ENV_LOG: &str = "BTYD_LOG";
/// `human` or `json`.
pub const ENV_LOG_FORMAT: &str = "BTYD_LOG_FORMAT";

/// Output encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Human,
    Jsonl,
}

/// What [`init_logging`] installs.
#[derive(Debug, Clone, PartialEq)]
pub struct LogConfig {
    pub format: LogFormat,
    pub level: LevelFilter,
    /// Human lines only; JSON events always carry a timestamp.
    pub timestamps: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Human,
            level: LevelFilter::INFO,
            timestamps: true,
        }
    }
}

impl LogConfig {
    /// Defaults overridden by `BTYD_LOG` and `BTYD_LOG_FORMAT`.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Unrecognised values leave the default in place.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(level) = lookup(ENV_LOG).and_then(|v| v.trim().parse().ok()) {
            config.level = level;
        }
        let format = lookup(ENV_LOG_FORMAT).map(|v| v.trim().to_ascii_lowercase());
        match format.as_deref() {
            Some("json" | "jsonl") => config.format = LogFormat::Jsonl,
            Some("human" | "text") => config.format = LogFormat::Human,
            _ => {}
        }
        config
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "btyd_core={level},btyd_config={level}",
                level = self.level
            ))
        })
    }
}

/// Install the global subscriber. Returns `false` if one was already set.
pub fn init_logging(config: &LogConfig) -> bool {
    let filter = config.filter();

    match config.format {
        LogFormat::Human => {
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_ansi(std::io::stderr().is_terminal());

            if config.timestamps {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt_layer)
                    .try_init()
                    .is_ok()
            } else {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt_layer.without_time())
                    .try_init()
                    .is_ok()
            }
        }
        LogFormat::Jsonl => {
            let json_layer = fmt::layer()
                .json()
                .flatten_event(true)
                .with_current_span(false)
                .with_writer(std::io::stderr);
            tracing_subscriber::registry()
                .with(filter)
                .with(json_layer)
                .try_init()
                .is_ok()
        }
    }
}
