//! # Structured Logging
//!
//! The library only emits `tracing` events; the binary decides where they go.
//! [`init_logging`] installs a `tracing-subscriber` fmt layer in one of three
//! formats, filtered by `RUST_LOG` when it is set and by the configured level
//! otherwise.
//!
//! ```toml
//! [logging]
//! level = "debug"
//! format = "json"
//! ```

use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log level configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per event, for journald or log shippers
    Json,
    /// Multi-line human-readable output
    Pretty,
    /// One line per event
    #[default]
    Compact,
}

/// `[logging]` section of the configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    /// Extra filter directives, e.g. "wake_watch_lib::spectral=debug"
    pub filter: Option<String>,
}

impl LogConfig {
    /// Filter directives used when `RUST_LOG` is not set.
    pub fn directives(&self) -> String {
        match &self.filter {
            Some(extra) if !extra.is_empty() => format!("{},{}", self.level, extra),
            _ => self.level.to_string(),
        }
    }
}

/// Install the global subscriber. Safe to call more than once; later calls are ignored.
pub fn init_logging(config: &LogConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.directives()));

    // Reports go to stderr so stdout stays free for --stdout output
    let result = match config.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().pretty().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Compact => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .try_init(),
    };
    if let Err(e) = result {
        tracing::debug!(error = %e, "subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_parses_lowercase() {
        let config: LogConfig = toml::from_str("level = \"warn\"\nformat = \"json\"").unwrap();
        assert_eq!(config.level, LogLevel::Warn);
        assert_eq!(config.format, LogFormat::Json);
    }

    #[test]
    fn directives_append_extra_filter() {
        let mut config = LogConfig::default();
        assert_eq!(config.directives(), "info");
        config.filter = Some("wake_watch_lib::spectral=trace".into());
        assert_eq!(config.directives(), "info,wake_watch_lib::spectral=trace");
    }

    #[test]
    fn init_twice_does_not_panic() {
        let config = LogConfig::default();
        init_logging(&config);
        init_logging(&config);
    }
}
