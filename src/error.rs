//! # Error Types
//!
//! Every fallible operation in the library reports through [`WakeError`].
//! Almost all of these are configuration-time failures: once an [`Engine`]
//! has been built, per-sample processing never returns an error. Bad samples
//! are skipped and reported through the report sink instead.
//!
//! [`Engine`]: crate::engine::Engine

use std::io;
use thiserror::Error;

/// Errors raised while loading configuration or building the detectors.
#[derive(Error, Debug)]
pub enum WakeError {
    /// Configuration file could not be read or written
    #[error("config IO: {0}")]
    Io(#[from] io::Error),

    /// Configuration file is not valid TOML for [`crate::config::Config`]
    #[error("config parse: {0}")]
    Parse(#[from] toml::de::Error),

    /// Configuration could not be serialized back to TOML
    #[error("config serialize: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A configuration value is out of its allowed range
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The source sample rate is too slow to resample this cycle period
    #[error("cannot resample a {cycle_period:.3}s cycle from a {sample_rate} Hz source")]
    ResampleInfeasible { cycle_period: f64, sample_rate: f64 },

    /// FFT planning or execution failed
    #[error("FFT: {0}")]
    Fft(String),
}

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, WakeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infeasible_resample_message_names_both_rates() {
        let err = WakeError::ResampleInfeasible {
            cycle_period: 0.05,
            sample_rate: 30.0,
        };
        let text = err.to_string();
        assert!(text.contains("0.050s"));
        assert!(text.contains("30 Hz"));
    }

    #[test]
    fn io_errors_convert() {
        let err: WakeError = io::Error::new(io::ErrorKind::NotFound, "missing").into();
        assert!(matches!(err, WakeError::Io(_)));
    }
}
