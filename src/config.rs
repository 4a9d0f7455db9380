//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the wake-config.toml file.
//! It provides a centralized way to configure the measurement site, the wake classifier,
//! the spectral filter bank, level conditioning and reporting intervals.
//!
//! Every field has a default, so a partial file (or no file at all) yields a runnable
//! configuration. Values are immutable for the run once the engine is built.

use crate::error::{Result, WakeError};
use crate::logging::LogConfig;
use crate::spectral::ResampleMethod;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default configuration file name, looked up in the working directory
pub const CONFIG_FILE: &str = "wake-config.toml";

/// Application configuration loaded from wake-config.toml
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Measurement site physics and source sample rate
    pub site: SiteConfig,
    /// Wake classifier tuning
    pub wake: WakeConfig,
    /// Narrowband filter bank tuning
    pub spectral: SpectralConfig,
    /// Level conditioning and long-term level tracking
    pub level: LevelConfig,
    /// Periodic report intervals
    pub report: ReportConfig,
    /// Log output
    pub logging: LogConfig,
}

/// Physical constants of the measurement site
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Source samples per second delivered by the acquisition side
    pub sample_rate: f64,
    /// Water depth at the sensor in feet
    pub depth_ft: f64,
    /// Water density in lb/ft³
    pub water_density: f64,
    /// Gravitational acceleration in ft/s²
    pub gravity: f64,
}

/// Wake classifier configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WakeConfig {
    /// Coherence tolerance as a fraction of the wake-begin period (0.1 = ±10%)
    pub wave_variance: f64,
    /// Coherent crests (beyond the first) needed before a wake is declared
    pub minimum_wake_count: u32,
    /// Shortest period in seconds that can belong to a wake
    pub minimum_wake_period: f64,
    /// Cluster-end timer length as a multiple of the latest wake period
    pub cluster_multiplier: f64,
    /// Upper clamp for the dispersion distance estimate in feet
    pub max_distance_ft: f64,
    /// Noise threshold decay per second
    pub power_degradation: f64,
    /// Noise threshold at start-up and after each summary reset
    pub initial_noise_threshold: f64,
    /// Span of the running averages kept by the summaries
    pub summary_span: u32,
}

/// Narrowband filter bank configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SpectralConfig {
    /// Frequency resolution in bits; a cycle is resampled into 2^(resolution+1) points
    pub resolution: u32,
    /// Whole cycles kept in each resample buffer
    pub minimum_cycles: usize,
    /// DFT length; must be a power of two
    pub buffer_size: usize,
    /// How resampled values are derived from the two surrounding raw samples
    pub method: ResampleMethod,
    /// Seconds between filter bank evaluations
    pub evaluate_interval: f64,
    /// Boat lengths in feet whose deep-water wake periods get a bin
    pub boat_lengths_ft: Vec<f64>,
    /// Plain wave periods in seconds that get a bin
    pub target_periods: Vec<f64>,
}

/// Level conditioning configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LevelConfig {
    /// Samples in the baseline average subtracted to get wave height
    pub baseline_span: u32,
    /// Samples in the wave height smoothing average ahead of the extractor
    pub smoothing_span: u32,
    /// Samples in the long-term level average
    pub long_span: u32,
    /// Change in inches needed before the level watch calls a trend
    pub watch_hysteresis: f64,
    /// Multiple of the running average that flags a level as anomalous
    pub anomalous_multiple: f64,
    /// Wave heights above this (inches) trip the height trap
    pub trap_high: f64,
    /// Wave heights below this (inches) trip the height trap
    pub trap_low: f64,
    /// In-range samples needed before the trap re-arms
    pub trap_span: u32,
    /// Span of the wave peak and power running statistics
    pub stats_span: u32,
    /// Minutes between rapid-change comparisons of the long level
    pub rate_count: u32,
    /// Change in inches that counts as a rapid rise or fall
    pub rate_trigger: f64,
}

/// Periodic report configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Seconds between wave/wake summary reports (summaries reset afterwards)
    pub summary_interval: f64,
    /// Seconds between daily high/low reports
    pub daily_interval: f64,
}

impl Default for SiteConfig {
    fn default() -> Self {
        SiteConfig {
            sample_rate: 30.0,
            depth_ft: 4.0,
            water_density: 62.29,
            gravity: 32.174,
        }
    }
}

impl Default for WakeConfig {
    fn default() -> Self {
        WakeConfig {
            wave_variance: 0.1,
            minimum_wake_count: 1,
            minimum_wake_period: 1.0,
            cluster_multiplier: 2.0,
            max_distance_ft: 5000.0,
            power_degradation: 0.02,
            initial_noise_threshold: 1.0,
            summary_span: 50,
        }
    }
}

impl Default for SpectralConfig {
    fn default() -> Self {
        SpectralConfig {
            resolution: 7,
            minimum_cycles: 3,
            buffer_size: 1024,
            method: ResampleMethod::Linear,
            evaluate_interval: 0.2,
            boat_lengths_ft: (3..=20).map(|half| f64::from(half * 2)).collect(),
            target_periods: vec![
                0.8, 1.0, 1.2, 1.4, 1.6, 1.8, 2.0, 2.2, 2.4, 2.6, 2.8, 3.0, 3.4, 3.6, 3.8, 4.0,
                4.4, 4.8, 5.2, 5.6, 6.0, 6.4, 6.8, 7.2, 7.6, 8.0, 8.8, 9.6, 10.4, 11.2, 12.0,
                12.8, 13.6, 14.4, 15.2, 16.0, 17.6, 19.2,
            ],
        }
    }
}

impl Default for LevelConfig {
    fn default() -> Self {
        LevelConfig {
            baseline_span: 120, // 4 s at 30 Hz
            smoothing_span: 10,
            long_span: 1800, // 1 minute at 30 Hz
            watch_hysteresis: 0.25,
            anomalous_multiple: 10.0,
            trap_high: 4.0,
            trap_low: -1.0,
            trap_span: 30,
            stats_span: 20,
            rate_count: 5,
            rate_trigger: 0.6,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        ReportConfig {
            summary_interval: 3600.0,
            daily_interval: 86_400.0,
        }
    }
}

impl Config {
    /// Load configuration from wake-config.toml
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load() -> Self {
        Self::load_from_path(CONFIG_FILE)
    }

    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        match Self::try_load_from_path(&path) {
            Ok(config) => {
                tracing::info!(path = %path.as_ref().display(), "loaded configuration");
                config
            }
            Err(WakeError::Io(_)) => {
                tracing::info!(
                    path = %path.as_ref().display(),
                    "no config file found, using default configuration"
                );
                Self::default()
            }
            Err(e) => {
                tracing::warn!(error = %e, "invalid config file, using default configuration");
                Self::default()
            }
        }
    }

    /// Load and validate configuration, reporting every failure to the caller
    pub fn try_load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save current configuration to the given path
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Reject values the detectors cannot work with
    pub fn validate(&self) -> Result<()> {
        let site = &self.site;
        if !(site.sample_rate > 0.0 && site.depth_ft > 0.0 && site.gravity > 0.0) {
            return Err(WakeError::InvalidConfig(
                "sample_rate, depth_ft and gravity must be positive".into(),
            ));
        }
        if !(self.wake.wave_variance > 0.0 && self.wake.wave_variance < 1.0) {
            return Err(WakeError::InvalidConfig(format!(
                "wave_variance {} must lie in (0, 1)",
                self.wake.wave_variance
            )));
        }
        if !(self.wake.cluster_multiplier > 0.0) {
            return Err(WakeError::InvalidConfig(
                "cluster_multiplier must be positive".into(),
            ));
        }

        let spectral = &self.spectral;
        if !spectral.buffer_size.is_power_of_two() {
            return Err(WakeError::InvalidConfig(format!(
                "buffer_size {} is not a power of two",
                spectral.buffer_size
            )));
        }
        let max_samples_per_cycle = spectral
            .resolution
            .checked_add(1)
            .and_then(|shift| 1usize.checked_shl(shift))
            .ok_or_else(|| WakeError::InvalidConfig("resolution is too large".into()))?;
        if spectral.buffer_size < max_samples_per_cycle {
            return Err(WakeError::InvalidConfig(format!(
                "buffer_size {} is smaller than one cycle of {} samples",
                spectral.buffer_size, max_samples_per_cycle
            )));
        }
        if spectral.minimum_cycles == 0 {
            return Err(WakeError::InvalidConfig(
                "minimum_cycles must be at least 1".into(),
            ));
        }
        if !(spectral.evaluate_interval > 0.0) {
            return Err(WakeError::InvalidConfig(
                "evaluate_interval must be positive".into(),
            ));
        }

        let level = &self.level;
        let spans = [
            self.wake.summary_span,
            level.baseline_span,
            level.smoothing_span,
            level.long_span,
            level.stats_span,
            level.rate_count,
        ];
        if spans.contains(&0) {
            return Err(WakeError::InvalidConfig("averaging spans must be non-zero".into()));
        }
        if level.trap_low >= level.trap_high {
            return Err(WakeError::InvalidConfig(
                "trap_low must be below trap_high".into(),
            ));
        }
        if !(self.report.summary_interval > 0.0 && self.report.daily_interval > 0.0) {
            return Err(WakeError::InvalidConfig(
                "report intervals must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.site.sample_rate, 30.0);
        assert_eq!(config.site.depth_ft, 4.0);
        assert_eq!(config.wake.wave_variance, 0.1);
        assert_eq!(config.wake.minimum_wake_count, 1);
        assert_eq!(config.spectral.resolution, 7);
        assert_eq!(config.spectral.buffer_size, 1024);
        assert_eq!(config.spectral.boat_lengths_ft.first(), Some(&6.0));
        assert_eq!(config.spectral.boat_lengths_ft.last(), Some(&40.0));
        assert_eq!(config.spectral.target_periods.len(), 38);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.site.gravity, parsed.site.gravity);
        assert_eq!(config.spectral.target_periods, parsed.spectral.target_periods);
        assert_eq!(config.spectral.method, parsed.spectral.method);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[wake]\nwave_variance = 0.2\n\n[spectral]\nmethod = \"nearest\"").unwrap();

        let config = Config::try_load_from_path(file.path()).unwrap();
        assert_eq!(config.wake.wave_variance, 0.2);
        assert_eq!(config.wake.minimum_wake_count, 1);
        assert_eq!(config.spectral.method, ResampleMethod::Nearest);
        assert_eq!(config.site.sample_rate, 30.0);
    }

    #[test]
    fn test_save_then_load() {
        let file = NamedTempFile::new().unwrap();
        let mut config = Config::default();
        config.site.depth_ft = 6.5;
        config.save(file.path()).unwrap();

        let loaded = Config::try_load_from_path(file.path()).unwrap();
        assert_eq!(loaded.site.depth_ft, 6.5);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let config = Config::load_from_path("/nonexistent/path");
        // Should fallback to default
        assert_eq!(config.site.sample_rate, 30.0);
        assert!(matches!(
            Config::try_load_from_path("/nonexistent/path"),
            Err(WakeError::Io(_))
        ));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let mut config = Config::default();
        config.spectral.buffer_size = 1000;
        assert!(matches!(config.validate(), Err(WakeError::InvalidConfig(_))));

        let mut config = Config::default();
        config.spectral.buffer_size = 128;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.wake.wave_variance = 1.5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.level.smoothing_span = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_nan_and_overflowing_values_are_rejected() {
        let mut config = Config::default();
        config.wake.cluster_multiplier = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.spectral.evaluate_interval = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.report.summary_interval = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.spectral.resolution = u32::MAX;
        assert!(matches!(config.validate(), Err(WakeError::InvalidConfig(_))));
    }

    #[test]
    fn test_malformed_file_falls_back() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "this is not toml = = =").unwrap();
        assert!(matches!(
            Config::try_load_from_path(file.path()),
            Err(WakeError::Parse(_))
        ));
        let config = Config::load_from_path(file.path());
        assert_eq!(config.wake.cluster_multiplier, 2.0);
    }
}
