//! # Synthetic Water Level
//!
//! A deterministic stand-in for the acquisition side, used by the
//! `--synthetic` mode of the binary and by the scenario tests.
//!
//! ## Model
//! - **Tide**: one semidiurnal sine (12.42 h) around a mean level
//! - **Chop**: two short sines plus a little seeded noise, all well under
//!   the default noise threshold
//! - **Wakes**: every `wake_every` seconds a train of `wake_crests` crests
//!   whose period slides from `wake_start_period` down to `wake_end_period`,
//!   the way a passing boat's wake disperses, under a half-sine envelope
//!
//! The same configuration always yields the same samples.

use crate::Sample;
use chrono::{DateTime, Utc};
use std::f64::consts::TAU;

#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticConfig {
    /// Samples per second
    pub sample_rate: f64,
    /// Tick of the first sample
    pub start_tick: f64,
    /// in
    pub mean_level: f64,
    /// in
    pub tide_amplitude: f64,
    /// s
    pub tide_period: f64,
    /// in
    pub chop_amplitude: f64,
    /// in
    pub noise_amplitude: f64,
    /// Seconds between wake trains; 0 disables wakes
    pub wake_every: f64,
    /// Seconds from the start to the first wake train
    pub wake_offset: f64,
    /// Peak wake amplitude in inches
    pub wake_amplitude: f64,
    pub wake_start_period: f64,
    pub wake_end_period: f64,
    pub wake_crests: u32,
    pub seed: u64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        SyntheticConfig {
            sample_rate: 30.0,
            start_tick: 0.0,
            mean_level: 36.0,
            tide_amplitude: 12.0,
            tide_period: 12.42 * 3600.0,
            chop_amplitude: 0.1,
            noise_amplitude: 0.02,
            wake_every: 300.0,
            wake_offset: 60.0,
            wake_amplitude: 2.0,
            wake_start_period: 2.4,
            wake_end_period: 1.8,
            wake_crests: 10,
            seed: 0x5eed_cafe_f00d_d00d,
        }
    }
}

impl SyntheticConfig {
    /// Wall-clock start, or now.
    pub fn starting_at(now: Option<DateTime<Utc>>) -> Self {
        let now = now.unwrap_or_else(Utc::now);
        SyntheticConfig {
            start_tick: now.timestamp_millis() as f64 / 1000.0,
            ..Self::default()
        }
    }

    /// Length of one wake train in seconds.
    pub fn wake_duration(&self) -> f64 {
        f64::from(self.wake_crests) * (self.wake_start_period + self.wake_end_period) / 2.0
    }
}

/// Endless iterator of level samples.
#[derive(Debug, Clone)]
pub struct LevelGenerator {
    config: SyntheticConfig,
    index: u64,
    rng: u64,
    /// Phase of the current wake train, radians
    wake_phase: f64,
}

impl LevelGenerator {
    pub fn new(config: SyntheticConfig) -> Self {
        let rng = config.seed.max(1);
        LevelGenerator {
            config,
            index: 0,
            rng,
            wake_phase: 0.0,
        }
    }

    pub fn config(&self) -> &SyntheticConfig {
        &self.config
    }

    /// Samples covering `seconds` of signal.
    pub fn take_seconds(self, seconds: f64) -> impl Iterator<Item = Sample> {
        let count = (seconds * self.config.sample_rate).max(0.0) as usize;
        self.take(count)
    }

    // xorshift64, uniform in [-1, 1)
    fn noise(&mut self) -> f64 {
        let mut x = self.rng;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.rng = x;
        (x >> 11) as f64 / (1u64 << 53) as f64 * 2.0 - 1.0
    }

    fn wake(&mut self, elapsed: f64, dt: f64) -> f64 {
        let c = &self.config;
        if c.wake_every <= 0.0 || elapsed < c.wake_offset {
            return 0.0;
        }
        let since = (elapsed - c.wake_offset) % c.wake_every;
        let duration = c.wake_duration();
        if since >= duration {
            self.wake_phase = 0.0;
            return 0.0;
        }
        let progress = since / duration;
        let period = c.wake_start_period + (c.wake_end_period - c.wake_start_period) * progress;
        let height = c.wake_amplitude * (progress * TAU / 2.0).sin() * self.wake_phase.sin();
        self.wake_phase += TAU * dt / period;
        height
    }
}

impl Iterator for LevelGenerator {
    type Item = Sample;

    fn next(&mut self) -> Option<Sample> {
        let dt = 1.0 / self.config.sample_rate;
        let elapsed = self.index as f64 * dt;
        let tick = self.config.start_tick + elapsed;
        self.index += 1;

        let c = &self.config;
        let tide = c.mean_level + c.tide_amplitude * (TAU * tick / c.tide_period).sin();
        let chop = c.chop_amplitude
            * (0.6 * (TAU * elapsed / 0.9).sin() + 0.4 * (TAU * elapsed / 1.3 + 1.0).sin());
        let noise_amplitude = c.noise_amplitude;
        let noise = noise_amplitude * self.noise();
        let wake = self.wake(elapsed, dt);

        Some(Sample {
            tick,
            height: tide + chop + noise + wake,
        })
    }
}
