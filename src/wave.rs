//! # Zero-Crossing Wave Extraction
//!
//! Turns a stream of wave heights (level minus baseline, in inches) into one
//! [`WaveEvent`] per complete oscillation. A wave runs from one
//! negative-to-positive crossing to the next; the positive half is timed from
//! the rising crossing to the falling one and the negative half from there to
//! the next rising crossing.
//!
//! ```text
//!        +peak
//!       .--.                 .--
//!  ----'----'------.----.---'----   0
//!   ^ rising        '--'      ^ rising: wave complete
//!                  -peak
//! ```

use crate::config::SiteConfig;
use serde::Serialize;
use std::f64::consts::PI;

/// Waves this long or longer are sensor drift, not surface waves.
pub const MAX_WAVE_PERIOD: f64 = 90.0;

/// Physical constants of the water at the sensor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaterBody {
    /// ft/s²
    pub gravity: f64,
    /// lb/ft³
    pub density: f64,
    /// ft
    pub depth: f64,
}

impl Default for WaterBody {
    fn default() -> Self {
        WaterBody {
            gravity: 32.174,
            density: 62.29,
            depth: 4.0,
        }
    }
}

impl From<&SiteConfig> for WaterBody {
    fn from(site: &SiteConfig) -> Self {
        WaterBody {
            gravity: site.gravity,
            density: site.water_density,
            depth: site.depth_ft,
        }
    }
}

impl WaterBody {
    /// Shallow-water wave speed in ft/s.
    pub fn wave_speed(&self) -> f64 {
        (self.gravity * self.depth).sqrt()
    }

    /// Energy flux of a wave with the given period (s) and peak-to-peak
    /// height (inches).
    pub fn wave_power(&self, period: f64, peak_to_peak_in: f64) -> f64 {
        let speed = self.wave_speed();
        let wavelength = period * speed;
        let height_ft = peak_to_peak_in / 12.0;
        let shoaling = 0.5
            + (2.0 * PI * self.depth / wavelength) / (4.0 * PI * self.depth / wavelength).sinh();
        self.gravity * self.density * height_ft * height_ft * speed * shoaling / 8.0
    }

    /// Deep-water wavelength (ft) of a wave with the given period.
    pub fn deep_wavelength(&self, period: f64) -> f64 {
        period * period * self.gravity / (2.0 * PI)
    }

    /// Deep-water period (s) of a wave with the given wavelength.
    pub fn deep_period(&self, wavelength: f64) -> f64 {
        (2.0 * PI * wavelength / self.gravity).sqrt()
    }
}

/// One complete oscillation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WaveEvent {
    /// Tick of the rising crossing that completed the wave
    pub tick: f64,
    /// s
    pub period: f64,
    /// inches
    pub peak_to_peak: f64,
    pub power: f64,
    /// Area ratio of the positive half over the negative half, minus 0.5;
    /// 0 when the negative half is empty
    pub balance: f64,
}

#[derive(Debug, Clone)]
pub struct WaveExtractor {
    water: WaterBody,
    seeded: bool,
    last_positive: bool,
    positive_peak: f64,
    negative_peak: f64,
    positive_period: f64,
    zero_crossing_tick: f64,
}

impl WaveExtractor {
    pub fn new(water: WaterBody) -> Self {
        WaveExtractor {
            water,
            seeded: false,
            last_positive: true,
            positive_peak: 0.0,
            negative_peak: 0.0,
            positive_period: 0.0,
            zero_crossing_tick: 0.0,
        }
    }

    /// Feed one sample. Returns the wave completed by this sample, if any.
    pub fn update(&mut self, tick: f64, height: f64) -> Option<WaveEvent> {
        if !self.seeded {
            self.seeded = true;
            self.zero_crossing_tick = tick;
            return None;
        }

        let positive = height >= 0.0;
        let mut completed = None;
        if positive != self.last_positive {
            if positive {
                completed = self.finish_wave(tick, height);
            } else {
                self.positive_period = tick - self.zero_crossing_tick;
                self.negative_peak = height;
            }
            self.zero_crossing_tick = tick;
            self.last_positive = positive;
        }

        if positive {
            self.positive_peak = self.positive_peak.max(height);
        } else {
            self.negative_peak = self.negative_peak.min(height);
        }
        completed
    }

    fn finish_wave(&mut self, tick: f64, height: f64) -> Option<WaveEvent> {
        let negative_period = tick - self.zero_crossing_tick;
        let period = self.positive_period + negative_period;
        let peak_to_peak = self.positive_peak - self.negative_peak;
        let balance = if negative_period > 0.0 && self.negative_peak < 0.0 {
            (self.positive_period * self.positive_peak) / (negative_period * -self.negative_peak)
                - 0.5
        } else {
            0.0
        };
        // next positive half starts here
        self.positive_peak = height;

        if !(period > 0.0 && period < MAX_WAVE_PERIOD) {
            tracing::debug!(tick, period, "discarding implausible wave period");
            return None;
        }
        Some(WaveEvent {
            tick,
            period,
            peak_to_peak,
            power: self.water.wave_power(period, peak_to_peak),
            balance,
        })
    }

    pub fn water(&self) -> &WaterBody {
        &self.water
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(extractor: &mut WaveExtractor, samples: &[(f64, f64)]) -> Vec<WaveEvent> {
        samples
            .iter()
            .filter_map(|&(t, h)| extractor.update(t, h))
            .collect()
    }

    #[test]
    fn square_wave_yields_one_event_per_cycle() {
        let mut extractor = WaveExtractor::new(WaterBody::default());
        let samples = [
            (0.0, 0.5),
            (0.5, 1.0),
            (1.0, -1.0),
            (1.5, -2.0),
            (2.0, 1.0),
            (2.5, 1.5),
            (3.0, -0.5),
            (3.5, -1.0),
            (4.0, 0.5),
        ];
        let events = feed(&mut extractor, &samples);
        assert_eq!(events.len(), 2);

        assert_eq!(events[0].tick, 2.0);
        assert!((events[0].period - 2.0).abs() < 1e-12);
        assert!((events[0].peak_to_peak - 3.0).abs() < 1e-12);

        assert_eq!(events[1].tick, 4.0);
        assert!((events[1].period - 2.0).abs() < 1e-12);
        assert!((events[1].peak_to_peak - 2.5).abs() < 1e-12);
    }

    #[test]
    fn first_sample_only_seeds() {
        let mut extractor = WaveExtractor::new(WaterBody::default());
        assert_eq!(extractor.update(5.0, -3.0), None);
        // falling crossing measured from the seed tick
        assert_eq!(extractor.update(6.0, -1.0), None);
        let event = extractor.update(7.0, 1.0).unwrap();
        assert!((event.period - 2.0).abs() < 1e-12);
    }

    #[test]
    fn balance_compares_half_areas() {
        let mut extractor = WaveExtractor::new(WaterBody::default());
        let samples = [(0.0, 0.0), (0.5, 1.0), (1.0, -0.5), (1.5, -1.0), (2.0, 0.5)];
        let event = feed(&mut extractor, &samples).pop().unwrap();
        // positive half 1.0 s * 1.0 in over negative half 1.0 s * 1.0 in
        assert!((event.balance - 0.5).abs() < 1e-12);
    }

    #[test]
    fn long_periods_are_rejected() {
        let mut extractor = WaveExtractor::new(WaterBody::default());
        let samples = [(0.0, 1.0), (50.0, -1.0), (100.0, 1.0)];
        assert!(feed(&mut extractor, &samples).is_empty());
        // extractor keeps running after a rejection
        let event = feed(&mut extractor, &[(101.0, -1.0), (102.0, 1.0)]).pop().unwrap();
        assert!((event.period - 2.0).abs() < 1e-12);
    }

    #[test]
    fn power_matches_closed_form() {
        let water = WaterBody::default();
        let speed = (32.174_f64 * 4.0).sqrt();
        let wavelength = 2.0 * speed;
        let h = 3.0 / 12.0;
        let expected = 32.174 * 62.29 * h * h * speed
            * (0.5 + (2.0 * PI * 4.0 / wavelength) / (4.0 * PI * 4.0 / wavelength).sinh())
            / 8.0;
        assert!((water.wave_power(2.0, 3.0) - expected).abs() < 1e-9);
        assert!(water.wave_power(2.0, 6.0) > water.wave_power(2.0, 3.0));
    }

    #[test]
    fn deep_water_conversions_invert() {
        let water = WaterBody::default();
        let period = water.deep_period(20.0);
        assert!((water.deep_wavelength(period) - 20.0).abs() < 1e-9);
    }
}
