//! Rolling summaries of everything the classifier has disposed of since the
//! last reporting boundary.

use super::accumulator::WakeRecord;
use crate::config::WakeConfig;
use crate::sink::Outputs;
use crate::stats::Average;
use crate::wave::WaveEvent;
use serde::Serialize;

/// Min/max of one quantity; empty until the first value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Span {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl Span {
    pub fn update(&mut self, value: f64) {
        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));
    }
}

/// Plain waves: counts, ranges, averages and the decaying noise threshold
/// that separates ambient chop from candidate wakes.
#[derive(Debug, Clone)]
pub struct WaveSummary {
    initial_threshold: f64,
    degradation: f64,
    noise_threshold: f64,
    /// Tick of the last threshold update; `None` right after a reset
    threshold_tick: Option<f64>,
    start_tick: f64,
    count: u64,
    period: Span,
    peak: Span,
    power: Span,
    average_period: Average,
    average_peak: Average,
    average_power: Average,
    total_power: f64,
}

impl WaveSummary {
    pub fn new(config: &WakeConfig) -> Self {
        let mut summary = WaveSummary {
            initial_threshold: config.initial_noise_threshold,
            degradation: config.power_degradation,
            noise_threshold: config.initial_noise_threshold,
            threshold_tick: None,
            start_tick: 0.0,
            count: 0,
            period: Span::default(),
            peak: Span::default(),
            power: Span::default(),
            average_period: Average::new(config.summary_span),
            average_peak: Average::new(config.summary_span),
            average_power: Average::new(config.summary_span),
            total_power: 0.0,
        };
        summary.reset(0.0);
        summary
    }

    /// Power a wave has to exceed to be considered part of a wake.
    pub fn noise_threshold(&self) -> f64 {
        self.noise_threshold
    }

    pub fn update(&mut self, event: &WaveEvent, out: &mut Outputs<'_>) {
        let held = match self.threshold_tick {
            None => self.noise_threshold,
            Some(since) => {
                let decay = (1.0 - self.degradation * (event.tick - since)).max(0.0);
                self.noise_threshold * decay
            }
        };
        self.noise_threshold = event.power.max(held);
        self.threshold_tick = Some(event.tick);

        self.count += 1;
        self.period.update(event.period);
        self.peak.update(event.peak_to_peak);
        self.power.update(event.power);
        self.average_period.update(event.period);
        self.average_peak.update(event.peak_to_peak);
        let average_power = self.average_power.update(event.power);
        self.total_power += event.power;

        out.record(event.tick, "wave", "period", event.period);
        out.record(event.tick, "wave", "peak", event.peak_to_peak);
        out.record(event.tick, "wave", "power", event.power);
        out.record(event.tick, "wave", "powerAverage", average_power);
        out.record(event.tick, "wave", "noiseThreshold", self.noise_threshold);
    }

    /// Start a new reporting period. The noise threshold starts over too.
    pub fn reset(&mut self, tick: f64) {
        self.start_tick = tick;
        self.noise_threshold = self.initial_threshold;
        self.threshold_tick = None;
        self.count = 0;
        self.period = Span::default();
        self.peak = Span::default();
        self.power = Span::default();
        self.average_period.reset();
        self.average_peak.reset();
        self.average_power.reset();
        // same as a 1" x 1 s wave until real waves arrive
        self.average_power.update(1.0);
        self.total_power = 0.0;
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn start_tick(&self) -> f64 {
        self.start_tick
    }

    pub fn period(&self) -> Span {
        self.period
    }

    pub fn peak(&self) -> Span {
        self.peak
    }

    pub fn power(&self) -> Span {
        self.power
    }

    pub fn average_period(&self) -> Option<f64> {
        self.average_period.value()
    }

    pub fn average_peak(&self) -> Option<f64> {
        self.average_peak.value()
    }

    pub fn average_power(&self) -> Option<f64> {
        self.average_power.value()
    }

    pub fn total_power(&self) -> f64 {
        self.total_power
    }
}

/// Closed wakes since the last reporting boundary.
#[derive(Debug, Clone, Default)]
pub struct WakeSummary {
    start_tick: f64,
    count: u64,
    coherent: u64,
    crests: u64,
    max_crests: u32,
    total_duration: f64,
    total_energy: f64,
    period: Span,
    peak: Span,
    power: Span,
    distance: Span,
    wavelength: Span,
    period_sum: f64,
    distance_sum: f64,
    wavelength_sum: f64,
}

impl WakeSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, record: &WakeRecord, out: &mut Outputs<'_>) {
        self.count += 1;
        if record.coherent {
            self.coherent += 1;
        }
        self.crests += u64::from(record.crests);
        self.max_crests = self.max_crests.max(record.crests);
        self.total_duration += record.duration;
        self.total_energy += record.total_power;
        self.period.update(record.min_period);
        self.period.update(record.max_period);
        self.peak.update(record.min_peak);
        self.peak.update(record.max_peak);
        self.power.update(record.min_power);
        self.power.update(record.max_power);
        self.distance.update(record.distance);
        self.wavelength.update(record.wavelength);
        self.period_sum += record.representative_period;
        self.distance_sum += record.distance;
        self.wavelength_sum += record.wavelength;

        let tick = record.start_tick;
        out.record(tick, "wake", "period", record.representative_period);
        out.record(tick, "wake", "wavelength", record.wavelength);
        out.record(tick, "wake", "distance", record.distance);
        out.record(tick, "wake", "energy", record.total_power);
        out.record(tick, "wake", "crests", f64::from(record.crests));
        out.record(tick, "wake", "duration", record.duration);
    }

    pub fn reset(&mut self, tick: f64) {
        *self = WakeSummary {
            start_tick: tick,
            ..WakeSummary::default()
        };
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn coherent(&self) -> u64 {
        self.coherent
    }

    /// Crests across all closed wakes.
    pub fn crests(&self) -> u64 {
        self.crests
    }

    pub fn max_crests(&self) -> u32 {
        self.max_crests
    }

    pub fn total_duration(&self) -> f64 {
        self.total_duration
    }

    pub fn total_energy(&self) -> f64 {
        self.total_energy
    }

    pub fn start_tick(&self) -> f64 {
        self.start_tick
    }

    pub fn period(&self) -> Span {
        self.period
    }

    pub fn peak(&self) -> Span {
        self.peak
    }

    pub fn power(&self) -> Span {
        self.power
    }

    pub fn distance(&self) -> Span {
        self.distance
    }

    pub fn wavelength(&self) -> Span {
        self.wavelength
    }

    fn mean(&self, sum: f64) -> Option<f64> {
        (self.count > 0).then(|| sum / self.count as f64)
    }

    pub fn average_period(&self) -> Option<f64> {
        self.mean(self.period_sum)
    }

    pub fn average_distance(&self) -> Option<f64> {
        self.mean(self.distance_sum)
    }

    pub fn average_wavelength(&self) -> Option<f64> {
        self.mean(self.wavelength_sum)
    }
}
