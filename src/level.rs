//! # Level Conditioning
//!
//! The acquisition side delivers water level in inches. Two stages turn it
//! into what the detectors want:
//!
//! - [`LevelConditioner`] runs per sample. It subtracts a short baseline to
//!   get the wave height, smooths that for the zero-crossing extractor, and
//!   keeps a long average of the level itself.
//! - [`LevelTracker`] runs once a minute on that long average. It reports
//!   tide trend reversals, rapid rises or falls and the hourly/daily ranges.

use crate::config::LevelConfig;
use crate::sink::{Outputs, Severity};
use crate::stats::{Average, HighLow, Ohlc, RateTrigger, Trap, TrapHit, Trend, Watch};
use std::collections::VecDeque;

/// One level sample after conditioning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Conditioned {
    pub baseline: f64,
    /// Level minus baseline
    pub wave_height: f64,
    /// Smoothed wave height
    pub filtered: f64,
}

#[derive(Debug, Clone)]
pub struct LevelConditioner {
    baseline: Average,
    smoothing: Average,
    long: Average,
    trap: Trap,
}

impl LevelConditioner {
    pub fn new(config: &LevelConfig) -> Self {
        LevelConditioner {
            baseline: Average::new(config.baseline_span),
            smoothing: Average::new(config.smoothing_span),
            long: Average::new(config.long_span),
            trap: Trap::new(config.trap_high, config.trap_low, config.trap_span),
        }
    }

    pub fn condition(&mut self, tick: f64, level: f64, out: &mut Outputs<'_>) -> Conditioned {
        self.long.update(level);
        let baseline = self.baseline.update(level);
        let wave_height = level - baseline;
        let filtered = self.smoothing.update(wave_height);

        if let Some(hit) = self.trap.append(wave_height) {
            let message = match hit {
                TrapHit::High(v) => format!("wave height {v:.2}in above trap"),
                TrapHit::Low(v) => format!("wave height {v:.2}in below trap"),
            };
            out.emit(tick, "trap", &message, Severity::Warn);
        }

        Conditioned {
            baseline,
            wave_height,
            filtered,
        }
    }

    /// Long-term average level, `None` before the first sample.
    pub fn long_level(&self) -> Option<f64> {
        self.long.value()
    }
}

/// Minutes of long-level history kept for the rate calculations.
const HISTORY_MINUTES: usize = 6;

#[derive(Debug, Clone)]
pub struct LevelTracker {
    hysteresis: f64,
    anomalous_multiple: f64,
    history: VecDeque<f64>,
    watch: Option<Watch>,
    rate: RateTrigger,
    hourly: HighLow,
    daily: HighLow,
    rate_1min: Option<f64>,
    rate_5min: Option<f64>,
}

impl LevelTracker {
    pub fn new(config: &LevelConfig) -> Self {
        LevelTracker {
            hysteresis: config.watch_hysteresis,
            anomalous_multiple: config.anomalous_multiple,
            history: VecDeque::with_capacity(HISTORY_MINUTES),
            watch: None,
            rate: RateTrigger::new(config.rate_count, config.rate_trigger),
            hourly: HighLow::new(),
            daily: HighLow::new(),
            rate_1min: None,
            rate_5min: None,
        }
    }

    /// Minute update with the current long-term level.
    pub fn minute(&mut self, tick: f64, level: f64, out: &mut Outputs<'_>) {
        if self.history.len() == HISTORY_MINUTES {
            self.history.pop_front();
        }
        self.history.push_back(level);

        // in/hr
        let n = self.history.len();
        self.rate_1min = (n >= 2).then(|| (level - self.history[n - 2]) * 60.0);
        self.rate_5min = (n >= HISTORY_MINUTES).then(|| (level - self.history[0]) * 12.0);

        out.record(tick, "waterLevel", "level", level);
        if let Some(rate) = self.rate_1min {
            out.record(tick, "waterLevel", "rate1", rate);
        }
        if let Some(rate) = self.rate_5min {
            out.record(tick, "waterLevel", "rate5", rate);
        }

        self.hourly.update(level);
        self.daily.update(level);

        let watch = self.watch.get_or_insert_with(|| {
            Watch::new(level, tick, self.hysteresis, self.anomalous_multiple)
        });
        let update = watch.analyze(tick, level);
        if let Some(reversal) = update.reversal {
            if reversal.ended != Trend::Neutral {
                out.emit(
                    tick,
                    "level",
                    &format!(
                        "{} turned {} at {:.2}in after {:+.2}in ({:+.3}in/min)",
                        reversal.ended,
                        reversal.started,
                        reversal.peak,
                        reversal.run(),
                        reversal.rate_per_min
                    ),
                    Severity::Info,
                );
            }
        }
        if update.anomalous {
            out.emit(
                tick,
                "level",
                &format!("anomalous level {level:.2}in"),
                Severity::Warn,
            );
        }

        if let Some(change) = self.rate.update(tick, level) {
            out.emit(
                tick,
                "surge",
                &format!(
                    "rapid {}: {:+.2}in in {:.0} min",
                    change.trend, change.delta, change.minutes
                ),
                Severity::Warn,
            );
            // one report per surge
            self.rate.disable(self.rate.count());
        }
    }

    pub fn rate_1min(&self) -> Option<f64> {
        self.rate_1min
    }

    pub fn rate_5min(&self) -> Option<f64> {
        self.rate_5min
    }

    pub fn watch(&self) -> Option<&Watch> {
        self.watch.as_ref()
    }

    pub fn hourly(&self) -> Option<Ohlc> {
        self.hourly.range()
    }

    pub fn daily(&self) -> Option<Ohlc> {
        self.daily.range()
    }

    pub fn reset_hourly(&mut self, tick: f64) {
        self.hourly.reset();
        if let Some(watch) = &mut self.watch {
            watch.reset(tick);
        }
    }

    pub fn reset_daily(&mut self) {
        self.daily.reset();
    }
}
