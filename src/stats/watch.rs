use serde::Serialize;
use std::fmt;

/// Direction a watched value is moving, once it has moved past the hysteresis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Trend {
    Neutral,
    Rising,
    Falling,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Trend::Neutral => "Neutral",
            Trend::Rising => "Rising",
            Trend::Falling => "Falling",
        })
    }
}

/// A completed run that ended in a trend change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reversal {
    /// Trend of the run that just ended
    pub ended: Trend,
    /// Trend starting now
    pub started: Trend,
    /// Extreme at which the run ended
    pub peak: f64,
    /// Extreme at which the run began
    pub from: f64,
    /// Change per minute over the run, 0 for a zero-length run
    pub rate_per_min: f64,
}

impl Reversal {
    pub fn run(&self) -> f64 {
        self.peak - self.from
    }
}

/// What one [`Watch::analyze`] call found.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WatchUpdate {
    pub reversal: Option<Reversal>,
    /// Value exceeded the configured multiple of the running average
    pub anomalous: bool,
}

/// Min/max/average tracker with a hysteresis trend detector.
#[derive(Debug, Clone)]
pub struct Watch {
    hysteresis: f64,
    anomalous: f64,
    start_tick: f64,
    value: f64,
    min: f64,
    max: f64,
    elements: u64,
    sum: f64,
    trend: Trend,
    reversals: u32,
    /// Latest extreme of the current run
    past_value: f64,
    past_tick: f64,
    /// Extreme at which the current run began
    reversal_value: f64,
    reversal_tick: f64,
}

impl Watch {
    pub fn new(seed: f64, tick: f64, hysteresis: f64, anomalous: f64) -> Self {
        Watch {
            hysteresis,
            anomalous,
            start_tick: tick,
            value: seed,
            min: seed,
            max: seed,
            elements: 0,
            sum: 0.0,
            trend: Trend::Neutral,
            reversals: 0,
            past_value: seed,
            past_tick: tick,
            reversal_value: seed,
            reversal_tick: tick,
        }
    }

    pub fn analyze(&mut self, tick: f64, value: f64) -> WatchUpdate {
        self.value = value;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
        self.elements += 1;
        self.sum += value;

        let reversal = self.find_trend(tick, value);
        let average = self.average();
        WatchUpdate {
            reversal,
            anomalous: value > self.anomalous * average,
        }
    }

    fn find_trend(&mut self, tick: f64, value: f64) -> Option<Reversal> {
        let delta = value - self.past_value;
        let candidate = if delta > self.hysteresis {
            Trend::Rising
        } else if delta < -self.hysteresis {
            Trend::Falling
        } else {
            self.trend
        };

        if candidate != self.trend {
            let elapsed = self.past_tick - self.reversal_tick;
            let rate_per_min = if elapsed != 0.0 {
                (self.past_value - self.reversal_value) / elapsed * 60.0
            } else {
                0.0
            };
            let reversal = Reversal {
                ended: self.trend,
                started: candidate,
                peak: self.past_value,
                from: self.reversal_value,
                rate_per_min,
            };
            self.reversals += 1;
            self.reversal_value = self.past_value;
            self.reversal_tick = self.past_tick;
            self.trend = candidate;
            return Some(reversal);
        }

        let extends = match self.trend {
            Trend::Rising => value > self.past_value,
            Trend::Falling => value < self.past_value,
            Trend::Neutral => false,
        };
        if extends {
            self.past_value = value;
            self.past_tick = tick;
        }
        None
    }

    /// Start a new reporting period from the current value.
    pub fn reset(&mut self, tick: f64) {
        self.start_tick = tick;
        self.min = self.value;
        self.max = self.value;
        self.elements = 0;
        self.sum = 0.0;
        self.reversals = 0;
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn trend(&self) -> Trend {
        self.trend
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn average(&self) -> f64 {
        if self.elements > 0 {
            self.sum / self.elements as f64
        } else {
            0.0
        }
    }

    pub fn reversals(&self) -> u32 {
        self.reversals
    }

    pub fn samples(&self) -> u64 {
        self.elements
    }

    pub fn start_tick(&self) -> f64 {
        self.start_tick
    }
}

/// A change larger than the trigger across `count` samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RapidChange {
    pub trend: Trend,
    pub delta: f64,
    pub minutes: f64,
}

/// Compares the value every `count` samples against the value saved at the
/// previous comparison.
#[derive(Debug, Clone)]
pub struct RateTrigger {
    count: u32,
    trigger: f64,
    countdown: u32,
    saved_value: f64,
    saved_tick: f64,
    seeded: bool,
    enabled: bool,
}

impl RateTrigger {
    pub fn new(count: u32, trigger: f64) -> Self {
        let count = count.max(1);
        RateTrigger {
            count,
            trigger,
            countdown: count,
            saved_value: 0.0,
            saved_tick: 0.0,
            seeded: false,
            enabled: true,
        }
    }

    pub fn update(&mut self, tick: f64, value: f64) -> Option<RapidChange> {
        if !self.enabled {
            self.countdown = self.countdown.saturating_sub(1);
            if self.countdown == 0 {
                self.save(tick, value);
                self.enabled = true;
            }
            return None;
        }

        if !self.seeded {
            self.save(tick, value);
            self.seeded = true;
        }
        self.countdown = self.countdown.saturating_sub(1);
        if self.countdown > 0 {
            return None;
        }

        let delta = value - self.saved_value;
        let change = (delta.abs() > self.trigger).then(|| RapidChange {
            trend: if delta > 0.0 {
                Trend::Rising
            } else {
                Trend::Falling
            },
            delta,
            minutes: (tick - self.saved_tick) / 60.0,
        });
        self.save(tick, value);
        change
    }

    /// Mute for `count` samples, then restart from the value seen at that point.
    pub fn disable(&mut self, count: u32) {
        self.enabled = false;
        self.countdown = count;
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    fn save(&mut self, tick: f64, value: f64) {
        self.saved_tick = tick;
        self.saved_value = value;
        self.countdown = self.count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_moves_stay_neutral() {
        let mut watch = Watch::new(24.0, 0.0, 0.25, 10.0);
        for (i, v) in [24.1, 24.2, 23.9, 24.0].iter().enumerate() {
            assert_eq!(watch.analyze(i as f64, *v).reversal, None);
        }
        assert_eq!(watch.trend(), Trend::Neutral);
        assert_eq!(watch.min(), 23.9);
        assert_eq!(watch.max(), 24.2);
    }

    #[test]
    fn reversal_reports_the_finished_run() {
        let mut watch = Watch::new(24.0, 0.0, 0.25, 10.0);
        let first = watch.analyze(1.0, 24.3).reversal.unwrap();
        assert_eq!((first.ended, first.started), (Trend::Neutral, Trend::Rising));

        // rising run extends to 24.7 at t=60
        watch.analyze(30.0, 24.5);
        watch.analyze(60.0, 24.7);
        assert_eq!(watch.trend(), Trend::Rising);

        let turn = watch.analyze(90.0, 24.4).reversal.unwrap();
        assert_eq!(turn.ended, Trend::Rising);
        assert_eq!(turn.started, Trend::Falling);
        assert!((turn.peak - 24.7).abs() < 1e-12);
        assert!((turn.from - 24.0).abs() < 1e-12);
        assert!((turn.run() - 0.7).abs() < 1e-9);
        assert!((turn.rate_per_min - 0.7).abs() < 1e-9);
        assert_eq!(watch.reversals(), 2);
    }

    #[test]
    fn anomalous_against_running_average() {
        let mut watch = Watch::new(1.0, 0.0, 0.25, 2.0);
        for i in 0..9 {
            assert!(!watch.analyze(i as f64, 1.0).anomalous);
        }
        assert!(watch.analyze(9.0, 5.0).anomalous);
    }

    #[test]
    fn reset_keeps_trend_but_clears_period() {
        let mut watch = Watch::new(0.0, 0.0, 0.25, 10.0);
        watch.analyze(1.0, 1.0);
        watch.reset(2.0);
        assert_eq!(watch.samples(), 0);
        assert_eq!(watch.reversals(), 0);
        assert_eq!(watch.min(), 1.0);
        assert_eq!(watch.trend(), Trend::Rising);
        assert_eq!(watch.average(), 0.0);
    }

    #[test]
    fn rate_trigger_compares_every_count_samples() {
        let mut rate = RateTrigger::new(3, 0.5);
        assert_eq!(rate.update(0.0, 10.0), None);
        assert_eq!(rate.update(60.0, 10.2), None);
        // third sample compares against the seed
        let hit = rate.update(120.0, 10.8).unwrap();
        assert_eq!(hit.trend, Trend::Rising);
        assert!((hit.delta - 0.8).abs() < 1e-9);
        assert!((hit.minutes - 2.0).abs() < 1e-12);

        // next window is measured from 10.8
        assert_eq!(rate.update(180.0, 10.7), None);
        assert_eq!(rate.update(240.0, 10.6), None);
        assert_eq!(rate.update(300.0, 10.5), None);
    }

    #[test]
    fn disabled_trigger_resumes_from_a_fresh_baseline() {
        let mut rate = RateTrigger::new(2, 0.5);
        rate.update(0.0, 0.0);
        rate.disable(2);
        assert_eq!(rate.update(1.0, 5.0), None);
        assert_eq!(rate.update(2.0, 5.0), None);
        assert_eq!(rate.update(3.0, 5.2), None);
        let hit = rate.update(4.0, 4.0).unwrap();
        assert_eq!(hit.trend, Trend::Falling);
    }
}
