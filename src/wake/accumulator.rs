use crate::wave::WaveEvent;
use serde::Serialize;
use std::f64::consts::PI;

/// Representative wake periods above this are clamped; longer "wakes" are swell.
pub const MAX_WAKE_PERIOD: f64 = 4.0;

/// Everything known about one wake once it has ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WakeRecord {
    pub start_tick: f64,
    pub end_tick: f64,
    /// Last crest minus first crest plus one first period
    pub duration: f64,
    pub crests: u32,
    pub first_period: f64,
    pub last_period: f64,
    pub min_period: f64,
    pub max_period: f64,
    pub min_peak: f64,
    pub max_peak: f64,
    pub min_power: f64,
    pub max_power: f64,
    pub total_power: f64,
    pub representative_period: f64,
    /// Deep-water wavelength of the representative period, ft
    pub wavelength: f64,
    /// Estimated distance to the source, ft
    pub distance: f64,
    /// Dispersion lead time of the first crest, s
    pub lead_time: f64,
    /// Every crest was within tolerance of the one before it
    pub coherent: bool,
}

#[derive(Debug, Clone, Copy)]
struct Crests {
    start_tick: f64,
    last_tick: f64,
    first_period: f64,
    last_period: f64,
    min_period: f64,
    max_period: f64,
    min_peak: f64,
    max_peak: f64,
    min_power: f64,
    max_power: f64,
    total_power: f64,
    count: u32,
    coherent: bool,
}

impl Crests {
    fn first(event: &WaveEvent) -> Self {
        Crests {
            start_tick: event.tick,
            last_tick: event.tick,
            first_period: event.period,
            last_period: event.period,
            min_period: event.period,
            max_period: event.period,
            min_peak: event.peak_to_peak,
            max_peak: event.peak_to_peak,
            min_power: event.power,
            max_power: event.power,
            total_power: event.power,
            count: 1,
            coherent: true,
        }
    }

    fn add(&mut self, event: &WaveEvent, variance: f64) {
        let factor = if self.last_period > 0.0 {
            event.period / self.last_period
        } else {
            1.0
        };
        if !(1.0 - variance..=1.0 + variance).contains(&factor) {
            self.coherent = false;
        }

        self.last_tick = event.tick;
        self.last_period = event.period;
        self.min_period = self.min_period.min(event.period);
        self.max_period = self.max_period.max(event.period);
        self.min_peak = self.min_peak.min(event.peak_to_peak);
        self.max_peak = self.max_peak.max(event.peak_to_peak);
        self.min_power = self.min_power.min(event.power);
        self.max_power = self.max_power.max(event.power);
        self.total_power += event.power;
        self.count += 1;
    }
}

/// Collects the crests of one wake and turns them into a [`WakeRecord`].
#[derive(Debug, Clone)]
pub struct WakeAccumulator {
    gravity: f64,
    variance: f64,
    max_distance: f64,
    crests: Option<Crests>,
}

impl WakeAccumulator {
    pub fn new(gravity: f64, variance: f64, max_distance: f64) -> Self {
        WakeAccumulator {
            gravity,
            variance,
            max_distance,
            crests: None,
        }
    }

    pub fn update(&mut self, event: &WaveEvent) {
        match &mut self.crests {
            None => self.crests = Some(Crests::first(event)),
            Some(crests) => crests.add(event, self.variance),
        }
    }

    pub fn crest_count(&self) -> u32 {
        self.crests.map_or(0, |c| c.count)
    }

    pub fn is_empty(&self) -> bool {
        self.crests.is_none()
    }

    /// Discard anything collected so far.
    pub fn reset(&mut self) {
        self.crests = None;
    }

    /// Finish the wake. `None` when no crest was ever added.
    pub fn close(&mut self) -> Option<WakeRecord> {
        let c = self.crests.take()?;
        let elapsed = c.last_tick - c.start_tick;
        let duration = elapsed + c.first_period;
        let distance = calculate_distance(c.first_period, c.last_period, elapsed, self.gravity)
            .min(self.max_distance);
        let period = representative_period(
            c.first_period,
            c.last_period,
            elapsed,
            c.count,
            MAX_WAKE_PERIOD,
        );

        Some(WakeRecord {
            start_tick: c.start_tick,
            end_tick: c.last_tick,
            duration,
            crests: c.count,
            first_period: c.first_period,
            last_period: c.last_period,
            min_period: c.min_period,
            max_period: c.max_period,
            min_peak: c.min_peak,
            max_peak: c.max_peak,
            min_power: c.min_power,
            max_power: c.max_power,
            total_power: c.total_power,
            representative_period: period,
            wavelength: period * period * self.gravity / (2.0 * PI),
            distance,
            lead_time: lead_time(c.first_period, c.last_period, duration, self.gravity),
            coherent: c.coherent,
        })
    }
}

/// Distance to a wake's source from the dispersion of its crests.
///
/// Longer periods travel faster, so a first crest of `period1` arriving
/// `elapsed` seconds ahead of a crest of `period2` implies how far both have
/// come. Zero unless the period is falling.
pub fn calculate_distance(period1: f64, period2: f64, elapsed: f64, gravity: f64) -> f64 {
    if period1 <= period2 {
        return 0.0;
    }
    let time1 = period2 * elapsed / (period1 - period2);
    period1 * (gravity / (2.0 * PI)) * time1
}

/// One period that stands for the whole wake, preferring the mean of the
/// first and last crest and falling back through the crest-averaged period,
/// the first, the last and finally `cap`.
pub fn representative_period(first: f64, last: f64, elapsed: f64, crests: u32, cap: f64) -> f64 {
    let candidates = [
        (first + last) / 2.0,
        if crests > 0 {
            elapsed / f64::from(crests)
        } else {
            f64::INFINITY
        },
        first,
        last,
    ];
    candidates
        .into_iter()
        .find(|p| *p <= cap)
        .unwrap_or(cap)
}

/// How long before the first crest the wake was generated, from the ratio of
/// the first and last deep-water crest speeds.
pub fn lead_time(first_period: f64, last_period: f64, duration: f64, gravity: f64) -> f64 {
    let first_speed = gravity / (2.0 * PI) * first_period;
    let last_speed = gravity / (2.0 * PI) * last_period;
    if last_speed > 0.0 && first_speed != last_speed {
        duration / (first_speed / last_speed - 1.0)
    } else {
        duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const G: f64 = 32.174;

    fn event(tick: f64, period: f64, peak: f64, power: f64) -> WaveEvent {
        WaveEvent {
            tick,
            period,
            peak_to_peak: peak,
            power,
            balance: 0.0,
        }
    }

    #[test]
    fn distance_is_zero_unless_period_falls() {
        assert_eq!(calculate_distance(2.0, 2.0, 10.0, G), 0.0);
        assert_eq!(calculate_distance(1.5, 2.0, 10.0, G), 0.0);

        let d = calculate_distance(2.1, 2.0, 2.1, G);
        let time1 = 2.0 * 2.1 / 0.1;
        assert!((d - 2.1 * G / (2.0 * PI) * time1).abs() < 1e-6);
    }

    #[test]
    fn representative_period_fallbacks() {
        assert_eq!(representative_period(2.0, 3.0, 10.0, 4, 4.0), 2.5);
        // mean too long, crest average used
        assert_eq!(representative_period(6.0, 5.0, 9.0, 3, 4.0), 3.0);
        // everything too long
        assert_eq!(representative_period(6.0, 5.0, 60.0, 3, 4.0), 4.0);
        // crest average too long but last period fits
        assert_eq!(representative_period(9.0, 3.5, 60.0, 3, 4.0), 3.5);
    }

    #[test]
    fn lead_time_falls_back_to_duration() {
        assert_eq!(lead_time(2.0, 2.0, 6.0, G), 6.0);
        assert_eq!(lead_time(2.0, 0.0, 6.0, G), 6.0);
        assert!((lead_time(3.0, 2.0, 6.0, G) - 12.0).abs() < 1e-9);
    }

    #[test]
    fn close_builds_record_and_empties() {
        let mut acc = WakeAccumulator::new(G, 0.1, 5000.0);
        assert!(acc.close().is_none());

        acc.update(&event(6.0, 2.1, 3.0, 21.4));
        acc.update(&event(8.1, 2.0, 3.2, 23.0));
        assert_eq!(acc.crest_count(), 2);

        let record = acc.close().unwrap();
        assert!(acc.is_empty());
        assert_eq!(record.crests, 2);
        assert_eq!(record.start_tick, 6.0);
        assert_eq!(record.end_tick, 8.1);
        assert!((record.duration - (2.1 + 2.1)).abs() < 1e-9);
        assert!((record.total_power - 44.4).abs() < 1e-9);
        assert_eq!((record.min_period, record.max_period), (2.0, 2.1));
        assert_eq!((record.min_peak, record.max_peak), (3.0, 3.2));
        assert!(record.coherent);
        assert!((record.representative_period - 2.05).abs() < 1e-12);
        assert!((record.wavelength - 2.05 * 2.05 * G / (2.0 * PI)).abs() < 1e-9);
        assert!(record.distance > 0.0);
    }

    #[test]
    fn distance_is_clamped() {
        let mut acc = WakeAccumulator::new(G, 0.1, 100.0);
        acc.update(&event(0.0, 3.0, 1.0, 5.0));
        acc.update(&event(60.0, 2.9, 1.0, 5.0));
        assert_eq!(acc.close().unwrap().distance, 100.0);
    }

    #[test]
    fn period_jump_marks_wake_incoherent() {
        let mut acc = WakeAccumulator::new(G, 0.1, 5000.0);
        acc.update(&event(0.0, 2.0, 1.0, 5.0));
        acc.update(&event(2.0, 3.0, 1.0, 5.0));
        assert!(!acc.close().unwrap().coherent);
    }
}
