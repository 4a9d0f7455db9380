use crate::error::{Result, WakeError};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// How a resampled value is taken from the two raw samples around it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResampleMethod {
    /// Whichever raw sample is closer in time
    Nearest,
    /// Straight line between the two raw samples
    #[default]
    Linear,
}

/// Value at `desired_tick` between a previous and a current raw sample.
///
/// When the current tick is not after the previous one the current value is used.
pub fn interpolate(
    desired_tick: f64,
    current_tick: f64,
    current_value: f64,
    last_tick: f64,
    last_value: f64,
    method: ResampleMethod,
) -> f64 {
    let ratio = if current_tick > last_tick {
        (desired_tick - last_tick) / (current_tick - last_tick)
    } else {
        1.0
    };
    match method {
        ResampleMethod::Nearest if ratio < 0.5 => last_value,
        ResampleMethod::Nearest => current_value,
        ResampleMethod::Linear => last_value + ratio * (current_value - last_value),
    }
}

/// Largest power-of-two number of points per cycle, at most
/// `2^(resolution + 1)`, whose spacing is no faster than the source rate.
pub fn samples_per_cycle(cycle_period: f64, resolution: u32, sample_rate: f64) -> Result<usize> {
    if !(cycle_period >= 2.0 / sample_rate) {
        return Err(WakeError::ResampleInfeasible {
            cycle_period,
            sample_rate,
        });
    }
    let mut samples = resolution
        .checked_add(1)
        .and_then(|shift| 1usize.checked_shl(shift))
        .ok_or_else(|| WakeError::InvalidConfig(format!("resolution {resolution} is too large")))?;
    while samples > 2 && cycle_period / (samples as f64) < 1.0 / sample_rate {
        samples /= 2;
    }
    Ok(samples)
}

/// One cycle period's fixed-interval view of the raw height stream.
#[derive(Debug, Clone)]
pub struct ResampleSeries {
    cycle_period: f64,
    samples_per_cycle: usize,
    resampling_period: f64,
    minimum_cycles: usize,
    levels: VecDeque<f64>,
    /// `None` until the first raw sample seeds the series
    due_tick: Option<f64>,
}

impl ResampleSeries {
    pub fn new(
        cycle_period: f64,
        resolution: u32,
        sample_rate: f64,
        minimum_cycles: usize,
    ) -> Result<Self> {
        let samples_per_cycle = samples_per_cycle(cycle_period, resolution, sample_rate)?;
        let keep = samples_per_cycle * minimum_cycles;
        Ok(ResampleSeries {
            cycle_period,
            samples_per_cycle,
            resampling_period: cycle_period / samples_per_cycle as f64,
            minimum_cycles,
            levels: VecDeque::with_capacity(keep * 2),
            due_tick: None,
        })
    }

    /// Feed one raw sample together with the raw sample before it.
    ///
    /// The first call only seeds the series with `value`; later calls append
    /// one resampled value for every resample tick strictly before `tick`.
    pub fn push(
        &mut self,
        tick: f64,
        value: f64,
        last_tick: f64,
        last_value: f64,
        method: ResampleMethod,
    ) {
        let Some(mut due) = self.due_tick else {
            self.levels.push_back(value);
            self.due_tick = Some(tick + self.resampling_period);
            return;
        };

        // after a gap only the newest `cap` values can survive the drain below
        let cap = self.retained() * 8;
        let missing = ((tick - due) / self.resampling_period).ceil();
        if missing > cap as f64 {
            due += (missing - cap as f64) * self.resampling_period;
        }

        while tick > due {
            self.levels.push_back(interpolate(
                due, tick, value, last_tick, last_value, method,
            ));
            due += self.resampling_period;
        }
        self.due_tick = Some(due);

        // evaluation normally trims; this bounds the buffer when it stalls
        if self.levels.len() > cap {
            let excess = self.levels.len() - cap;
            self.levels.drain(..excess);
        }
    }

    /// Samples kept after [`trim`](Self::trim).
    pub fn retained(&self) -> usize {
        self.samples_per_cycle * self.minimum_cycles
    }

    pub fn is_ready(&self) -> bool {
        self.levels.len() >= self.retained()
    }

    /// The newest samples tiled out to `buffer_size` points of whole cycles:
    /// the partial remainder of cycles first, then whole groups of
    /// `minimum_cycles` cycles. `None` until enough samples have been collected.
    pub fn tiled(&self, buffer_size: usize) -> Option<Vec<f64>> {
        if !self.is_ready() {
            return None;
        }
        let cycles = buffer_size / self.samples_per_cycle;
        let partial = (cycles % self.minimum_cycles) * self.samples_per_cycle;
        let full = cycles / self.minimum_cycles;

        let len = self.levels.len();
        let group = self.retained();
        let mut buffer = Vec::with_capacity(buffer_size);
        buffer.extend(self.levels.range(len - partial..));
        for _ in 0..full {
            buffer.extend(self.levels.range(len - group..));
        }
        Some(buffer)
    }

    /// Drop everything but the newest `samples_per_cycle * minimum_cycles` values.
    pub fn trim(&mut self) {
        let keep = self.retained();
        if self.levels.len() > keep {
            let excess = self.levels.len() - keep;
            self.levels.drain(..excess);
        }
    }

    pub fn cycle_period(&self) -> f64 {
        self.cycle_period
    }

    pub fn samples_per_cycle(&self) -> usize {
        self.samples_per_cycle
    }

    pub fn resampling_period(&self) -> f64 {
        self.resampling_period
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}
