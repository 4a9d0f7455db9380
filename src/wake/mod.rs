//! # Wake Classification
//!
//! Groups consecutive [`WaveEvent`]s into boat-wake episodes.
//!
//! ## Event types
//! Each wave is first reduced to a [`WaveKind`]:
//! - **Wave**: power at or below the noise threshold, or period shorter than
//!   the minimum wake period
//! - **Wake**: above threshold, with no wake under consideration or with a
//!   period outside the tolerance band of the wake's first crest
//! - **CoherentWake**: above threshold and inside that band
//!
//! ## States
//! ```text
//!            Wake                     coherent count > minimum
//!   Idle ----------> Considering ----------------------------> InWake
//!    ^                    |  ^ Wake (restart)                    |
//!    |   cluster timer    |  '-----------------------------------' Wake (close, restart)
//!    '--------------------'----------------------------------------' cluster timer (close)
//! ```
//! Waves seen while considering or in a wake are held in a pending queue
//! until the episode resolves. Every event ends up in exactly one place: the
//! wave summary, or a wake record in the wake summary.
//!
//! A wake ends silently when no qualifying wave arrives before its cluster
//! timer (`cluster_multiplier` x the latest wake period) runs out.

mod accumulator;
mod summary;

pub use accumulator::{
    calculate_distance, lead_time, representative_period, WakeAccumulator, WakeRecord,
    MAX_WAKE_PERIOD,
};
pub use summary::{Span, WakeSummary, WaveSummary};

use crate::config::{SiteConfig, WakeConfig};
use crate::engine::Task;
use crate::scheduler::{Scheduler, TaskId};
use crate::sink::{Outputs, Severity};
use crate::wave::WaveEvent;
use std::fmt;

/// What a single wave means to the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaveKind {
    Wave,
    Wake,
    CoherentWake,
}

/// First crest of the episode under consideration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WakeBegin {
    pub tick: f64,
    pub period: f64,
    pub power: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Episode {
    pub begin: WakeBegin,
    /// Crests coherent with `begin`, counting `begin` itself
    pub coherent_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ClassifierState {
    #[default]
    Idle,
    Considering(Episode),
    InWake(Episode),
}

/// [`ClassifierState`] without its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Considering,
    InWake,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Idle => "idle",
            Phase::Considering => "considering",
            Phase::InWake => "in wake",
        })
    }
}

impl ClassifierState {
    pub fn phase(&self) -> Phase {
        match self {
            ClassifierState::Idle => Phase::Idle,
            ClassifierState::Considering(_) => Phase::Considering,
            ClassifierState::InWake(_) => Phase::InWake,
        }
    }

    pub fn episode(&self) -> Option<&Episode> {
        match self {
            ClassifierState::Idle => None,
            ClassifierState::Considering(e) | ClassifierState::InWake(e) => Some(e),
        }
    }
}

/// `sample` lies within `variance` of `target`, inclusive.
pub fn close_enough(sample: f64, target: f64, variance: f64) -> bool {
    sample >= target - variance && sample <= target + variance
}

#[derive(Debug)]
pub struct WakeClassifier {
    wave_variance: f64,
    minimum_wake_count: u32,
    minimum_wake_period: f64,
    cluster_multiplier: f64,
    state: ClassifierState,
    pending: Vec<WaveEvent>,
    timer: Option<TaskId>,
    accumulator: WakeAccumulator,
    waves: WaveSummary,
    wakes: WakeSummary,
    last_record: Option<WakeRecord>,
    events_seen: u64,
}

impl WakeClassifier {
    pub fn new(config: &WakeConfig, site: &SiteConfig) -> Self {
        WakeClassifier {
            wave_variance: config.wave_variance,
            minimum_wake_count: config.minimum_wake_count,
            minimum_wake_period: config.minimum_wake_period,
            cluster_multiplier: config.cluster_multiplier,
            state: ClassifierState::Idle,
            pending: Vec::new(),
            timer: None,
            accumulator: WakeAccumulator::new(
                site.gravity,
                config.wave_variance,
                config.max_distance_ft,
            ),
            waves: WaveSummary::new(config),
            wakes: WakeSummary::new(),
            last_record: None,
            events_seen: 0,
        }
    }

    pub fn classify(&self, event: &WaveEvent) -> WaveKind {
        if event.power <= self.waves.noise_threshold() || event.period < self.minimum_wake_period
        {
            return WaveKind::Wave;
        }
        match self.state.episode() {
            Some(episode)
                if close_enough(
                    event.period,
                    episode.begin.period,
                    self.wave_variance * episode.begin.period,
                ) =>
            {
                WaveKind::CoherentWake
            }
            _ => WaveKind::Wake,
        }
    }

    /// Dispose of one completed wave.
    pub fn update(&mut self, event: WaveEvent, timers: &mut Scheduler<Task>, out: &mut Outputs<'_>) {
        self.events_seen += 1;
        let kind = self.classify(&event);
        tracing::debug!(
            tick = event.tick,
            period = event.period,
            power = event.power,
            noise = self.waves.noise_threshold(),
            ?kind,
            phase = %self.state.phase(),
            "wave"
        );

        use ClassifierState::*;
        self.state = match (self.state, kind) {
            (Idle, WaveKind::Wave) => {
                self.pending.push(event);
                self.flush_to_waves(out);
                Idle
            }
            (Idle, WaveKind::Wake | WaveKind::CoherentWake) => self.begin(event, timers),
            (Considering(episode), WaveKind::Wave) => {
                self.pending.push(event);
                Considering(episode)
            }
            (Considering(_), WaveKind::Wake) => {
                self.flush_to_waves(out);
                self.begin(event, timers)
            }
            (Considering(episode), WaveKind::CoherentWake) => {
                let episode = Episode {
                    coherent_count: episode.coherent_count + 1,
                    ..episode
                };
                self.pending.push(event);
                self.arm_timer(&event, timers);
                if episode.coherent_count > self.minimum_wake_count {
                    self.flush_to_wake();
                    out.emit(
                        event.tick,
                        "wake",
                        &format!(
                            "wake started: period {:.2}s power {:.2}",
                            episode.begin.period, episode.begin.power
                        ),
                        Severity::Info,
                    );
                    InWake(episode)
                } else {
                    Considering(episode)
                }
            }
            (InWake(episode), WaveKind::Wave) => {
                self.pending.push(event);
                InWake(episode)
            }
            (InWake(_), WaveKind::Wake) => {
                self.flush_to_wake();
                self.close_wake(event.tick, out);
                self.begin(event, timers)
            }
            (InWake(episode), WaveKind::CoherentWake) => {
                self.pending.push(event);
                self.flush_to_wake();
                self.arm_timer(&event, timers);
                InWake(Episode {
                    coherent_count: episode.coherent_count + 1,
                    ..episode
                })
            }
        };
    }

    /// Cluster timer expiry: close any wake in progress, release held waves
    /// to the wave summary and go idle.
    pub fn cleanup(&mut self, tick: f64, out: &mut Outputs<'_>) {
        self.timer = None;
        if self.state.phase() == Phase::InWake {
            self.close_wake(tick, out);
        }
        self.flush_to_waves(out);
        self.accumulator.reset();
        self.state = ClassifierState::Idle;
    }

    fn begin(&mut self, event: WaveEvent, timers: &mut Scheduler<Task>) -> ClassifierState {
        self.accumulator.reset();
        self.pending.push(event);
        self.arm_timer(&event, timers);
        ClassifierState::Considering(Episode {
            begin: WakeBegin {
                tick: event.tick,
                period: event.period,
                power: event.power,
            },
            coherent_count: 1,
        })
    }

    fn arm_timer(&mut self, event: &WaveEvent, timers: &mut Scheduler<Task>) {
        if let Some(id) = self.timer.take() {
            timers.unschedule(id);
        }
        let delay = self.cluster_multiplier * event.period;
        self.timer = Some(timers.schedule(Task::ClusterEnd, event.tick, 0.0, delay));
    }

    fn flush_to_waves(&mut self, out: &mut Outputs<'_>) {
        for event in self.pending.drain(..) {
            self.waves.update(&event, out);
        }
    }

    fn flush_to_wake(&mut self) {
        for event in self.pending.drain(..) {
            self.accumulator.update(&event);
        }
    }

    fn close_wake(&mut self, tick: f64, out: &mut Outputs<'_>) {
        let Some(record) = self.accumulator.close() else {
            return;
        };
        out.emit(
            tick,
            "wake",
            &format!(
                "wake ended: {} crests over {:.1}s, period {:.2}s, wavelength {:.1} ft, distance {:.0} ft{}",
                record.crests,
                record.duration,
                record.representative_period,
                record.wavelength,
                record.distance,
                if record.coherent { "" } else { " (incoherent)" }
            ),
            Severity::Info,
        );
        self.wakes.update(&record, out);
        self.last_record = Some(record);
    }

    /// Start a new reporting period for both summaries.
    pub fn reset_summaries(&mut self, tick: f64) {
        self.waves.reset(tick);
        self.wakes.reset(tick);
    }

    pub fn state(&self) -> &ClassifierState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    /// Id of the pending cluster timer.
    pub fn timer(&self) -> Option<TaskId> {
        self.timer
    }

    pub fn pending(&self) -> &[WaveEvent] {
        &self.pending
    }

    pub fn accumulator(&self) -> &WakeAccumulator {
        &self.accumulator
    }

    pub fn wave_summary(&self) -> &WaveSummary {
        &self.waves
    }

    pub fn wake_summary(&self) -> &WakeSummary {
        &self.wakes
    }

    pub fn noise_threshold(&self) -> f64 {
        self.waves.noise_threshold()
    }

    /// Most recently closed wake.
    pub fn last_record(&self) -> Option<&WakeRecord> {
        self.last_record.as_ref()
    }

    pub fn events_seen(&self) -> u64 {
        self.events_seen
    }
}
