//! # Detection Engine
//!
//! Owns every detector and the scheduler, and runs one driving-loop step per
//! sample:
//!
//! 1. the wave extractor sees the height; a completed wave goes straight to
//!    the wake classifier
//! 2. the spectral bank resamples the raw height
//! 3. the scheduler runs whatever has come due: cluster-end timers, spectral
//!    evaluation, the minute level update and the periodic reports
//!
//! A wave and a cluster-end timer at the same tick therefore never race; the
//! wave is always classified first.

use crate::config::Config;
use crate::error::Result;
use crate::level::{Conditioned, LevelConditioner, LevelTracker};
use crate::report;
use crate::scheduler::Scheduler;
use crate::sink::{MetricsSink, Outputs, ReportSink, Severity};
use crate::spectral::SpectralIdentifier;
use crate::stats::RunningStats;
use crate::wake::WakeClassifier;
use crate::wave::{WaterBody, WaveExtractor};
use crate::Sample;

/// Seconds between level tracker updates.
pub const LEVEL_INTERVAL: f64 = 60.0;

/// Work the engine's scheduler can be asked to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// Cluster timer of the wake under consideration ran out
    ClusterEnd,
    EvaluateSpectra,
    LevelMinute,
    SummaryReport,
    DailyReport,
}

pub struct Engine<R: ReportSink, M: MetricsSink> {
    extractor: WaveExtractor,
    classifier: WakeClassifier,
    spectral: SpectralIdentifier,
    conditioner: LevelConditioner,
    tracker: LevelTracker,
    peak_stats: RunningStats,
    power_stats: RunningStats,
    scheduler: Scheduler<Task>,
    evaluate_interval: f64,
    summary_interval: f64,
    daily_interval: f64,
    last_tick: Option<f64>,
    samples: u64,
    skipped: u64,
    report: R,
    metrics: M,
}

impl<R: ReportSink, M: MetricsSink> Engine<R, M> {
    /// Build every detector. Fails on invalid configuration or an infeasible
    /// spectral bin.
    pub fn new(config: &Config, report: R, metrics: M) -> Result<Self> {
        config.validate()?;
        let spectral = SpectralIdentifier::new(&config.spectral, &config.site)?;
        tracing::info!(
            sample_rate = config.site.sample_rate,
            depth_ft = config.site.depth_ft,
            bins = spectral.bins().len(),
            "engine ready"
        );

        Ok(Engine {
            extractor: WaveExtractor::new(WaterBody::from(&config.site)),
            classifier: WakeClassifier::new(&config.wake, &config.site),
            spectral,
            conditioner: LevelConditioner::new(&config.level),
            tracker: LevelTracker::new(&config.level),
            peak_stats: RunningStats::new(config.level.stats_span),
            power_stats: RunningStats::new(config.level.stats_span),
            scheduler: Scheduler::new(),
            evaluate_interval: config.spectral.evaluate_interval,
            summary_interval: config.report.summary_interval,
            daily_interval: config.report.daily_interval,
            last_tick: None,
            samples: 0,
            skipped: 0,
            report,
            metrics,
        })
    }

    /// Feed one wave height that needs no further conditioning.
    ///
    /// Returns `false` when the sample was skipped.
    pub fn process(&mut self, sample: Sample) -> bool {
        if !self.accept(&sample) {
            return false;
        }
        self.step(sample.tick, sample.height, sample.height);
        true
    }

    /// Feed one raw water level. The smoothed wave height drives the wave
    /// extractor; the unsmoothed one drives the spectral bank.
    pub fn ingest_level(&mut self, sample: Sample) -> Option<Conditioned> {
        if !self.accept(&sample) {
            return None;
        }
        let conditioned = {
            let mut out = Outputs::new(&mut self.report, &mut self.metrics);
            self.conditioner.condition(sample.tick, sample.height, &mut out)
        };
        self.step(sample.tick, conditioned.filtered, conditioned.wave_height);
        Some(conditioned)
    }

    fn accept(&mut self, sample: &Sample) -> bool {
        if sample.tick.is_finite() && sample.height.is_finite() {
            return true;
        }
        self.skipped += 1;
        tracing::debug!(tick = sample.tick, height = sample.height, "non-finite sample");
        if sample.tick.is_finite() {
            self.report.emit(
                sample.tick,
                "input",
                &format!("skipped non-finite height {}", sample.height),
                Severity::Warn,
            );
        }
        false
    }

    fn start(&mut self, tick: f64) {
        self.scheduler
            .schedule(Task::EvaluateSpectra, tick, self.evaluate_interval, 0.0);
        self.scheduler
            .schedule(Task::LevelMinute, tick, LEVEL_INTERVAL, 0.0);
        self.scheduler
            .schedule(Task::SummaryReport, tick, self.summary_interval, 0.0);
        self.scheduler
            .schedule(Task::DailyReport, tick, self.daily_interval, 0.0);
        self.classifier.reset_summaries(tick);
        tracing::debug!(tick, "periodic tasks scheduled");
    }

    fn step(&mut self, tick: f64, wave_height: f64, raw_height: f64) {
        if self.last_tick.is_none() {
            self.start(tick);
        }
        self.last_tick = Some(tick);
        self.samples += 1;

        let Engine {
            extractor,
            classifier,
            spectral,
            conditioner,
            tracker,
            peak_stats,
            power_stats,
            scheduler,
            report,
            metrics,
            ..
        } = self;
        let mut out = Outputs::new(report, metrics);

        if let Some(event) = extractor.update(tick, wave_height) {
            peak_stats.update(event.peak_to_peak);
            power_stats.update(event.power);
            classifier.update(event, scheduler, &mut out);
        }
        spectral.push(tick, raw_height);

        scheduler.execute(tick, |task, tick| match task {
            Task::ClusterEnd => classifier.cleanup(tick, &mut out),
            Task::EvaluateSpectra => {
                spectral.evaluate(tick, &mut out);
            }
            Task::LevelMinute => {
                if let Some(level) = conditioner.long_level() {
                    tracker.minute(tick, level, &mut out);
                }
            }
            Task::SummaryReport => {
                summary_report(tick, classifier, tracker, peak_stats, power_stats, &mut out)
            }
            Task::DailyReport => {
                out.emit(
                    tick,
                    "daily",
                    &report::render_high_low("Daily level", tracker.daily()),
                    Severity::Info,
                );
                tracker.reset_daily();
            }
        });
    }

    /// End of input: close a wake still waiting on its cluster timer so every
    /// wave is accounted for.
    pub fn finish(&mut self) {
        let Some(tick) = self.last_tick else {
            return;
        };
        if let Some(id) = self.classifier.timer() {
            self.scheduler.unschedule(id);
            let mut out = Outputs::new(&mut self.report, &mut self.metrics);
            self.classifier.cleanup(tick, &mut out);
        }
    }

    pub fn classifier(&self) -> &WakeClassifier {
        &self.classifier
    }

    pub fn spectral(&self) -> &SpectralIdentifier {
        &self.spectral
    }

    pub fn conditioner(&self) -> &LevelConditioner {
        &self.conditioner
    }

    pub fn tracker(&self) -> &LevelTracker {
        &self.tracker
    }

    pub fn scheduler(&self) -> &Scheduler<Task> {
        &self.scheduler
    }

    /// Running statistics of wave peak-to-peak heights since the last summary.
    pub fn peak_stats(&self) -> &RunningStats {
        &self.peak_stats
    }

    pub fn power_stats(&self) -> &RunningStats {
        &self.power_stats
    }

    pub fn last_tick(&self) -> Option<f64> {
        self.last_tick
    }

    /// Samples that reached the detectors.
    pub fn samples(&self) -> u64 {
        self.samples
    }

    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    pub fn report_sink(&self) -> &R {
        &self.report
    }

    pub fn metrics_sink(&self) -> &M {
        &self.metrics
    }

    pub fn metrics_sink_mut(&mut self) -> &mut M {
        &mut self.metrics
    }

    pub fn into_sinks(self) -> (R, M) {
        (self.report, self.metrics)
    }
}

fn summary_report(
    tick: f64,
    classifier: &mut WakeClassifier,
    tracker: &mut LevelTracker,
    peak_stats: &mut RunningStats,
    power_stats: &mut RunningStats,
    out: &mut Outputs<'_>,
) {
    let sections = [
        report::render_wave_summary(classifier.wave_summary()),
        report::render_wake_summary(classifier.wake_summary()),
        report::render_high_low("Hourly level", tracker.hourly()),
        report::render_stats("Wave peak (in)", peak_stats),
        report::render_stats("Wave power", power_stats),
    ];
    for section in &sections {
        out.emit(tick, "summary", section, Severity::Info);
    }
    if peak_stats.count() > 0 {
        out.record(tick, "waveStats", "peakMean", peak_stats.mean());
        out.record(tick, "waveStats", "peakStdDev", peak_stats.std_dev());
        out.record(tick, "waveStats", "powerMean", power_stats.mean());
        out.record(tick, "waveStats", "powerCV", power_stats.coefficient_of_variation());
    }

    classifier.reset_summaries(tick);
    tracker.reset_hourly(tick);
    peak_stats.reset();
    power_stats.reset();
}
