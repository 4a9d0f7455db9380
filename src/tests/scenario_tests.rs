//! End-to-end behaviour of the classifier and the engine.

use wake_watch_lib::config::{Config, SiteConfig, WakeConfig};
use wake_watch_lib::engine::{Engine, Task};
use wake_watch_lib::scheduler::Scheduler;
use wake_watch_lib::sink::{NullSink, Outputs, Recorder};
use wake_watch_lib::synthetic::{LevelGenerator, SyntheticConfig};
use wake_watch_lib::wake::{Phase, WakeClassifier};
use wake_watch_lib::wave::WaveEvent;

fn wave(tick: f64, period: f64, power: f64) -> WaveEvent {
    WaveEvent {
        tick,
        period,
        peak_to_peak: 1.0,
        power,
        balance: 0.0,
    }
}

/// Drive the classifier the way the engine does: event first, then timers.
fn feed(
    classifier: &mut WakeClassifier,
    timers: &mut Scheduler<Task>,
    report: &mut Recorder,
    event: WaveEvent,
) {
    let mut metrics = NullSink;
    let mut out = Outputs::new(report, &mut metrics);
    classifier.update(event, timers, &mut out);
    timers.execute(event.tick, |task, tick| {
        if let Task::ClusterEnd = task {
            classifier.cleanup(tick, &mut out);
        }
    });
}

/// Calm water, one short wake, then an incoherent wave.
///
/// Five quiet waves go to the wave summary, the 2.1 s crest opens a wake,
/// the 2.0 s crest confirms it and the 1.4 s crest closes it and starts
/// considering a new one.
#[test]
fn calm_then_wake_then_incoherent_wave() {
    let mut classifier = WakeClassifier::new(&WakeConfig::default(), &SiteConfig::default());
    let mut timers = Scheduler::new();
    let mut report = Recorder::new();

    for t in 1..=5 {
        feed(&mut classifier, &mut timers, &mut report, wave(t as f64, 1.0, 0.5));
    }
    assert_eq!(classifier.wave_summary().count(), 5);
    assert_eq!(classifier.phase(), Phase::Idle);

    feed(&mut classifier, &mut timers, &mut report, wave(6.0, 2.1, 21.4));
    assert_eq!(classifier.phase(), Phase::Considering);
    let timer = classifier.timer().unwrap();
    assert!((timers.due(timer).unwrap() - 10.2).abs() < 1e-9);

    feed(&mut classifier, &mut timers, &mut report, wave(8.1, 2.0, 23.0));
    assert_eq!(classifier.phase(), Phase::InWake);
    assert!(!timers.is_scheduled(timer));

    feed(&mut classifier, &mut timers, &mut report, wave(10.1, 1.4, 7.7));
    assert_eq!(classifier.phase(), Phase::Considering);
    assert_eq!(classifier.wave_summary().count(), 5);
    assert_eq!(classifier.wake_summary().count(), 1);
    let record = classifier.last_record().unwrap();
    assert_eq!(record.crests, 2);
    assert_eq!(record.start_tick, 6.0);
    let begin = classifier.state().episode().unwrap().begin;
    assert_eq!(begin.period, 1.4);
    assert_eq!(begin.tick, 10.1);
    assert_eq!(timers.len(), 1);

    // nothing else arrives: the new consideration times out back to waves
    feed(&mut classifier, &mut timers, &mut report, wave(20.0, 1.0, 0.0));
    assert_eq!(classifier.phase(), Phase::Idle);
    assert_eq!(classifier.wave_summary().count(), 7);
    assert!(timers.is_empty());

    let wake_reports: Vec<_> = report.reports_on("wake").collect();
    assert_eq!(wake_reports.len(), 2);
    assert!(wake_reports[0].message.starts_with("wake started"));
    assert!(wake_reports[1].message.starts_with("wake ended: 2 crests"));
}

/// A longer minimum wake count needs more coherent crests before promotion.
#[test]
fn promotion_waits_for_minimum_wake_count() {
    let config = WakeConfig {
        minimum_wake_count: 3,
        ..WakeConfig::default()
    };
    let mut classifier = WakeClassifier::new(&config, &SiteConfig::default());
    let mut timers = Scheduler::new();
    let mut report = Recorder::new();

    let crests = [(1.0, 2.0), (3.0, 2.05), (5.0, 1.95), (7.0, 2.1)];
    for (i, &(tick, period)) in crests.iter().enumerate() {
        feed(&mut classifier, &mut timers, &mut report, wave(tick, period, 30.0));
        let expected = if i < 3 { Phase::Considering } else { Phase::InWake };
        assert_eq!(classifier.phase(), expected, "after crest {}", i + 1);
    }
    assert_eq!(classifier.accumulator().crest_count(), 4);
}

fn synthetic_run(seconds: f64) -> Engine<Recorder, Recorder> {
    let mut engine = Engine::new(&Config::default(), Recorder::new(), Recorder::new()).unwrap();
    for sample in LevelGenerator::new(SyntheticConfig::default()).take_seconds(seconds) {
        engine.ingest_level(sample);
    }
    engine.finish();
    engine
}

/// Every extracted wave ends up in exactly one summary.
///
/// Runs long enough for two synthetic wake trains, then closes whatever is
/// still open and checks the books balance.
#[test]
fn synthetic_stream_accounts_for_every_wave() {
    let engine = synthetic_run(400.0);
    let classifier = engine.classifier();

    assert_eq!(classifier.phase(), Phase::Idle);
    assert!(classifier.pending().is_empty());
    assert!(classifier.events_seen() > 100);
    assert_eq!(
        classifier.wave_summary().count() + classifier.wake_summary().crests(),
        classifier.events_seen()
    );

    let wakes = classifier.wake_summary().count();
    assert!(wakes >= 2, "expected both wake trains, found {wakes}");
    let (_, metrics) = engine.into_sinks();
    assert_eq!(metrics.values("wake", "crests").len() as u64, wakes);
}

/// The scheduled side of the engine runs alongside detection.
#[test]
fn synthetic_stream_drives_periodic_tasks() {
    let engine = synthetic_run(400.0);

    assert!(engine.spectral().evaluations() > 1000);
    assert!(engine.spectral().dominant().first().is_some());
    assert!(engine.spectral().best_boat().is_some());

    assert!(engine.tracker().hourly().is_some());
    let (report, metrics) = engine.into_sinks();
    assert_eq!(metrics.values("waterLevel", "level").len(), 6);
    assert!(!metrics.values("dominant", "period").is_empty());

    // troughs of the wake trains dip under the low trap; calm water never does
    let traps: Vec<f64> = report.reports_on("trap").map(|r| r.tick).collect();
    assert!(!traps.is_empty());
    let in_train = |t: f64| (60.0..90.0).contains(&t) || (360.0..390.0).contains(&t);
    assert!(traps.iter().all(|&t| in_train(t)), "trap outside a wake train: {traps:?}");
}
