//! # Wake Watch Application Entry Point
//!
//! Feeds a water-level stream through the detection engine. Samples come
//! from a `tick,level` CSV file, standard input or the built-in synthetic
//! generator; reports go to the log and metrics optionally to a JSON-lines
//! file.
//!
//! ```text
//! wake-watch [--config PATH] [--input FILE|-] [--synthetic SECONDS]
//!            [--realtime] [--metrics FILE] [--stdout]
//! ```

// Test modules
#[cfg(test)]
mod tests;

mod input;

use anyhow::{bail, Context};
use std::env;
use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::time::Duration;
use wake_watch_lib::config::{Config, CONFIG_FILE};
use wake_watch_lib::engine::Engine;
use wake_watch_lib::logging::init_logging;
use wake_watch_lib::report;
use wake_watch_lib::sink::{JsonLinesMetrics, MetricsSink, NullSink, ReportSink, TracingReportSink};
use wake_watch_lib::synthetic::{LevelGenerator, SyntheticConfig};
use wake_watch_lib::Sample;

const USAGE: &str = "\
usage: wake-watch [--config PATH] [--input FILE|-] [--synthetic SECONDS]
                  [--realtime] [--metrics FILE] [--stdout]

  --config PATH        configuration file (default: ./wake-config.toml if present)
  --input FILE|-       read tick,level CSV from FILE or standard input (default: -)
  --synthetic SECONDS  generate SECONDS of synthetic water level instead
  --realtime           pace samples at the configured sample rate
  --metrics FILE       write metric points as JSON lines to FILE
  --stdout             print the final summaries and spectrum";

/// Where samples come from.
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    Stdin,
    File(PathBuf),
    Synthetic(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Args {
    pub config: Option<PathBuf>,
    pub source: Source,
    pub realtime: bool,
    pub metrics: Option<PathBuf>,
    pub stdout: bool,
    pub help: bool,
}

impl Default for Args {
    fn default() -> Self {
        Args {
            config: None,
            source: Source::Stdin,
            realtime: false,
            metrics: None,
            stdout: false,
            help: false,
        }
    }
}

impl Args {
    /// Parse everything after the program name.
    pub fn parse<I: IntoIterator<Item = String>>(args: I) -> anyhow::Result<Self> {
        let mut parsed = Args::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            let mut value = |flag: &str| {
                args.next()
                    .with_context(|| format!("{flag} needs a value"))
            };
            match arg.as_str() {
                "--config" => parsed.config = Some(value("--config")?.into()),
                "--input" => {
                    let input = value("--input")?;
                    parsed.source = if input == "-" {
                        Source::Stdin
                    } else {
                        Source::File(input.into())
                    };
                }
                "--synthetic" => {
                    let raw = value("--synthetic")?;
                    let seconds: f64 = raw
                        .parse()
                        .with_context(|| format!("--synthetic expects seconds, got {raw:?}"))?;
                    if !(seconds > 0.0) {
                        bail!("--synthetic needs a positive duration");
                    }
                    parsed.source = Source::Synthetic(seconds);
                }
                "--metrics" => parsed.metrics = Some(value("--metrics")?.into()),
                "--realtime" => parsed.realtime = true,
                "--stdout" => parsed.stdout = true,
                "-h" | "--help" => parsed.help = true,
                other => bail!("unknown argument {other:?}\n{USAGE}"),
            }
        }
        Ok(parsed)
    }
}

/// Explicit path: must load. Otherwise the default file if present, else defaults.
fn load_config(path: Option<&Path>) -> anyhow::Result<(Config, String)> {
    match path {
        Some(path) => {
            let config = Config::try_load_from_path(path)
                .with_context(|| format!("loading {}", path.display()))?;
            Ok((config, path.display().to_string()))
        }
        None if Path::new(CONFIG_FILE).exists() => {
            let config = Config::try_load_from_path(CONFIG_FILE)
                .with_context(|| format!("loading {CONFIG_FILE}"))?;
            Ok((config, CONFIG_FILE.to_string()))
        }
        None => Ok((Config::default(), "defaults".to_string())),
    }
}

fn metrics_sink(path: Option<&Path>) -> anyhow::Result<Box<dyn MetricsSink>> {
    Ok(match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("creating metrics file {}", path.display()))?;
            Box::new(JsonLinesMetrics::new(BufWriter::new(file)))
        }
        None => Box::new(NullSink),
    })
}

/// Feed every sample, optionally one per `pace`.
async fn drive<R, M, I>(engine: &mut Engine<R, M>, samples: I, pace: Option<Duration>)
where
    R: ReportSink,
    M: MetricsSink,
    I: Iterator<Item = Sample>,
{
    let mut interval = pace.map(tokio::time::interval);
    for sample in samples {
        if let Some(interval) = interval.as_mut() {
            interval.tick().await;
        }
        engine.ingest_level(sample);
    }
    engine.finish();
}

fn print_summaries<R: ReportSink, M: MetricsSink>(engine: &Engine<R, M>) {
    let classifier = engine.classifier();
    println!("{}", report::render_wave_summary(classifier.wave_summary()));
    println!("{}", report::render_wake_summary(classifier.wake_summary()));
    if let Some(record) = classifier.last_record() {
        println!("{}", report::render_wake_record(record));
    }
    println!("{}", report::render_high_low("Hourly level", engine.tracker().hourly()));
    println!("{}", report::render_high_low("Daily level", engine.tracker().daily()));
    println!("{}", report::render_stats("Wave peak (in)", engine.peak_stats()));
    println!("{}", report::render_spectrum(engine.spectral()));
}

/// Main application entry point.
fn main() -> anyhow::Result<()> {
    let args = Args::parse(env::args().skip(1))?;
    if args.help {
        println!("{USAGE}");
        return Ok(());
    }

    let (config, config_source) = load_config(args.config.as_deref())?;
    init_logging(&config.logging);
    tracing::info!(config = %config_source, "starting wake-watch");

    let metrics = metrics_sink(args.metrics.as_deref())?;
    let mut engine = Engine::new(&config, TracingReportSink, metrics)
        .context("building detection engine")?;
    let pace = args
        .realtime
        .then(|| Duration::from_secs_f64(1.0 / config.site.sample_rate));

    // Single-threaded runtime: the engine is not shared
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;

    match &args.source {
        Source::Synthetic(seconds) => {
            let synthetic = SyntheticConfig {
                sample_rate: config.site.sample_rate,
                ..SyntheticConfig::starting_at(None)
            };
            tracing::info!(seconds, "generating synthetic water level");
            let samples = LevelGenerator::new(synthetic).take_seconds(*seconds);
            rt.block_on(drive(&mut engine, samples, pace));
        }
        Source::File(path) => {
            let file =
                File::open(path).with_context(|| format!("opening input {}", path.display()))?;
            let mut samples = input::CsvSamples::new(BufReader::new(file));
            rt.block_on(drive(&mut engine, &mut samples, pace));
            if samples.rejected() > 0 {
                tracing::warn!(rejected = samples.rejected(), "malformed input lines skipped");
            }
        }
        Source::Stdin => {
            let stdin = io::stdin();
            let mut samples = input::CsvSamples::new(stdin.lock());
            rt.block_on(drive(&mut engine, &mut samples, pace));
            if samples.rejected() > 0 {
                tracing::warn!(rejected = samples.rejected(), "malformed input lines skipped");
            }
        }
    }

    tracing::info!(
        samples = engine.samples(),
        skipped = engine.skipped(),
        waves = engine.classifier().wave_summary().count(),
        wakes = engine.classifier().wake_summary().count(),
        evaluations = engine.spectral().evaluations(),
        "input finished"
    );
    if args.stdout {
        print_summaries(&engine);
    }

    engine
        .metrics_sink_mut()
        .flush()
        .context("flushing metrics")?;
    Ok(())
}
