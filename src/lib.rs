//! # Wake Watch Core Library
//!
//! Real-time wave and boat-wake classification from a single water-level
//! sensor. Everything runs on one thread in logical time: the caller feeds
//! one [`Sample`] per loop iteration and the [`engine::Engine`] does the rest.
//!
//! ## Pipeline
//!
//! ```text
//! level ──► level::LevelConditioner ──► wave::WaveExtractor ──► wake::WakeClassifier
//!                     │                                              │
//!                     └──────────► spectral::SpectralIdentifier      │
//!                                              │                     │
//!                     scheduler::Scheduler ◄───┴─────────────────────┘
//!                     (cluster timers, evaluation, reports)
//! ```
//!
//! - **Waves** are delimited by zero crossings of the wave height.
//! - **Wakes** are runs of waves whose period stays within a tolerance of the
//!   first crest. A wake ends when its cluster timer runs out or an
//!   incoherent wave arrives.
//! - **Spectra** come from a bank of narrowband filters, one per candidate
//!   boat length or wave period, each a resampler feeding a single DFT bin.
//!
//! Output goes through the [`sink::ReportSink`] and [`sink::MetricsSink`]
//! traits; the library never prints.

use serde::{Deserialize, Serialize};

pub mod config;
pub mod engine;
pub mod error;
pub mod level;
pub mod logging;
pub mod report;
pub mod scheduler;
pub mod sink;
pub mod spectral;
pub mod stats;
pub mod synthetic;
pub mod wake;
pub mod wave;

/// One reading from the acquisition side.
///
/// `tick` is in seconds (Unix time for live data) and `height` in inches.
/// Depending on the entry point the height is either a raw water level
/// ([`engine::Engine::ingest_level`]) or an already-conditioned wave height
/// ([`engine::Engine::process`]).
///
/// # Example
/// ```
/// use wake_watch_lib::config::Config;
/// use wake_watch_lib::engine::Engine;
/// use wake_watch_lib::sink::NullSink;
/// use wake_watch_lib::Sample;
///
/// let mut engine = Engine::new(&Config::default(), NullSink, NullSink).unwrap();
/// engine.ingest_level(Sample { tick: 0.0, height: 36.2 });
/// engine.ingest_level(Sample { tick: 1.0 / 30.0, height: 36.3 });
/// assert_eq!(engine.samples(), 2);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Seconds
    pub tick: f64,
    /// Inches
    pub height: f64,
}
