//! # Running Statistics
//!
//! Small constant-memory accumulators used by every detector:
//!
//! - [`Average`]: IIR moving average seeded by its first value
//! - [`RunningStats`]: fixed-span online mean, deviation and coefficient of variation
//! - [`HighLow`]: open/high/low/close register, reset explicitly
//! - [`Watch`]: min/max/average with a hysteresis trend and reversal runs
//! - [`RateTrigger`]: rapid rise/fall detector over a sample count
//! - [`Trap`]: debounced out-of-range detector
//!
//! None of these produce output themselves. They return what happened and the
//! caller decides what to report.

mod average;
mod highlow;
mod running;
mod trap;
mod watch;

pub use average::Average;
pub use highlow::{HighLow, Ohlc};
pub use running::RunningStats;
pub use trap::{Trap, TrapHit};
pub use watch::{RapidChange, RateTrigger, Reversal, Trend, Watch, WatchUpdate};
