//! # Text Reports
//!
//! Plain-text renderings of the summaries for the report sink and the
//! terminal. Every renderer returns a `String`; nothing here prints.
//!
//! Rows are a left-aligned label and a right-aligned value:
//! ```text
//! Waves                      412
//! Period (s)           1.02-2.40
//! ```

use crate::spectral::{BinKind, SpectralIdentifier};
use crate::stats::{Ohlc, RunningStats};
use crate::wake::{Span, WakeRecord, WakeSummary, WaveSummary};
use chrono::{Local, TimeZone};
use std::fmt::Write;

const LABEL_WIDTH: usize = 20;
const VALUE_WIDTH: usize = 10;
/// Widest bar in the spectrum chart
const BAR_WIDTH: usize = 40;

/// Local wall-clock time of a tick (seconds since the Unix epoch).
///
/// Ticks that do not map to a valid time are shown as plain seconds.
pub fn format_tick(tick: f64) -> String {
    if !tick.is_finite() {
        return format!("{tick}");
    }
    let secs = tick.floor();
    let nanos = ((tick - secs) * 1e9) as u32;
    match Local.timestamp_opt(secs as i64, nanos.min(999_999_999)).single() {
        Some(time) => time.format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
        None => format!("{tick:.3}"),
    }
}

fn row(text: &mut String, label: &str, value: impl std::fmt::Display) {
    // writing into a String cannot fail
    let _ = writeln!(
        text,
        "{:<lw$} {:>vw$}",
        label,
        value.to_string(),
        lw = LABEL_WIDTH,
        vw = VALUE_WIDTH
    );
}

fn span(span: Span, precision: usize) -> String {
    match (span.min, span.max) {
        (Some(min), Some(max)) => format!("{min:.precision$}-{max:.precision$}"),
        _ => "-".to_string(),
    }
}

fn optional(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.precision$}"))
}

pub fn render_wave_summary(summary: &WaveSummary) -> String {
    let mut text = format!("Waves since {}\n", format_tick(summary.start_tick()));
    row(&mut text, "Waves", summary.count());
    row(&mut text, "Period (s)", span(summary.period(), 2));
    row(&mut text, "Peak (in)", span(summary.peak(), 2));
    row(&mut text, "Power", span(summary.power(), 2));
    row(&mut text, "Avg period (s)", optional(summary.average_period(), 2));
    row(&mut text, "Avg peak (in)", optional(summary.average_peak(), 2));
    row(&mut text, "Avg power", optional(summary.average_power(), 2));
    row(&mut text, "Total power", format!("{:.1}", summary.total_power()));
    row(&mut text, "Noise threshold", format!("{:.2}", summary.noise_threshold()));
    text
}

pub fn render_wake_summary(summary: &WakeSummary) -> String {
    let mut text = format!("Wakes since {}\n", format_tick(summary.start_tick()));
    row(&mut text, "Wakes", summary.count());
    row(&mut text, "Coherent", summary.coherent());
    row(&mut text, "Crests", summary.crests());
    row(&mut text, "Most crests", summary.max_crests());
    row(&mut text, "Period (s)", span(summary.period(), 2));
    row(&mut text, "Avg period (s)", optional(summary.average_period(), 2));
    row(&mut text, "Wavelength (ft)", span(summary.wavelength(), 1));
    row(&mut text, "Distance (ft)", span(summary.distance(), 0));
    row(&mut text, "Avg distance (ft)", optional(summary.average_distance(), 0));
    row(&mut text, "Duration (s)", format!("{:.1}", summary.total_duration()));
    row(&mut text, "Energy", format!("{:.1}", summary.total_energy()));
    text
}

pub fn render_wake_record(record: &WakeRecord) -> String {
    let mut text = format!("Wake at {}\n", format_tick(record.start_tick));
    row(&mut text, "Crests", record.crests);
    row(&mut text, "Duration (s)", format!("{:.1}", record.duration));
    row(
        &mut text,
        "Period (s)",
        format!("{:.2}-{:.2}", record.first_period, record.last_period),
    );
    row(&mut text, "Wavelength (ft)", format!("{:.1}", record.wavelength));
    row(&mut text, "Distance (ft)", format!("{:.0}", record.distance));
    row(&mut text, "Lead time (s)", format!("{:.1}", record.lead_time));
    row(&mut text, "Energy", format!("{:.1}", record.total_power));
    row(&mut text, "Coherent", if record.coherent { "yes" } else { "no" });
    text
}

pub fn render_high_low(title: &str, range: Option<Ohlc>) -> String {
    let mut text = format!("{title}\n");
    match range {
        Some(r) => {
            row(&mut text, "Open (in)", format!("{:.2}", r.open));
            row(&mut text, "High (in)", format!("{:.2}", r.high));
            row(&mut text, "Low (in)", format!("{:.2}", r.low));
            row(&mut text, "Close (in)", format!("{:.2}", r.close));
        }
        None => row(&mut text, "No samples", "-"),
    }
    text
}

pub fn render_stats(title: &str, stats: &RunningStats) -> String {
    let mut text = format!("{title}\n");
    row(&mut text, "Samples", stats.count());
    if stats.count() > 0 {
        row(&mut text, "Mean", format!("{:.3}", stats.mean()));
        row(&mut text, "Std dev", format!("{:.3}", stats.std_dev()));
        row(&mut text, "CV (%)", format!("{:.1}", stats.coefficient_of_variation()));
    }
    text
}

/// Horizontal bar chart of the latest response of every bin, scaled to the
/// strongest one. Bins that have not been evaluated yet are left blank.
pub fn render_spectrum(bank: &SpectralIdentifier) -> String {
    let strongest = bank
        .bins()
        .iter()
        .filter_map(|b| b.response())
        .fold(0.0_f64, f64::max);
    let mut text = String::from("Spectrum\n");
    if let Some(first) = bank.dominant().first() {
        let _ = writeln!(text, "Dominant {:.2}s ({:.1})", first.period, first.response);
    }
    if let Some(boat) = bank.best_boat() {
        let _ = writeln!(text, "Best boat {:.0} ft ({:.2}s)", boat.length_ft, boat.period);
    }

    let mut last_kind = None;
    for bin in bank.bins() {
        let kind = matches!(bin.kind(), BinKind::BoatLength(_));
        if last_kind.is_some_and(|k| k != kind) {
            text.push('\n');
        }
        last_kind = Some(kind);

        let (bar, value) = match bin.response() {
            Some(r) if strongest > 0.0 => {
                let len = ((r / strongest) * BAR_WIDTH as f64).round() as usize;
                ("█".repeat(len), format!("{r:.1}"))
            }
            Some(r) => (String::new(), format!("{r:.1}")),
            None => (String::new(), String::new()),
        };
        let label = bin.to_string();
        let _ = writeln!(text, "{label:<15}│{bar:<width$} {value}", width = BAR_WIDTH);
    }
    text
}
