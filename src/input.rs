//! # Sample Input
//!
//! Reads `tick,level` lines. Blank lines and lines starting with `#` are
//! skipped silently; anything else that does not parse is logged and
//! skipped so one bad line never stops a long capture.

use anyhow::{bail, Context};
use std::io::BufRead;
use wake_watch_lib::Sample;

/// Parse one line. `Ok(None)` for blank and comment lines.
pub fn parse_line(line: &str) -> anyhow::Result<Option<Sample>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let mut fields = line.split(',').map(str::trim);
    let (Some(tick), Some(level), None) = (fields.next(), fields.next(), fields.next()) else {
        bail!("expected two comma-separated fields");
    };
    let tick: f64 = tick.parse().with_context(|| format!("bad tick {tick:?}"))?;
    let height: f64 = level.parse().with_context(|| format!("bad level {level:?}"))?;
    Ok(Some(Sample { tick, height }))
}

/// Iterator over the samples of a CSV stream.
pub struct CsvSamples<R: BufRead> {
    reader: R,
    line: String,
    line_number: u64,
    rejected: u64,
}

impl<R: BufRead> CsvSamples<R> {
    pub fn new(reader: R) -> Self {
        CsvSamples {
            reader,
            line: String::new(),
            line_number: 0,
            rejected: 0,
        }
    }

    /// Lines that were neither samples, blank nor comments.
    pub fn rejected(&self) -> u64 {
        self.rejected
    }
}

impl<R: BufRead> Iterator for CsvSamples<R> {
    type Item = Sample;

    fn next(&mut self) -> Option<Sample> {
        loop {
            self.line.clear();
            match self.reader.read_line(&mut self.line) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => {
                    tracing::error!(line = self.line_number + 1, error = %e, "input read failed");
                    return None;
                }
            }
            self.line_number += 1;

            match parse_line(&self.line) {
                Ok(Some(sample)) => return Some(sample),
                Ok(None) => {}
                Err(e) => {
                    self.rejected += 1;
                    let reason = format!("{e:#}");
                    tracing::warn!(line = self.line_number, error = %reason, "skipping malformed input");
                }
            }
        }
    }
}
