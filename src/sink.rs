//! # Output Sinks
//!
//! The detectors never print. Human-readable events go to a [`ReportSink`],
//! numeric time series to a [`MetricsSink`]. Both are borrowed for the
//! duration of one call through [`Outputs`], so a detector only needs a
//! `&mut Outputs` argument to report.
//!
//! ## Implementations
//! - [`TracingReportSink`]: forwards reports to `tracing`
//! - [`JsonLinesMetrics`]: one JSON object per line on any writer
//! - [`NullSink`]: discards everything
//! - [`Recorder`]: keeps everything in memory for inspection

use serde::{Deserialize, Serialize};
use std::io::Write;

/// How loudly a report should be surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Debug,
    Info,
    Warn,
}

/// Destination for human-readable classification and trend events.
pub trait ReportSink {
    fn emit(&mut self, tick: f64, topic: &str, message: &str, severity: Severity);
}

/// Destination for numeric time series.
pub trait MetricsSink {
    fn record(&mut self, tick: f64, measurement: &str, field: &str, value: f64);

    fn record_tagged(
        &mut self,
        tick: f64,
        measurement: &str,
        tag_name: &str,
        tag_value: &str,
        field: &str,
        value: f64,
    );

    /// Push buffered points to their destination.
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<S: ReportSink + ?Sized> ReportSink for Box<S> {
    fn emit(&mut self, tick: f64, topic: &str, message: &str, severity: Severity) {
        (**self).emit(tick, topic, message, severity)
    }
}

impl<S: MetricsSink + ?Sized> MetricsSink for Box<S> {
    fn record(&mut self, tick: f64, measurement: &str, field: &str, value: f64) {
        (**self).record(tick, measurement, field, value)
    }

    fn record_tagged(
        &mut self,
        tick: f64,
        measurement: &str,
        tag_name: &str,
        tag_value: &str,
        field: &str,
        value: f64,
    ) {
        (**self).record_tagged(tick, measurement, tag_name, tag_value, field, value)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        (**self).flush()
    }
}

/// Both sinks, borrowed for one call.
pub struct Outputs<'a> {
    pub report: &'a mut dyn ReportSink,
    pub metrics: &'a mut dyn MetricsSink,
}

impl<'a> Outputs<'a> {
    pub fn new(report: &'a mut dyn ReportSink, metrics: &'a mut dyn MetricsSink) -> Self {
        Outputs { report, metrics }
    }

    pub fn emit(&mut self, tick: f64, topic: &str, message: &str, severity: Severity) {
        self.report.emit(tick, topic, message, severity);
    }

    pub fn record(&mut self, tick: f64, measurement: &str, field: &str, value: f64) {
        self.metrics.record(tick, measurement, field, value);
    }

    pub fn record_tagged(
        &mut self,
        tick: f64,
        measurement: &str,
        tag: (&str, &str),
        field: &str,
        value: f64,
    ) {
        self.metrics
            .record_tagged(tick, measurement, tag.0, tag.1, field, value);
    }
}

/// A tag attached to a metric point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub value: String,
}

/// One numeric observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricPoint {
    pub tick: f64,
    pub measurement: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<Tag>,
    pub field: String,
    pub value: f64,
}

/// Sends reports to the installed `tracing` subscriber.
#[derive(Debug, Default)]
pub struct TracingReportSink;

impl ReportSink for TracingReportSink {
    fn emit(&mut self, tick: f64, topic: &str, message: &str, severity: Severity) {
        let at = crate::report::format_tick(tick);
        match severity {
            Severity::Debug => tracing::debug!(target: "wake_watch::report", %at, topic, "{message}"),
            Severity::Info => tracing::info!(target: "wake_watch::report", %at, topic, "{message}"),
            Severity::Warn => tracing::warn!(target: "wake_watch::report", %at, topic, "{message}"),
        }
    }
}

/// Writes each point as one JSON object per line.
///
/// Write failures are logged and counted, never propagated into the detectors.
#[derive(Debug)]
pub struct JsonLinesMetrics<W: Write> {
    writer: W,
    written: u64,
    failures: u64,
}

impl<W: Write> JsonLinesMetrics<W> {
    pub fn new(writer: W) -> Self {
        JsonLinesMetrics {
            writer,
            written: 0,
            failures: 0,
        }
    }

    fn write_point(&mut self, point: &MetricPoint) {
        let result = serde_json::to_writer(&mut self.writer, point)
            .map_err(std::io::Error::from)
            .and_then(|()| self.writer.write_all(b"\n"));
        match result {
            Ok(()) => self.written += 1,
            Err(e) => {
                if self.failures == 0 {
                    tracing::warn!(error = %e, "metrics write failed");
                }
                self.failures += 1;
            }
        }
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn failures(&self) -> u64 {
        self.failures
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> MetricsSink for JsonLinesMetrics<W> {
    fn record(&mut self, tick: f64, measurement: &str, field: &str, value: f64) {
        self.write_point(&MetricPoint {
            tick,
            measurement: measurement.to_string(),
            tag: None,
            field: field.to_string(),
            value,
        });
    }

    fn record_tagged(
        &mut self,
        tick: f64,
        measurement: &str,
        tag_name: &str,
        tag_value: &str,
        field: &str,
        value: f64,
    ) {
        self.write_point(&MetricPoint {
            tick,
            measurement: measurement.to_string(),
            tag: Some(Tag {
                name: tag_name.to_string(),
                value: tag_value.to_string(),
            }),
            field: field.to_string(),
            value,
        });
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ReportSink for NullSink {
    fn emit(&mut self, _tick: f64, _topic: &str, _message: &str, _severity: Severity) {}
}

impl MetricsSink for NullSink {
    fn record(&mut self, _tick: f64, _measurement: &str, _field: &str, _value: f64) {}

    fn record_tagged(
        &mut self,
        _tick: f64,
        _measurement: &str,
        _tag_name: &str,
        _tag_value: &str,
        _field: &str,
        _value: f64,
    ) {
    }
}

/// A report captured by [`Recorder`].
#[derive(Debug, Clone, PartialEq)]
pub struct ReportLine {
    pub tick: f64,
    pub topic: String,
    pub message: String,
    pub severity: Severity,
}

/// Keeps every report and metric point in memory.
#[derive(Debug, Default, Clone)]
pub struct Recorder {
    pub reports: Vec<ReportLine>,
    pub points: Vec<MetricPoint>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports on `topic`, oldest first.
    pub fn reports_on<'a>(&'a self, topic: &'a str) -> impl Iterator<Item = &'a ReportLine> + 'a {
        self.reports.iter().filter(move |r| r.topic == topic)
    }

    /// Values recorded for `measurement`/`field`, oldest first.
    pub fn values(&self, measurement: &str, field: &str) -> Vec<f64> {
        self.points
            .iter()
            .filter(|p| p.measurement == measurement && p.field == field)
            .map(|p| p.value)
            .collect()
    }

    pub fn clear(&mut self) {
        self.reports.clear();
        self.points.clear();
    }
}

impl ReportSink for Recorder {
    fn emit(&mut self, tick: f64, topic: &str, message: &str, severity: Severity) {
        self.reports.push(ReportLine {
            tick,
            topic: topic.to_string(),
            message: message.to_string(),
            severity,
        });
    }
}

impl MetricsSink for Recorder {
    fn record(&mut self, tick: f64, measurement: &str, field: &str, value: f64) {
        self.points.push(MetricPoint {
            tick,
            measurement: measurement.to_string(),
            tag: None,
            field: field.to_string(),
            value,
        });
    }

    fn record_tagged(
        &mut self,
        tick: f64,
        measurement: &str,
        tag_name: &str,
        tag_value: &str,
        field: &str,
        value: f64,
    ) {
        self.points.push(MetricPoint {
            tick,
            measurement: measurement.to_string(),
            tag: Some(Tag {
                name: tag_name.to_string(),
                value: tag_value.to_string(),
            }),
            field: field.to_string(),
            value,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_lines_one_object_per_point() {
        let mut sink = JsonLinesMetrics::new(Vec::new());
        sink.record(1.5, "wave", "period", 2.0);
        sink.record_tagged(2.0, "spectrum", "period", "2.0", "response", 0.25);
        assert_eq!(sink.written(), 2);

        let text = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: MetricPoint = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.measurement, "wave");
        assert!(first.tag.is_none());
        assert!(!lines[0].contains("tag"));

        let second: MetricPoint = serde_json::from_str(lines[1]).unwrap();
        let tag = second.tag.unwrap();
        assert_eq!((tag.name.as_str(), tag.value.as_str()), ("period", "2.0"));
        assert_eq!(second.value, 0.25);
    }

    #[test]
    fn recorder_filters_by_topic_and_field() {
        let mut recorder = Recorder::new();
        {
            let mut metrics = NullSink;
            let mut out = Outputs::new(&mut recorder, &mut metrics);
            out.emit(1.0, "wake", "start", Severity::Info);
            out.emit(2.0, "level", "rising", Severity::Debug);
        }
        recorder.record(3.0, "wave", "power", 4.0);
        recorder.record(4.0, "wave", "period", 1.0);
        recorder.record(5.0, "wave", "power", 5.0);

        assert_eq!(recorder.reports_on("wake").count(), 1);
        assert_eq!(recorder.values("wave", "power"), vec![4.0, 5.0]);
    }

    #[test]
    fn boxed_sinks_forward() {
        let mut boxed: Box<dyn MetricsSink> = Box::new(Recorder::new());
        boxed.record(0.0, "m", "f", 1.0);
        let mut report: Box<dyn ReportSink> = Box::new(NullSink);
        report.emit(0.0, "t", "m", Severity::Warn);
    }
}
