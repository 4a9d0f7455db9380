//! # Narrowband Filter Bank
//!
//! One [`SpectralBin`] per period of interest: the deep-water wake period of
//! each candidate boat length plus a fixed list of plain wave periods. Every
//! bin resamples the raw height stream at its own whole-cycle spacing, so a
//! single DFT index (`buffer_size / samples_per_cycle`) lands exactly on the
//! bin's period. Evaluation runs on a scheduler tick, ranks the responses and
//! trims every buffer back to `minimum_cycles` cycles.
//!
//! ## Why resample per bin
//! A plain FFT of the 30 Hz stream would put a 2.1 s wake between two DFT
//! bins. Resampling each candidate to a power-of-two number of points per
//! cycle puts every candidate on an exact bin with a single shared FFT size.

mod dominant;
mod resample;

pub use dominant::{Dominant, Ranked};
pub use resample::{interpolate, samples_per_cycle, ResampleMethod, ResampleSeries};

use crate::config::{SiteConfig, SpectralConfig};
use crate::error::{Result, WakeError};
use crate::sink::Outputs;
use crate::wave::WaterBody;
use realfft::num_complex::Complex;
use realfft::{RealFftPlanner, RealToComplex};
use std::fmt;
use std::sync::Arc;

/// What a bin is tuned to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinKind {
    /// Wake of a boat of this length in feet
    BoatLength(f64),
    /// A plain wave period
    Period,
}

#[derive(Debug, Clone)]
pub struct SpectralBin {
    kind: BinKind,
    /// ft
    wavelength: f64,
    series: ResampleSeries,
    response: Option<f64>,
}

impl SpectralBin {
    pub fn kind(&self) -> BinKind {
        self.kind
    }

    pub fn period(&self) -> f64 {
        self.series.cycle_period()
    }

    pub fn wavelength(&self) -> f64 {
        self.wavelength
    }

    /// Latest DFT magnitude at the bin's period; `None` before the first
    /// evaluation with enough samples.
    pub fn response(&self) -> Option<f64> {
        self.response
    }

    pub fn series(&self) -> &ResampleSeries {
        &self.series
    }

    fn tag(&self) -> (&'static str, String) {
        match self.kind {
            BinKind::BoatLength(feet) => ("boatLength", format!("{feet:.0}")),
            BinKind::Period => ("period", format!("{:.2}", self.period())),
        }
    }
}

impl fmt::Display for SpectralBin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            BinKind::BoatLength(feet) => write!(f, "{feet:>3.0}' boat {:>5.2}s", self.period()),
            BinKind::Period => write!(f, "{:>10.2}s", self.period()),
        }
    }
}

/// Strongest boat-length bin of the latest evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoatEstimate {
    pub length_ft: f64,
    pub period: f64,
    pub response: f64,
}

pub struct SpectralIdentifier {
    bins: Vec<SpectralBin>,
    method: ResampleMethod,
    buffer_size: usize,
    fft: Arc<dyn RealToComplex<f64>>,
    input: Vec<f64>,
    output: Vec<Complex<f64>>,
    scratch: Vec<Complex<f64>>,
    last: Option<(f64, f64)>,
    dominant: Dominant,
    best_boat: Option<BoatEstimate>,
    evaluations: u64,
}

impl fmt::Debug for SpectralIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpectralIdentifier")
            .field("bins", &self.bins.len())
            .field("buffer_size", &self.buffer_size)
            .field("method", &self.method)
            .field("evaluations", &self.evaluations)
            .finish()
    }
}

impl SpectralIdentifier {
    /// Build every bin. Fails when a period is too short to resample at the
    /// source rate or the buffer cannot hold one cycle.
    pub fn new(config: &SpectralConfig, site: &SiteConfig) -> Result<Self> {
        let water = WaterBody::from(site);
        let series = |period: f64| {
            ResampleSeries::new(
                period,
                config.resolution,
                site.sample_rate,
                config.minimum_cycles,
            )
        };

        let mut bins = Vec::with_capacity(config.boat_lengths_ft.len() + config.target_periods.len());
        for &length in &config.boat_lengths_ft {
            bins.push(SpectralBin {
                kind: BinKind::BoatLength(length),
                wavelength: length,
                series: series(water.deep_period(length))?,
                response: None,
            });
        }
        for &period in &config.target_periods {
            bins.push(SpectralBin {
                kind: BinKind::Period,
                wavelength: water.deep_wavelength(period),
                series: series(period)?,
                response: None,
            });
        }

        if let Some(bin) = bins
            .iter()
            .find(|b| b.series.samples_per_cycle() > config.buffer_size)
        {
            return Err(WakeError::InvalidConfig(format!(
                "buffer_size {} cannot hold one {:.2}s cycle",
                config.buffer_size,
                bin.period()
            )));
        }

        let fft = RealFftPlanner::<f64>::new().plan_fft_forward(config.buffer_size);
        let input = fft.make_input_vec();
        let output = fft.make_output_vec();
        let scratch = fft.make_scratch_vec();
        tracing::debug!(bins = bins.len(), buffer_size = config.buffer_size, "filter bank ready");

        Ok(SpectralIdentifier {
            bins,
            method: config.method,
            buffer_size: config.buffer_size,
            fft,
            input,
            output,
            scratch,
            last: None,
            dominant: Dominant::new(),
            best_boat: None,
            evaluations: 0,
        })
    }

    /// Resample one raw height into every bin.
    pub fn push(&mut self, tick: f64, height: f64) {
        let (last_tick, last_value) = self.last.unwrap_or((tick, height));
        for bin in &mut self.bins {
            bin.series
                .push(tick, height, last_tick, last_value, self.method);
        }
        self.last = Some((tick, height));
    }

    /// Run the DFT on every ready bin, rank the responses, record them and
    /// trim the buffers. Returns the strongest bin, if any was ready.
    pub fn evaluate(&mut self, tick: f64, out: &mut Outputs<'_>) -> Option<Ranked> {
        let SpectralIdentifier {
            bins,
            buffer_size,
            fft,
            input,
            output,
            scratch,
            dominant,
            best_boat,
            ..
        } = self;
        dominant.reset();
        *best_boat = None;

        for bin in bins.iter_mut() {
            let Some(buffer) = bin.series.tiled(*buffer_size) else {
                continue;
            };
            input.copy_from_slice(&buffer);
            let index = *buffer_size / bin.series.samples_per_cycle();
            let response = match fft
                .process_with_scratch(input, output, scratch)
                .map_err(fft_error)
            {
                Ok(()) => output[index].norm(),
                Err(e) => {
                    tracing::warn!(period = bin.period(), error = %e, "skipping bin");
                    continue;
                }
            };
            bin.response = Some(response);
            bin.series.trim();

            dominant.update(bin.period(), response);
            if let BinKind::BoatLength(length_ft) = bin.kind {
                if best_boat.map_or(true, |b| response > b.response) {
                    *best_boat = Some(BoatEstimate {
                        length_ft,
                        period: bin.period(),
                        response,
                    });
                }
            }
            let (tag_name, tag_value) = bin.tag();
            out.record_tagged(tick, "spectrum", (tag_name, &tag_value), "response", response);
        }
        self.evaluations += 1;

        let first = self.dominant.first()?;
        out.record(tick, "dominant", "period", first.period);
        out.record(tick, "dominant", "response", first.response);
        if let Some(boat) = self.best_boat {
            out.record(tick, "dominant", "boatLength", boat.length_ft);
        }
        tracing::trace!(tick, period = first.period, response = first.response, "dominant period");
        Some(first)
    }

    pub fn bins(&self) -> &[SpectralBin] {
        &self.bins
    }

    pub fn dominant(&self) -> &Dominant {
        &self.dominant
    }

    pub fn best_boat(&self) -> Option<BoatEstimate> {
        self.best_boat
    }

    pub fn evaluations(&self) -> u64 {
        self.evaluations
    }
}

fn fft_error(e: impl fmt::Display) -> WakeError {
    WakeError::Fft(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{NullSink, Recorder};
    use std::f64::consts::PI;

    fn feed_sine(bank: &mut SpectralIdentifier, period: f64, seconds: f64) {
        let rate = 30.0;
        let n = (seconds * rate) as usize;
        for i in 0..n {
            let tick = i as f64 / rate;
            bank.push(tick, (2.0 * PI * tick / period).sin());
        }
    }

    #[test]
    fn default_bank_builds() {
        let bank = SpectralIdentifier::new(&SpectralConfig::default(), &SiteConfig::default()).unwrap();
        assert_eq!(bank.bins().len(), 18 + 38);
        let boat = &bank.bins()[0];
        assert_eq!(boat.kind(), BinKind::BoatLength(6.0));
        assert!((boat.period() - (2.0 * PI * 6.0 / 32.174_f64).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn too_short_period_is_a_configuration_error() {
        let mut config = SpectralConfig::default();
        config.target_periods.push(0.05);
        let err = SpectralIdentifier::new(&config, &SiteConfig::default()).unwrap_err();
        assert!(matches!(err, WakeError::ResampleInfeasible { .. }));
    }

    #[test]
    fn nothing_ranked_before_buffers_fill() {
        let mut bank = SpectralIdentifier::new(&SpectralConfig::default(), &SiteConfig::default()).unwrap();
        feed_sine(&mut bank, 6.0, 1.0);
        let (mut report, mut metrics) = (NullSink, NullSink);
        let mut out = Outputs::new(&mut report, &mut metrics);
        assert!(bank.evaluate(1.0, &mut out).is_none());
        assert_eq!(bank.evaluations(), 1);
    }

    #[test]
    fn pure_tone_dominates_its_own_bin() {
        let mut bank = SpectralIdentifier::new(&SpectralConfig::default(), &SiteConfig::default()).unwrap();
        feed_sine(&mut bank, 6.0, 30.0);

        let mut report = NullSink;
        let mut metrics = Recorder::new();
        let mut out = Outputs::new(&mut report, &mut metrics);
        let first = bank.evaluate(30.0, &mut out).unwrap();
        assert_eq!(first.period, 6.0);
        // whole cycles of a unit sine put half the buffer length into the bin
        assert!((first.response - 512.0).abs() < 10.0);

        assert_eq!(metrics.values("dominant", "period"), vec![6.0]);
        assert!(metrics
            .points
            .iter()
            .any(|p| p.measurement == "spectrum" && p.tag.as_ref().map(|t| t.value.as_str()) == Some("6.00")));

        // evaluated bins are trimmed back to minimum_cycles cycles
        let bin = bank.bins().iter().find(|b| b.period() == 6.0).unwrap();
        assert_eq!(bin.series().len(), bin.series().retained());
        assert!(bank.best_boat().is_some());
    }
}
