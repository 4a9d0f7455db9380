/// Exponential (IIR) moving average over a nominal span of samples.
///
/// The first value seeds the average; afterwards
/// `avg = ((span - 1) * avg + value) / span`.
#[derive(Debug, Clone)]
pub struct Average {
    span: f64,
    average: Option<f64>,
}

impl Average {
    /// `span` below 1 is treated as 1 (no smoothing).
    pub fn new(span: u32) -> Self {
        Average {
            span: f64::from(span.max(1)),
            average: None,
        }
    }

    pub fn update(&mut self, value: f64) -> f64 {
        let next = match self.average {
            None => value,
            Some(avg) => (avg * (self.span - 1.0) + value) / self.span,
        };
        self.average = Some(next);
        next
    }

    /// Current average, `None` until the first update.
    pub fn value(&self) -> Option<f64> {
        self.average
    }

    pub fn reset(&mut self) {
        self.average = None;
    }
}
