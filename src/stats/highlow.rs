use serde::Serialize;

/// Open/high/low/close of the values seen since the last reset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Ohlc {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

/// Explicitly reset high/low register (hourly and daily level ranges).
#[derive(Debug, Clone, Default)]
pub struct HighLow {
    range: Option<Ohlc>,
}

impl HighLow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, value: f64) {
        match &mut self.range {
            None => {
                self.range = Some(Ohlc {
                    open: value,
                    high: value,
                    low: value,
                    close: value,
                })
            }
            Some(range) => {
                range.high = range.high.max(value);
                range.low = range.low.min(value);
                range.close = value;
            }
        }
    }

    /// `None` when nothing has been seen since the last reset.
    pub fn range(&self) -> Option<Ohlc> {
        self.range
    }

    pub fn reset(&mut self) {
        self.range = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_open_close_and_extremes() {
        let mut hl = HighLow::new();
        assert!(hl.range().is_none());
        for v in [25., 26., 27., 28., 29., 28., 27., 26., 25., 26., 27.] {
            hl.update(v);
        }
        let r = hl.range().unwrap();
        assert_eq!((r.open, r.low, r.high, r.close), (25., 25., 29., 27.));

        hl.reset();
        for v in [25., 26., 27.] {
            hl.update(v);
        }
        let r = hl.range().unwrap();
        assert_eq!((r.open, r.low, r.high, r.close), (25., 25., 27., 27.));
    }
}
