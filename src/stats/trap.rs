/// Which limit a [`Trap`] tripped on, with the offending value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrapHit {
    High(f64),
    Low(f64),
}

/// Debounced out-of-range detector.
///
/// Reports the first value outside `[low, high]`, then stays quiet until
/// `span` consecutive in-range values have been seen.
#[derive(Debug, Clone)]
pub struct Trap {
    high: f64,
    low: f64,
    span: u32,
    /// In-range samples still needed before the trap re-arms; 0 when armed
    countdown: u32,
}

impl Trap {
    pub fn new(high: f64, low: f64, span: u32) -> Self {
        Trap {
            high,
            low,
            span,
            countdown: 0,
        }
    }

    pub fn append(&mut self, value: f64) -> Option<TrapHit> {
        let hit = if value > self.high {
            TrapHit::High(value)
        } else if value < self.low {
            TrapHit::Low(value)
        } else {
            self.countdown = self.countdown.saturating_sub(1);
            return None;
        };

        let armed = self.countdown == 0;
        self.countdown = self.span;
        armed.then_some(hit)
    }

    pub fn is_armed(&self) -> bool {
        self.countdown == 0
    }

    pub fn reset(&mut self) {
        self.countdown = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_once_per_excursion() {
        let mut trap = Trap::new(4.0, -1.0, 3);
        assert_eq!(trap.append(5.0), Some(TrapHit::High(5.0)));
        assert_eq!(trap.append(6.0), None);
        assert_eq!(trap.append(-3.0), None);
        assert!(!trap.is_armed());
    }

    #[test]
    fn rearms_after_span_in_range_samples() {
        let mut trap = Trap::new(4.0, -1.0, 3);
        trap.append(5.0);
        trap.append(0.0);
        trap.append(0.0);
        // an excursion before the countdown finishes restarts it
        assert_eq!(trap.append(-2.0), None);
        for _ in 0..3 {
            assert_eq!(trap.append(1.0), None);
        }
        assert!(trap.is_armed());
        assert_eq!(trap.append(-2.0), Some(TrapHit::Low(-2.0)));
    }

    #[test]
    fn limits_are_inclusive() {
        let mut trap = Trap::new(4.0, -1.0, 3);
        assert_eq!(trap.append(4.0), None);
        assert_eq!(trap.append(-1.0), None);
    }
}
