use serde::Serialize;

/// One entry in the [`Dominant`] ranking.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Ranked {
    pub period: f64,
    pub response: f64,
}

/// The three strongest responses seen since the last reset.
#[derive(Debug, Clone, Default)]
pub struct Dominant {
    top: [Option<Ranked>; 3],
}

impl Dominant {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer one bin's response. Ties keep the earlier entry ahead.
    pub fn update(&mut self, period: f64, response: f64) {
        let beats = |slot: &Option<Ranked>| slot.map_or(true, |r| response > r.response);
        let Some(position) = self.top.iter().position(beats) else {
            return;
        };
        for i in (position + 1..self.top.len()).rev() {
            self.top[i] = self.top[i - 1];
        }
        self.top[position] = Some(Ranked { period, response });
    }

    pub fn first(&self) -> Option<Ranked> {
        self.top[0]
    }

    /// Ranked entries, strongest first.
    pub fn ranking(&self) -> impl Iterator<Item = Ranked> + '_ {
        self.top.iter().flatten().copied()
    }

    pub fn reset(&mut self) {
        self.top = [None; 3];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_top_three_in_order() {
        let mut dominant = Dominant::new();
        for (period, response) in [(1.0, 0.2), (2.0, 0.9), (3.0, 0.5), (4.0, 0.1), (5.0, 0.7)] {
            dominant.update(period, response);
        }
        let periods: Vec<f64> = dominant.ranking().map(|r| r.period).collect();
        assert_eq!(periods, vec![2.0, 5.0, 3.0]);
        assert_eq!(dominant.first().unwrap().response, 0.9);
    }

    #[test]
    fn ties_do_not_displace() {
        let mut dominant = Dominant::new();
        dominant.update(1.0, 0.5);
        dominant.update(2.0, 0.5);
        assert_eq!(dominant.first().unwrap().period, 1.0);
        dominant.reset();
        assert!(dominant.first().is_none());
    }
}
