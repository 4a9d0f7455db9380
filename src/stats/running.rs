/// Fixed-span running mean and deviation.
///
/// Updates are O(1) with no sample history: the mean and the average of
/// squares both move `1/span` of the way toward each new value.
#[derive(Debug, Clone)]
pub struct RunningStats {
    span: f64,
    count: u64,
    mean: f64,
    power_sum_average: f64,
    std_dev: f64,
    coefficient_of_variation: f64,
    last: f64,
}

impl RunningStats {
    /// `span` is clamped to at least 2.
    pub fn new(span: u32) -> Self {
        RunningStats {
            span: f64::from(span.max(2)),
            count: 0,
            mean: 0.0,
            power_sum_average: 0.0,
            std_dev: 0.0,
            coefficient_of_variation: 0.0,
            last: 0.0,
        }
    }

    pub fn update(&mut self, value: f64) {
        self.count += 1;
        self.last = value;
        if self.count == 1 {
            self.mean = value;
            self.power_sum_average = value * value;
            self.std_dev = 0.0;
            self.coefficient_of_variation = 0.0;
            return;
        }

        let n = self.span;
        self.mean += (value - self.mean) / n;
        self.power_sum_average += (value * value - self.power_sum_average) / n;
        self.std_dev = ((self.power_sum_average * value - value * self.mean * self.mean).abs()
            / (n - 1.0))
            .sqrt();
        self.coefficient_of_variation = if self.mean == 0.0 {
            0.0
        } else {
            self.std_dev / self.mean * 100.0
        };
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn std_dev(&self) -> f64 {
        self.std_dev
    }

    /// Standard deviation as a percentage of the mean; 0 when the mean is 0.
    pub fn coefficient_of_variation(&self) -> f64 {
        self.coefficient_of_variation
    }

    pub fn power_sum_average(&self) -> f64 {
        self.power_sum_average
    }

    pub fn last(&self) -> f64 {
        self.last
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn reset(&mut self) {
        *self = RunningStats::new(self.span as u32);
    }
}
