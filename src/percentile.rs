use strum_macros::{Display, EnumIter};

/// The latency percentiles reported for every second and for the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum PercentileLevel {
    #[strum(serialize = "p50")]
    P50,
    #[strum(serialize = "p90")]
    P90,
    #[strum(serialize = "p95")]
    P95,
    #[strum(serialize = "p99")]
    P99,
}

impl PercentileLevel {
    pub fn rank(&self) -> f64 {
        match self {
            PercentileLevel::P50 => 50.0,
            PercentileLevel::P90 => 90.0,
            PercentileLevel::P95 => 95.0,
            PercentileLevel::P99 => 99.0,
        }
    }

    /// Key used by k6 summary documents, e.g. `p(95)`.
    pub fn k6_key(&self) -> String {
        format!("p({})", self.rank() as u32)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Percentiles {
    pub p50: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,
}

impl Percentiles {
    /// All NaN, for a set without samples. Zero would read as a measured 0ms.
    pub fn missing() -> Self {
        Self {
            p50: f64::NAN,
            p90: f64::NAN,
            p95: f64::NAN,
            p99: f64::NAN,
        }
    }

    pub fn zero() -> Self {
        Self {
            p50: 0.0,
            p90: 0.0,
            p95: 0.0,
            p99: 0.0,
        }
    }

    /// Sorts `samples` in place and interpolates the four levels.
    pub fn from_samples(samples: &mut [f64]) -> Self {
        if samples.is_empty() {
            return Self::missing();
        }
        samples.sort_by(|a, b| a.total_cmp(b));
        Self::from_sorted(samples)
    }

    pub fn from_sorted(sorted: &[f64]) -> Self {
        Self {
            p50: percentile(sorted, PercentileLevel::P50.rank()),
            p90: percentile(sorted, PercentileLevel::P90.rank()),
            p95: percentile(sorted, PercentileLevel::P95.rank()),
            p99: percentile(sorted, PercentileLevel::P99.rank()),
        }
    }

    pub fn get(
        &self,
        level: PercentileLevel,
    ) -> f64 {
        match level {
            PercentileLevel::P50 => self.p50,
            PercentileLevel::P90 => self.p90,
            PercentileLevel::P95 => self.p95,
            PercentileLevel::P99 => self.p99,
        }
    }

    pub fn set(
        &mut self,
        level: PercentileLevel,
        value: f64,
    ) {
        match level {
            PercentileLevel::P50 => self.p50 = value,
            PercentileLevel::P90 => self.p90 = value,
            PercentileLevel::P95 => self.p95 = value,
            PercentileLevel::P99 => self.p99 = value,
        }
    }
}

/// Linear-interpolation percentile over an ascending slice.
///
/// The rank of `pct` is `pct / 100 * (n - 1)`; the result interpolates between
/// the samples at the floor and ceiling of that rank. NaN for an empty slice.
pub fn percentile(
    sorted: &[f64],
    pct: f64,
) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let rank = (pct / 100.0).clamp(0.0, 1.0) * (n - 1) as f64;
            let lower = rank.floor() as usize;
            let upper = rank.ceil() as usize;
            let weight = rank - lower as f64;
            sorted[lower] + (sorted[upper] - sorted[lower]) * weight
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::seq::SliceRandom;
    use strum::IntoEnumIterator;

    fn close(
        a: f64,
        b: f64,
    ) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_singleton_is_every_percentile() {
        let p = Percentiles::from_samples(&mut [42.0]);
        for level in PercentileLevel::iter() {
            assert_eq!(p.get(level), 42.0);
        }
    }

    #[test]
    fn test_empty_is_nan() {
        let p = Percentiles::from_samples(&mut []);
        for level in PercentileLevel::iter() {
            assert!(p.get(level).is_nan());
        }
    }

    #[test]
    fn test_interpolation() {
        let sorted = [10.0, 20.0, 30.0, 40.0];
        // rank 1.5
        assert!(close(percentile(&sorted, 50.0), 25.0));
        // rank 2.7
        assert!(close(percentile(&sorted, 90.0), 37.0));
        assert!(close(percentile(&sorted, 0.0), 10.0));
        assert!(close(percentile(&sorted, 100.0), 40.0));
    }

    #[test]
    fn test_hundred_samples() {
        let mut samples: Vec<f64> = (1..=100).map(|i| (i * 10) as f64).collect();
        let p = Percentiles::from_samples(&mut samples);
        assert!(close(p.p50, 505.0));
        assert!(close(p.p90, 901.0));
        assert!(close(p.p95, 950.5));
        assert!(close(p.p99, 990.1));
    }

    #[test]
    fn test_order_independent() {
        let mut sorted: Vec<f64> = (0..257).map(|i| (i as f64).sqrt() * 3.0).collect();
        let expected = Percentiles::from_samples(&mut sorted.clone());

        let mut rng = rand::thread_rng();
        for _ in 0..10 {
            sorted.shuffle(&mut rng);
            let p = Percentiles::from_samples(&mut sorted);
            for level in PercentileLevel::iter() {
                assert!(close(p.get(level), expected.get(level)));
            }
        }
    }

    #[test]
    fn test_k6_keys() {
        let keys: Vec<String> = PercentileLevel::iter().map(|l| l.k6_key()).collect();
        assert_eq!(keys, vec!["p(50)", "p(90)", "p(95)", "p(99)"]);
    }
}
