//! Aggregate measurement statistics.

/// Mean and population standard deviation of a sample stream.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Measurement {
    pub mean: f64,
    pub std: f64,
}

impl Measurement {
    /// Compute mean and population standard deviation in a single pass.
    ///
    /// An empty stream yields `{0, 0}` rather than NaN so per-tick series
    /// stay plottable across quiet ticks.
    pub fn from_samples<I>(samples: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let mut count = 0u64;
        let mut sum = 0.0f64;
        let mut sum_sq = 0.0f64;
        for x in samples {
            count += 1;
            sum += x;
            sum_sq += x * x;
        }
        if count == 0 {
            return Measurement::default();
        }
        let mean = sum / count as f64;
        let variance = (sum_sq / count as f64 - mean * mean).max(0.0);
        Measurement { mean, std: variance.sqrt() }
    }
}

impl std::fmt::Display for Measurement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.3} ± {:.3}", self.mean, self.std)
    }
}
