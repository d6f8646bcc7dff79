//! Cross-sectional percentile lookups.

/// Linear-interpolated percentile of an ascending slice, `p` in `[0, 1]`.
/// Returns `None` for an empty slice.
pub fn percentile(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let p = p.clamp(0.0, 1.0);
    let pos = p * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    if lower == upper {
        return Some(sorted[lower]);
    }
    let weight = pos - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}

/// Sorted snapshot of a universe's values for repeated rank lookups.
#[derive(Debug, Clone, Default)]
pub struct PercentileTable {
    sorted: Vec<f64>,
}

impl PercentileTable {
    /// Non-finite values are dropped.
    pub fn new<I: IntoIterator<Item = f64>>(values: I) -> Self {
        let mut sorted: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
        sorted.sort_by(|a, b| a.total_cmp(b));
        Self { sorted }
    }

    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }

    /// Mid-rank of `value`: share strictly below plus half the ties, in
    /// `[0, 1]`. An empty table ranks everything at 0.5.
    pub fn rank(&self, value: f64) -> f64 {
        if self.sorted.is_empty() || !value.is_finite() {
            return 0.5;
        }
        let below = self.sorted.partition_point(|v| *v < value);
        let not_above = self.sorted.partition_point(|v| *v <= value);
        let ties = not_above - below;
        (below as f64 + ties as f64 / 2.0) / self.sorted.len() as f64
    }

    pub fn value_at(&self, p: f64) -> Option<f64> {
        percentile(&self.sorted, p)
    }
}
