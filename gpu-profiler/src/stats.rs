//! Sample statistics
//!
//! Accumulates accepted millisecond samples and reduces them to a
//! [`TimingSummary`] on demand.

use gputimer_shared::TimingSummary;

/// Append-only store of accepted samples
#[derive(Debug, Clone, Default)]
pub struct StatsAggregator {
    values: Vec<f64>,
}

impl StatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sample
    pub fn record(&mut self, value: f64) {
        self.values.push(value);
    }

    /// Discard every sample, keeping the aggregator
    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Samples in the order they were recorded
    pub fn samples(&self) -> &[f64] {
        &self.values
    }

    /// Summarize the current samples; `None` with fewer than two.
    pub fn summarize(&self, label: &str) -> Option<TimingSummary> {
        let count = self.values.len();
        if count < 2 {
            return None;
        }

        let mut sorted = self.values.clone();
        sorted.sort_by(|a, b| a.total_cmp(b));

        // Cut point i sits at floor(i/4 * (n - 1)).
        let cut = |i: usize| sorted[i * (count - 1) / 4];

        let mean = sorted.iter().sum::<f64>() / count as f64;
        let sum_sq: f64 = sorted.iter().map(|x| (x - mean) * (x - mean)).sum();
        let stddev = (sum_sq / (count - 1) as f64).sqrt();

        Some(TimingSummary {
            label: label.to_string(),
            count,
            min: cut(0),
            q25: cut(1),
            median: cut(2),
            q75: cut(3),
            max: cut(4),
            mean,
            stddev,
        })
    }

    /// The one-line report for the current samples, if there are enough
    pub fn report(&self, label: &str) -> Option<String> {
        self.summarize(label).map(|summary| summary.to_string())
    }
}
