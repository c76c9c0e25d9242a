//! Timing summary produced from a set of accepted samples
//!
//! A summary is what a timer hands back at report time: five cut points of
//! the sorted sample set, the arithmetic mean and the sample standard
//! deviation, all in milliseconds.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Robust summary of a set of elapsed-time samples (milliseconds)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingSummary {
    /// Caller-supplied label printed at the start of the report line
    pub label: String,

    /// Number of samples that went into the summary
    pub count: usize,

    /// Smallest sample
    pub min: f64,

    /// Sample at index `floor(0.25 * (count - 1))` of the sorted set
    pub q25: f64,

    /// Sample at index `floor(0.5 * (count - 1))` of the sorted set
    pub median: f64,

    /// Sample at index `floor(0.75 * (count - 1))` of the sorted set
    pub q75: f64,

    /// Largest sample
    pub max: f64,

    /// Arithmetic mean
    pub mean: f64,

    /// Sample standard deviation (Bessel-corrected)
    pub stddev: f64,
}

impl TimingSummary {
    /// The five cut points in ascending order: min, q25, median, q75, max
    pub fn quantiles(&self) -> [f64; 5] {
        [self.min, self.q25, self.median, self.q75, self.max]
    }
}

/// Formats the one-line report: `label, min,q25,med,q75,max, mean,stddev`
impl fmt::Display for TimingSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, ", self.label)?;
        for value in self.quantiles() {
            write!(f, "{:.3},", value)?;
        }
        write!(f, " {:.3},{:.3}", self.mean, self.stddev)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> TimingSummary {
        TimingSummary {
            label: "draw".to_string(),
            count: 5,
            min: 1.0,
            q25: 2.0,
            median: 3.0,
            q75: 4.0,
            max: 5.0,
            mean: 3.0,
            stddev: 2.5f64.sqrt(),
        }
    }

    #[test]
    fn test_display_matches_report_line() {
        assert_eq!(
            summary().to_string(),
            "draw, 1.000,2.000,3.000,4.000,5.000, 3.000,1.581"
        );
    }

    #[test]
    fn test_display_rounds_to_three_places() {
        let s = TimingSummary {
            label: "dispatch".to_string(),
            min: 0.12345,
            q25: 0.5,
            median: 1.0004,
            q75: 2.25,
            max: 10.0,
            mean: 2.0,
            stddev: 0.0,
            count: 9,
        };
        assert_eq!(
            s.to_string(),
            "dispatch, 0.123,0.500,1.000,2.250,10.000, 2.000,0.000"
        );
    }

    #[test]
    fn test_json_roundtrip_keeps_fields() {
        let s = summary();
        let json = serde_json::to_string(&s).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["label"], "draw");
        assert_eq!(parsed["count"], 5);
        assert_eq!(parsed["median"], 3.0);
    }
}
