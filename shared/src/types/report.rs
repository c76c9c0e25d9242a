//! Report envelope written by the CLI's JSON export

use crate::types::{counters::TimerCounters, summary::TimingSummary};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single `report` outcome together with the timer's counters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingReport {
    /// Wall-clock time the report was produced
    pub generated_at: DateTime<Utc>,

    /// Label the report was requested under
    pub label: String,

    /// Summary line data; `None` when fewer than two samples were accepted
    pub summary: Option<TimingSummary>,

    /// Counters at report time
    pub counters: TimerCounters,
}

impl TimingReport {
    /// Build a report stamped with the current time
    pub fn new(label: &str, summary: Option<TimingSummary>, counters: TimerCounters) -> Self {
        Self {
            generated_at: Utc::now(),
            label: label.to_string(),
            summary,
            counters,
        }
    }

    /// The formatted summary line, if there was enough data
    pub fn line(&self) -> Option<String> {
        self.summary.as_ref().map(|s| s.to_string())
    }
}
