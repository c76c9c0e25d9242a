//! Per-timer bookkeeping counters

use serde::{Deserialize, Serialize};

/// Running totals of what a timer has issued and how its samples retired
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerCounters {
    /// Brackets opened
    pub issued: u64,

    /// Brackets whose device results have been read back
    pub retired: u64,

    /// Retired samples appended to the statistics
    pub accepted: u64,

    /// Retired samples dropped because they fell inside the warmup window
    pub discarded_warmup: u64,

    /// Retired samples dropped because the clock was unstable
    pub discarded_invalid: u64,

    /// Retirements forced by `bracket_begin` to free a ring slot
    pub forced_retirements: u64,
}

impl TimerCounters {
    /// Brackets issued but not yet retired
    pub fn in_flight(&self) -> u64 {
        self.issued.saturating_sub(self.retired)
    }

    /// Fraction of retired samples that were accepted (0.0 when nothing retired)
    pub fn acceptance_rate(&self) -> f64 {
        if self.retired == 0 {
            return 0.0;
        }
        self.accepted as f64 / self.retired as f64
    }
}
