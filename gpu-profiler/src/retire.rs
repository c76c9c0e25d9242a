//! Sample retirement
//!
//! Reads back one slot's three query results (blocking according to the
//! poll policy), converts the tick delta to milliseconds and decides whether
//! the sample counts. Retirement is strictly FIFO over issue order, which is
//! what lets a slot's begin/end ticks be trusted as a pair.

use crate::device::{QueryKind, TimingDevice, ValidityRecord};
use crate::error::TimerError;
use crate::ring::QuerySlot;
use crate::wait::{Elapsed, PollPolicy};
use gputimer_shared::utils::time::ticks_to_millis;

/// Raw results of one retired bracket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetiredSample {
    pub index: u64,
    pub begin_ticks: u64,
    pub end_ticks: u64,
    pub validity: ValidityRecord,
}

/// What happened to a retired sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    /// Counted; elapsed milliseconds
    Accepted(f64),

    /// Dropped: retired inside the warmup window
    Warmup,

    /// Dropped: the clock was unstable during the bracket
    Invalid,
}

impl Outcome {
    /// Label used for the `outcome` metric dimension
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Accepted(_) => "accepted",
            Outcome::Warmup => "warmup",
            Outcome::Invalid => "invalid",
        }
    }
}

impl RetiredSample {
    /// Elapsed device time in milliseconds
    pub fn elapsed_ms(&self) -> f64 {
        ticks_to_millis(
            self.begin_ticks,
            self.end_ticks,
            self.validity.ticks_per_second,
        )
    }

    /// Apply warmup and validity filtering
    pub fn classify(&self, warmup_count: u64) -> Outcome {
        if self.index < warmup_count {
            Outcome::Warmup
        } else if !self.validity.is_valid {
            Outcome::Invalid
        } else {
            Outcome::Accepted(self.elapsed_ms())
        }
    }
}

fn timeout_error(kind: QueryKind, index: u64) -> impl FnOnce(Elapsed) -> TimerError {
    move |elapsed| {
        crate::metrics::POLL_TIMEOUTS.inc();
        TimerError::PollTimeout {
            kind,
            index,
            waited: elapsed.waited,
        }
    }
}

/// Block until all three results of `slot` are available.
///
/// `index` is the logical bracket index, used for diagnostics only.
pub fn read_slot<D: TimingDevice>(
    device: &mut D,
    slot: &QuerySlot<D>,
    policy: &PollPolicy,
    index: u64,
) -> Result<RetiredSample, TimerError> {
    let begin_ticks = policy
        .wait_for(|| device.poll_timestamp(&slot.begin))
        .map_err(timeout_error(QueryKind::Timestamp, index))?;
    let end_ticks = policy
        .wait_for(|| device.poll_timestamp(&slot.end))
        .map_err(timeout_error(QueryKind::Timestamp, index))?;
    let validity = policy
        .wait_for(|| device.poll_validity(&slot.validity))
        .map_err(timeout_error(QueryKind::Validity, index))?;

    Ok(RetiredSample {
        index,
        begin_ticks,
        end_ticks,
        validity,
    })
}
