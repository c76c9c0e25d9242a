//! Timer error types

use crate::device::{DeviceError, QueryKind};
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by [`crate::GpuTimer`]
#[derive(Debug, Error)]
pub enum TimerError {
    /// The device refused to allocate one of the ring's query objects
    #[error("failed to create {kind} query for ring slot {slot}: {source}")]
    QueryCreation {
        kind: QueryKind,
        slot: usize,
        #[source]
        source: DeviceError,
    },

    /// Ring capacity must be a non-zero power of two
    #[error("ring capacity must be a power of two, got {0}")]
    InvalidCapacity(usize),

    /// An opt-in poll timeout expired before the device produced a result
    #[error("{kind} query for bracket {index} not ready after {waited:?}")]
    PollTimeout {
        kind: QueryKind,
        index: u64,
        waited: Duration,
    },
}

impl TimerError {
    /// True for errors that leave the timer usable (the caller may retry)
    pub fn is_transient(&self) -> bool {
        matches!(self, TimerError::PollTimeout { .. })
    }
}
