//! Device-side timing primitives consumed by the profiler
//!
//! The profiler never owns a device. Every operation receives the device (or
//! command-stream context) explicitly, and the device exposes only the
//! handful of query primitives below. Recording calls are asynchronous: they
//! append to the command stream and resolve later, in submission order.

use std::task::Poll;
use thiserror::Error;

/// Resolved contents of a validity query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidityRecord {
    /// False when the clock domain was unstable somewhere inside the interval
    pub is_valid: bool,

    /// Tick frequency used to convert timestamp deltas to seconds
    pub ticks_per_second: u64,
}

/// The device refused to allocate a query object
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct DeviceError(pub String);

/// Kind of query object, used in diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    Timestamp,
    Validity,
}

impl std::fmt::Display for QueryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryKind::Timestamp => write!(f, "timestamp"),
            QueryKind::Validity => write!(f, "validity"),
        }
    }
}

/// Query primitives a GPU device (or command-stream context) must supply.
///
/// Timestamp and validity queries are distinct associated types so a slot
/// can never hand a validity object to a timestamp call or vice versa.
pub trait TimingDevice {
    /// Handle to a query that captures a tick count when execution reaches it
    type Timestamp;

    /// Handle to a query that brackets an interval and reports clock stability
    type Validity;

    /// Allocate a timestamp query
    fn create_timestamp_query(&mut self) -> Result<Self::Timestamp, DeviceError>;

    /// Allocate a validity query
    fn create_validity_query(&mut self) -> Result<Self::Validity, DeviceError>;

    /// Record the start of a validity interval on the command stream
    fn begin_validity(&mut self, query: &Self::Validity);

    /// Record the end of a validity interval on the command stream
    fn end_validity(&mut self, query: &Self::Validity);

    /// Record a timestamp on the command stream
    fn end_timestamp(&mut self, query: &Self::Timestamp);

    /// Non-blocking read of a timestamp query's tick count
    fn poll_timestamp(&mut self, query: &Self::Timestamp) -> Poll<u64>;

    /// Non-blocking read of a validity query's record
    fn poll_validity(&mut self, query: &Self::Validity) -> Poll<ValidityRecord>;

    /// Return a timestamp query to the device
    fn release_timestamp_query(&mut self, query: Self::Timestamp) {
        drop(query);
    }

    /// Return a validity query to the device
    fn release_validity_query(&mut self, query: Self::Validity) {
        drop(query);
    }
}
