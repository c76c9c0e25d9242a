//! Deterministic in-memory timing device
//!
//! Models a single in-order command stream with a tick clock that only moves
//! when work is "executed". Results resolve after a configurable number of
//! not-ready polls, so the profiler's backpressure and drain paths are
//! exercised without a GPU. The device also counts any query that is
//! re-recorded while its previous result is still unread, which is exactly
//! the corruption the scheduler must prevent.

use crate::device::{DeviceError, TimingDevice, ValidityRecord};
use gputimer_shared::utils::time::millis_to_ticks;
use std::task::Poll;

/// Default simulated clock: 1 MHz, so one tick is one microsecond
pub const DEFAULT_TICKS_PER_SECOND: u64 = 1_000_000;

/// Handle to a simulated timestamp query
#[derive(Debug, PartialEq, Eq)]
pub struct SimTimestamp(usize);

/// Handle to a simulated validity query
#[derive(Debug, PartialEq, Eq)]
pub struct SimValidity(usize);

/// One recorded command-stream operation, identified by query id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    BeginValidity(usize),
    EndValidity(usize),
    EndTimestamp(usize),
}

#[derive(Debug, Default)]
struct TimestampState {
    ticks: Option<u64>,
    polls_remaining: u32,
    unread: bool,
}

#[derive(Debug, Default)]
struct ValidityState {
    open: bool,
    disjoint: bool,
    record: Option<ValidityRecord>,
    polls_remaining: u32,
    unread: bool,
}

/// Simulated device implementing [`TimingDevice`]
#[derive(Debug)]
pub struct SimulatedDevice {
    clock: u64,
    ticks_per_second: u64,
    latency_polls: u32,
    wedged: bool,
    allocation_budget: Option<usize>,
    timestamps: Vec<Option<TimestampState>>,
    validities: Vec<Option<ValidityState>>,
    commands: Vec<Command>,
    overwrites: u64,
}

impl Default for SimulatedDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedDevice {
    /// 1 MHz clock, results ready on first poll
    pub fn new() -> Self {
        Self {
            clock: 0,
            ticks_per_second: DEFAULT_TICKS_PER_SECOND,
            latency_polls: 0,
            wedged: false,
            allocation_budget: None,
            timestamps: Vec::new(),
            validities: Vec::new(),
            commands: Vec::new(),
            overwrites: 0,
        }
    }

    /// Set the clock frequency reported by validity queries
    pub fn with_ticks_per_second(mut self, ticks_per_second: u64) -> Self {
        self.ticks_per_second = ticks_per_second;
        self
    }

    /// Number of not-ready polls each result goes through before resolving
    pub fn with_latency_polls(mut self, polls: u32) -> Self {
        self.latency_polls = polls;
        self
    }

    /// Start the clock at an arbitrary tick count
    pub fn with_clock(mut self, ticks: u64) -> Self {
        self.clock = ticks;
        self
    }

    pub fn ticks_per_second(&self) -> u64 {
        self.ticks_per_second
    }

    pub fn clock(&self) -> u64 {
        self.clock
    }

    /// Advance the clock as if `ticks` of GPU work executed
    pub fn execute(&mut self, ticks: u64) {
        self.clock = self.clock.wrapping_add(ticks);
    }

    /// Advance the clock by `millis` of GPU work
    pub fn execute_ms(&mut self, millis: f64) {
        self.execute(millis_to_ticks(millis, self.ticks_per_second));
    }

    /// Mark every currently open validity interval as disjoint
    pub fn inject_discontinuity(&mut self) {
        for state in self.validities.iter_mut().flatten() {
            if state.open {
                state.disjoint = true;
            }
        }
    }

    /// Stop resolving results: every poll reports not-ready until `unwedge`
    pub fn wedge(&mut self) {
        self.wedged = true;
    }

    pub fn unwedge(&mut self) {
        self.wedged = false;
    }

    /// Let `n` more query allocations succeed, then refuse the rest
    pub fn fail_allocation_after(&mut self, n: usize) {
        self.allocation_budget = Some(n);
    }

    /// Query objects allocated and not yet released
    pub fn live_queries(&self) -> usize {
        self.timestamps.iter().flatten().count() + self.validities.iter().flatten().count()
    }

    /// Recorded command stream, oldest first
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Times a query was re-recorded before its previous result was read
    pub fn overwrites(&self) -> u64 {
        self.overwrites
    }

    fn allocate(&mut self) -> Result<(), DeviceError> {
        match self.allocation_budget {
            Some(0) => Err(DeviceError("simulated device out of query objects".to_string())),
            Some(ref mut n) => {
                *n -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn timestamp_mut(&mut self, id: usize) -> &mut TimestampState {
        self.timestamps[id]
            .as_mut()
            .unwrap_or_else(|| panic!("timestamp query {} used after release", id))
    }

    fn validity_mut(&mut self, id: usize) -> &mut ValidityState {
        self.validities[id]
            .as_mut()
            .unwrap_or_else(|| panic!("validity query {} used after release", id))
    }
}

impl TimingDevice for SimulatedDevice {
    type Timestamp = SimTimestamp;
    type Validity = SimValidity;

    fn create_timestamp_query(&mut self) -> Result<SimTimestamp, DeviceError> {
        self.allocate()?;
        self.timestamps.push(Some(TimestampState::default()));
        Ok(SimTimestamp(self.timestamps.len() - 1))
    }

    fn create_validity_query(&mut self) -> Result<SimValidity, DeviceError> {
        self.allocate()?;
        self.validities.push(Some(ValidityState::default()));
        Ok(SimValidity(self.validities.len() - 1))
    }

    fn begin_validity(&mut self, query: &SimValidity) {
        self.commands.push(Command::BeginValidity(query.0));
        let state = self.validity_mut(query.0);
        let overwritten = state.unread || state.open;
        *state = ValidityState {
            open: true,
            ..ValidityState::default()
        };
        if overwritten {
            self.overwrites += 1;
        }
    }

    fn end_validity(&mut self, query: &SimValidity) {
        self.commands.push(Command::EndValidity(query.0));
        let record = ValidityRecord {
            is_valid: true,
            ticks_per_second: self.ticks_per_second,
        };
        let latency = self.latency_polls;
        let state = self.validity_mut(query.0);
        state.open = false;
        state.record = Some(ValidityRecord {
            is_valid: !state.disjoint,
            ..record
        });
        state.polls_remaining = latency;
        state.unread = true;
    }

    fn end_timestamp(&mut self, query: &SimTimestamp) {
        self.commands.push(Command::EndTimestamp(query.0));
        let (clock, latency) = (self.clock, self.latency_polls);
        let state = self.timestamp_mut(query.0);
        let overwritten = state.unread;
        *state = TimestampState {
            ticks: Some(clock),
            polls_remaining: latency,
            unread: true,
        };
        if overwritten {
            self.overwrites += 1;
        }
    }

    fn poll_timestamp(&mut self, query: &SimTimestamp) -> Poll<u64> {
        if self.wedged {
            return Poll::Pending;
        }
        let state = self.timestamp_mut(query.0);
        match state.ticks {
            Some(_) if state.polls_remaining > 0 => {
                state.polls_remaining -= 1;
                Poll::Pending
            }
            Some(ticks) => {
                state.unread = false;
                Poll::Ready(ticks)
            }
            None => Poll::Pending,
        }
    }

    fn poll_validity(&mut self, query: &SimValidity) -> Poll<ValidityRecord> {
        if self.wedged {
            return Poll::Pending;
        }
        let state = self.validity_mut(query.0);
        match state.record {
            Some(_) if state.polls_remaining > 0 => {
                state.polls_remaining -= 1;
                Poll::Pending
            }
            Some(record) => {
                state.unread = false;
                Poll::Ready(record)
            }
            None => Poll::Pending,
        }
    }

    fn release_timestamp_query(&mut self, query: SimTimestamp) {
        self.timestamps[query.0] = None;
    }

    fn release_validity_query(&mut self, query: SimValidity) {
        self.validities[query.0] = None;
    }
}
