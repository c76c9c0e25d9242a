//! Asynchronous GPU timer
//!
//! Brackets GPU work with timestamp and validity queries and retires the
//! results lazily. At most `capacity - 1` brackets are kept in flight; the
//! next `bracket_begin` retires the oldest one first (blocking on the device
//! if needed). `report` drains everything and summarizes.
//!
//! ```text
//! bracket_begin ─► [retire oldest while depth > cap-1] ─► begin validity, begin ts
//! bracket_end   ─► end ts, end validity   (slot issue_idx - 1)
//! report        ─► retire all ─► summarize ─► clear
//! ```

use crate::config::TimerConfig;
use crate::device::TimingDevice;
use crate::error::TimerError;
use crate::metrics;
use crate::retire::{self, Outcome};
use crate::ring::QueryRing;
use crate::scheduler::InFlight;
use crate::stats::StatsAggregator;
use crate::wait::PollPolicy;
use gputimer_shared::{TimerCounters, TimingSummary};
use tracing::{debug, info, trace, warn};

/// Latency profiler over a ring of device timing queries.
///
/// Single-threaded: every call takes `&mut self` and the device explicitly.
/// Begin and end must strictly alternate with one open bracket at a time.
pub struct GpuTimer<D: TimingDevice> {
    ring: QueryRing<D>,
    window: InFlight,
    warmup_count: u64,
    policy: PollPolicy,
    stats: StatsAggregator,
    counters: TimerCounters,
    bracket_open: bool,
}

impl<D: TimingDevice> GpuTimer<D> {
    /// Timer with the default ring and the given warmup window
    pub fn new(device: &mut D, warmup_count: u64) -> Result<Self, TimerError> {
        Self::with_config(device, &TimerConfig::with_warmup(warmup_count))
    }

    /// Timer built from an explicit configuration
    pub fn with_config(device: &mut D, config: &TimerConfig) -> Result<Self, TimerError> {
        let ring = QueryRing::create(device, config.capacity)?;

        info!(
            capacity = config.capacity,
            warmup = config.warmup_count,
            wait = ?config.wait,
            timeout_ms = ?config.timeout_ms,
            "GPU timer created"
        );

        Ok(Self {
            window: InFlight::new(ring.capacity()),
            ring,
            warmup_count: config.warmup_count,
            policy: config.poll_policy(),
            stats: StatsAggregator::new(),
            counters: TimerCounters::default(),
            bracket_open: false,
        })
    }

    /// Like [`GpuTimer::with_config`], but a device that cannot allocate the
    /// ring is fatal: the error is printed to stderr and the process exits with
    /// status 1.
    pub fn create_or_exit(device: &mut D, config: &TimerConfig) -> Self {
        match Self::with_config(device, config) {
            Ok(timer) => timer,
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }

    /// Release every query object. Pending measurements are not drained.
    pub fn destroy(self, device: &mut D) {
        if self.window.pending() > 0 {
            debug!(
                pending = self.window.pending(),
                "destroying timer with undrained brackets"
            );
        }
        self.ring.release(device);
        info!("GPU timer destroyed");
    }

    /// Open a bracket around the GPU work that follows.
    ///
    /// Retires the oldest in-flight bracket(s) first if the ring is full,
    /// which may block on the device.
    pub fn bracket_begin(&mut self, device: &mut D) -> Result<(), TimerError> {
        debug_assert!(
            !self.bracket_open,
            "bracket_begin called while a bracket is already open"
        );

        while self.window.must_retire_before_issue() {
            debug!(
                issue_idx = self.window.issue_idx(),
                retire_idx = self.window.retire_idx(),
                "ring full, forcing retirement"
            );
            self.retire_one(device)?;
            self.counters.forced_retirements += 1;
            metrics::FORCED_RETIREMENTS.inc();
        }

        let index = self.window.issue();
        let slot = self.ring.slot_at(index);
        device.begin_validity(&slot.validity);
        device.end_timestamp(&slot.begin);

        self.bracket_open = true;
        self.counters.issued += 1;
        metrics::BRACKETS_ISSUED.inc();
        Ok(())
    }

    /// Close the most recently opened bracket.
    pub fn bracket_end(&mut self, device: &mut D) {
        debug_assert!(
            self.bracket_open,
            "bracket_end called without a matching bracket_begin"
        );

        let slot = self.ring.slot_at(self.window.last_issued());
        device.end_timestamp(&slot.end);
        device.end_validity(&slot.validity);
        self.bracket_open = false;
    }

    /// Retire the oldest in-flight bracket (no-op when nothing is in flight).
    ///
    /// On a poll timeout the bracket stays in flight and nothing is counted;
    /// calling again resumes waiting on the same slot.
    pub fn retire_one(&mut self, device: &mut D) -> Result<(), TimerError> {
        if self.window.pending() == 0 {
            return Ok(());
        }
        let index = self.window.retire_idx();
        let slot = self.ring.slot_at(index);

        let sample = match retire::read_slot(device, slot, &self.policy, index) {
            Ok(sample) => sample,
            Err(e) => {
                warn!("{}", e);
                return Err(e);
            }
        };

        let outcome = sample.classify(self.warmup_count);
        match outcome {
            Outcome::Accepted(ms) => {
                self.stats.record(ms);
                self.counters.accepted += 1;
            }
            Outcome::Warmup => self.counters.discarded_warmup += 1,
            Outcome::Invalid => self.counters.discarded_invalid += 1,
        }
        trace!(index, outcome = outcome.as_str(), "retired sample");
        metrics::SAMPLES_RETIRED
            .with_label_values(&[outcome.as_str()])
            .inc();

        self.window.retire();
        self.counters.retired += 1;
        Ok(())
    }

    /// Retire every issued bracket.
    pub fn ensure_drained(&mut self, device: &mut D) -> Result<(), TimerError> {
        if self.window.pending() > 0 {
            debug!(pending = self.window.pending(), "draining in-flight brackets");
        }
        while self.window.exceeds(0) {
            self.retire_one(device)?;
        }
        Ok(())
    }

    /// Drain, summarize and clear the accepted samples.
    ///
    /// `None` when fewer than two samples were accepted since the last
    /// report (or reset); those samples are kept for the next report.
    pub fn summarize(
        &mut self,
        device: &mut D,
        label: &str,
    ) -> Result<Option<TimingSummary>, TimerError> {
        self.ensure_drained(device)?;

        let summary = self.stats.summarize(label);
        if summary.is_some() {
            self.stats.clear();
        }
        Ok(summary)
    }

    /// Drain and produce the one-line report:
    /// `label, min,q25,median,q75,max, mean,stddev`.
    pub fn report(&mut self, device: &mut D, label: &str) -> Result<Option<String>, TimerError> {
        let line = self.summarize(device, label)?.map(|s| s.to_string());
        match &line {
            Some(line) => debug!("{}", line),
            None => debug!(label, "not enough samples to report"),
        }
        Ok(line)
    }

    /// Drop the accepted samples to start measuring a new phase.
    /// In-flight brackets are unaffected and retire into the new phase.
    pub fn reset_stats(&mut self) {
        self.stats.clear();
    }

    pub fn issue_idx(&self) -> u64 {
        self.window.issue_idx()
    }

    pub fn retire_idx(&self) -> u64 {
        self.window.retire_idx()
    }

    /// Brackets issued but not yet retired
    pub fn in_flight(&self) -> u64 {
        self.window.pending()
    }

    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    pub fn warmup_count(&self) -> u64 {
        self.warmup_count
    }

    pub fn is_bracket_open(&self) -> bool {
        self.bracket_open
    }

    pub fn counters(&self) -> TimerCounters {
        self.counters
    }

    /// Samples accepted since the last report or reset
    pub fn samples(&self) -> &[f64] {
        self.stats.samples()
    }
}

impl<D: TimingDevice> std::fmt::Debug for GpuTimer<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuTimer")
            .field("capacity", &self.ring.capacity())
            .field("window", &self.window)
            .field("warmup_count", &self.warmup_count)
            .field("policy", &self.policy)
            .field("samples", &self.stats.len())
            .field("bracket_open", &self.bracket_open)
            .finish()
    }
}
