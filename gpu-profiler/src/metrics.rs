//! Process-wide Prometheus metrics for GPU timers

use once_cell::sync::Lazy;
use prometheus::{
    register_counter, register_counter_vec, Counter, CounterVec, Encoder, TextEncoder,
};

// ── Bracket metrics ──────────────────────────────────────────────────────────

pub static BRACKETS_ISSUED: Lazy<Counter> = Lazy::new(|| {
    register_counter!("gputimer_brackets_issued_total", "Timing brackets opened").unwrap()
});

pub static SAMPLES_RETIRED: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "gputimer_samples_retired_total",
        "Retired timing samples by outcome",
        &["outcome"]
    )
    .unwrap()
});

pub static FORCED_RETIREMENTS: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "gputimer_forced_retirements_total",
        "Retirements forced to free a ring slot before issue"
    )
    .unwrap()
});

// ── Poll metrics ─────────────────────────────────────────────────────────────

pub static POLLS_NOT_READY: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "gputimer_polls_not_ready_total",
        "Device polls that returned not-ready"
    )
    .unwrap()
});

pub static POLL_TIMEOUTS: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "gputimer_poll_timeouts_total",
        "Retirements abandoned because a poll timeout expired"
    )
    .unwrap()
});

/// Render all registered metrics to Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}
