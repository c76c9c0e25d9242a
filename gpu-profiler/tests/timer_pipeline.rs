//! Integration test: bracket → retire → report through the simulated device
//!
//! Exercises the whole timer against a deterministic in-order device with
//! delayed result resolution, without requiring a GPU.

use gputimer_profiler::sim::SimulatedDevice;
use gputimer_profiler::{GpuTimer, TimerConfig};

fn timer_with(device: &mut SimulatedDevice, capacity: usize, warmup: u64) -> GpuTimer<SimulatedDevice> {
    let config = TimerConfig {
        capacity,
        warmup_count: warmup,
        ..TimerConfig::default()
    };
    GpuTimer::with_config(device, &config).unwrap()
}

fn bracket(timer: &mut GpuTimer<SimulatedDevice>, device: &mut SimulatedDevice, ms: f64) {
    timer.bracket_begin(device).unwrap();
    device.execute_ms(ms);
    timer.bracket_end(device);
}

#[test]
fn test_end_to_end_summary_line() {
    let mut device = SimulatedDevice::new().with_latency_polls(4);
    let mut timer = timer_with(&mut device, 4, 0);

    for ms in [1.0, 1.0, 1.0, 2.0, 2.0, 2.0, 3.0, 3.0, 3.0, 3.0] {
        bracket(&mut timer, &mut device, ms);
        // Idle time between brackets must not leak into measurements.
        device.execute_ms(0.5);
    }

    let line = timer.report(&mut device, "e2e").unwrap();
    assert_eq!(
        line.as_deref(),
        Some("e2e, 1.000,1.000,2.000,3.000,3.000, 2.100,0.876")
    );
    assert_eq!(timer.issue_idx(), 10);
    assert_eq!(timer.retire_idx(), 10);
    assert_eq!(timer.counters().accepted, 10);
    assert_eq!(device.overwrites(), 0);
}

#[test]
fn test_full_drain_for_any_capacity() {
    for capacity in [1, 2, 4, 16] {
        for n in [0u64, 1, 3, capacity as u64, 3 * capacity as u64 + 1] {
            let mut device = SimulatedDevice::new().with_latency_polls(1);
            let mut timer = timer_with(&mut device, capacity, 0);

            for i in 0..n {
                bracket(&mut timer, &mut device, 1.0 + i as f64);
            }
            let _ = timer.report(&mut device, "drain").unwrap();

            assert_eq!(timer.issue_idx(), n, "capacity {} n {}", capacity, n);
            assert_eq!(timer.retire_idx(), n, "capacity {} n {}", capacity, n);
            assert_eq!(timer.in_flight(), 0);
            assert_eq!(device.overwrites(), 0);
        }
    }
}

#[test]
fn test_capacity_plus_one_forces_retirement_before_reuse() {
    let capacity = 8;
    let mut device = SimulatedDevice::new().with_latency_polls(2);
    let mut timer = timer_with(&mut device, capacity, 0);

    for i in 0..capacity {
        bracket(&mut timer, &mut device, 1.0);
        assert_eq!(timer.in_flight(), i as u64 + 1);
        assert_eq!(timer.retire_idx(), 0);
    }

    bracket(&mut timer, &mut device, 1.0);
    assert!(timer.retire_idx() >= 1);
    assert!(timer.in_flight() <= capacity as u64);
    assert_eq!(timer.counters().forced_retirements, 1);
    assert_eq!(device.overwrites(), 0);
}

#[test]
fn test_report_twice_does_not_duplicate() {
    let mut device = SimulatedDevice::new();
    let mut timer = timer_with(&mut device, 4, 0);
    for ms in [2.0, 4.0, 6.0] {
        bracket(&mut timer, &mut device, ms);
    }

    let first = timer.report(&mut device, "frame").unwrap();
    let second = timer.report(&mut device, "frame").unwrap();
    assert_eq!(
        first.as_deref(),
        Some("frame, 2.000,2.000,4.000,4.000,6.000, 4.000,2.000")
    );
    assert!(second.is_none());

    // Under two samples: neither call reports.
    bracket(&mut timer, &mut device, 1.0);
    assert!(timer.report(&mut device, "frame").unwrap().is_none());
    assert!(timer.report(&mut device, "frame").unwrap().is_none());
}

#[test]
fn test_warmup_discards_first_retirements() {
    let mut device = SimulatedDevice::new().with_latency_polls(1);
    let mut timer = timer_with(&mut device, 4, 2);

    for ms in [100.0, 50.0, 1.0, 2.0, 3.0] {
        bracket(&mut timer, &mut device, ms);
    }
    let summary = timer.summarize(&mut device, "warm").unwrap().unwrap();

    assert_eq!(summary.count, 3);
    assert_eq!(summary.quantiles(), [1.0, 1.0, 2.0, 2.0, 3.0]);
    assert_eq!(timer.counters().discarded_warmup, 2);
}

#[test]
fn test_invalid_samples_excluded_and_not_counted() {
    let mut device = SimulatedDevice::new();
    let mut timer = timer_with(&mut device, 4, 0);

    bracket(&mut timer, &mut device, 1.0);

    timer.bracket_begin(&mut device).unwrap();
    device.execute_ms(40.0);
    device.inject_discontinuity();
    timer.bracket_end(&mut device);

    // One valid, one invalid: below the two-sample minimum.
    assert!(timer.report(&mut device, "unstable").unwrap().is_none());
    assert_eq!(timer.counters().discarded_invalid, 1);
    assert_eq!(timer.samples(), &[1.0]);

    bracket(&mut timer, &mut device, 3.0);
    let line = timer.report(&mut device, "unstable").unwrap();
    assert_eq!(
        line.as_deref(),
        Some("unstable, 1.000,1.000,1.000,1.000,3.000, 2.000,1.414")
    );
}

#[test]
fn test_invalid_sample_during_warmup_counts_as_warmup() {
    let mut device = SimulatedDevice::new();
    let mut timer = timer_with(&mut device, 2, 1);

    timer.bracket_begin(&mut device).unwrap();
    device.inject_discontinuity();
    timer.bracket_end(&mut device);
    bracket(&mut timer, &mut device, 1.0);
    bracket(&mut timer, &mut device, 1.0);

    let _ = timer.report(&mut device, "x").unwrap();
    let counters = timer.counters();
    assert_eq!(counters.discarded_warmup, 1);
    assert_eq!(counters.discarded_invalid, 0);
    assert_eq!(counters.accepted, 2);
}

#[test]
fn test_large_clock_values_keep_precision() {
    let mut device = SimulatedDevice::new()
        .with_ticks_per_second(1_000_000_000)
        .with_clock(u64::MAX / 4);
    let mut timer = timer_with(&mut device, 4, 0);

    for _ in 0..4 {
        timer.bracket_begin(&mut device).unwrap();
        device.execute(1_234_567);
        timer.bracket_end(&mut device);
    }
    let summary = timer.summarize(&mut device, "ns clock").unwrap().unwrap();
    assert!((summary.mean - 1.234567).abs() < 1e-9);
    assert!(summary.stddev.abs() < 1e-12);
}

#[test]
fn test_creation_failure_surfaces_and_leaks_nothing() {
    let mut device = SimulatedDevice::new();
    device.fail_allocation_after(5);

    let config = TimerConfig::default();
    let err = GpuTimer::with_config(&mut device, &config).unwrap_err();
    assert!(!err.is_transient());
    assert!(err.to_string().contains("validity query for ring slot 1"));
    assert_eq!(device.live_queries(), 0);
}
