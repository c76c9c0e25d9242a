//! Simulate command implementation
//!
//! Drives a timer against the in-memory simulated device with a synthetic
//! workload and prints one summary line per phase.

use crate::output;
use crate::settings;
use anyhow::{Context, Result};
use clap::Args;
use gputimer_profiler::sim::{SimulatedDevice, DEFAULT_TICKS_PER_SECOND};
use gputimer_profiler::{metrics, GpuTimer, TimerConfig, WaitStrategy};
use gputimer_shared::TimingReport;
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Elapsed GPU milliseconds per bracket, cycled (e.g. "1,1,2,3")
    #[arg(short, long, default_value = "1.0")]
    pub workload: String,

    /// Brackets per phase
    #[arg(short = 'n', long, default_value = "100")]
    pub brackets: u64,

    /// Number of phases; each phase ends with a report
    #[arg(long, default_value = "1")]
    pub phases: u32,

    /// Initial retired measurements to throw away
    #[arg(long)]
    pub warmup: Option<u64>,

    /// Ring slots (power of two)
    #[arg(long)]
    pub capacity: Option<usize>,

    /// Poll pacing while waiting for results: spin, yield or backoff
    #[arg(long)]
    pub wait: Option<WaitStrategy>,

    /// Give up waiting on a single query after this long (e.g. "500ms", "2s")
    #[arg(long)]
    pub timeout: Option<String>,

    /// Not-ready polls before each simulated result resolves
    #[arg(long, default_value = "2")]
    pub latency_polls: u32,

    /// Simulated clock frequency
    #[arg(long, default_value_t = DEFAULT_TICKS_PER_SECOND)]
    pub ticks_per_second: u64,

    /// Inject a clock discontinuity into every Nth bracket
    #[arg(long)]
    pub invalid_every: Option<u64>,

    /// Idle GPU milliseconds between brackets
    #[arg(long, default_value = "0")]
    pub idle_ms: f64,

    /// Label printed at the start of each summary line
    #[arg(short, long, default_value = "simulated")]
    pub label: String,

    /// TOML file with timer settings (overridden by flags)
    #[arg(short, long, env = "GPUTIMER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Also write the reports in JSON format
    #[arg(long)]
    pub json: Option<String>,

    /// Print Prometheus metrics after the run
    #[arg(long)]
    pub metrics: bool,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Synthetic workload shape, independent of argument parsing
#[derive(Debug, Clone, PartialEq)]
pub struct Workload {
    pub durations_ms: Vec<f64>,
    pub brackets: u64,
    pub phases: u32,
    pub idle_ms: f64,
    pub invalid_every: Option<u64>,
}

/// Parse a comma-separated list of non-negative millisecond values
pub fn parse_workload(s: &str) -> Result<Vec<f64>> {
    let durations = s
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            let ms: f64 = part
                .parse()
                .with_context(|| format!("Invalid workload duration: {}", part))?;
            if !ms.is_finite() || ms < 0.0 {
                anyhow::bail!("Workload durations must be non-negative: {}", part);
            }
            Ok(ms)
        })
        .collect::<Result<Vec<_>>>()?;

    if durations.is_empty() {
        anyhow::bail!("Workload must contain at least one duration");
    }
    Ok(durations)
}

/// Merge file/env configuration with command-line overrides
fn resolve_config(args: &SimulateArgs) -> Result<TimerConfig> {
    let mut config = settings::load_config(args.config.as_deref())?;

    if let Some(capacity) = args.capacity {
        config.capacity = capacity;
    }
    if let Some(warmup) = args.warmup {
        config.warmup_count = warmup;
    }
    if let Some(wait) = args.wait {
        config.wait = wait;
    }
    if let Some(ref timeout) = args.timeout {
        let timeout = gputimer_shared::utils::parse_duration(timeout)
            .context("Failed to parse timeout")?;
        config.timeout_ms = Some(timeout.as_millis() as u64);
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Run every phase of `workload` through a fresh timer on `device`
pub fn run_workload(
    device: &mut SimulatedDevice,
    config: &TimerConfig,
    workload: &Workload,
    label: &str,
) -> Result<Vec<TimingReport>> {
    let mut timer = GpuTimer::create_or_exit(device, config);
    let mut reports = Vec::with_capacity(workload.phases as usize);
    let mut bracket = 0u64;

    for phase in 0..workload.phases {
        debug!(phase, brackets = workload.brackets, "starting phase");

        for _ in 0..workload.brackets {
            let ms = workload.durations_ms[(bracket as usize) % workload.durations_ms.len()];
            bracket += 1;

            timer.bracket_begin(device)?;
            device.execute_ms(ms);
            if matches!(workload.invalid_every, Some(n) if n > 0 && bracket % n == 0) {
                device.inject_discontinuity();
            }
            timer.bracket_end(device);
            device.execute_ms(workload.idle_ms);
        }

        let summary = timer.summarize(device, label)?;
        reports.push(TimingReport::new(label, summary, timer.counters()));
    }

    timer.destroy(device);
    Ok(reports)
}

pub fn run(args: SimulateArgs) -> Result<()> {
    let config = resolve_config(&args)?;
    let workload = Workload {
        durations_ms: parse_workload(&args.workload)?,
        brackets: args.brackets,
        phases: args.phases.max(1),
        idle_ms: args.idle_ms.max(0.0),
        invalid_every: args.invalid_every,
    };

    info!(
        brackets = workload.brackets,
        phases = workload.phases,
        capacity = config.capacity,
        warmup = config.warmup_count,
        "Starting simulated run"
    );

    let mut device = SimulatedDevice::new()
        .with_ticks_per_second(args.ticks_per_second)
        .with_latency_polls(args.latency_polls);

    let reports = run_workload(&mut device, &config, &workload, &args.label)?;

    for report in &reports {
        match report.line() {
            Some(line) => println!("{}", line),
            None => output::warning(&format!(
                "{}: fewer than two valid samples, nothing to report",
                report.label
            )),
        }
    }

    if let Some(last) = reports.last() {
        let c = last.counters;
        output::info(&format!(
            "issued={} retired={} accepted={} warmup={} invalid={} forced={}",
            c.issued, c.retired, c.accepted, c.discarded_warmup, c.discarded_invalid, c.forced_retirements
        ));
    }

    if let Some(ref path) = args.json {
        output::write_json_reports(&reports, path)?;
        output::success(&format!("Reports written to {}", path));
    }

    if args.metrics {
        print!("{}", metrics::encode_metrics());
    }

    Ok(())
}
