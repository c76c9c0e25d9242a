//! Output formatting utilities for CLI commands

use anyhow::{Context, Result};
use colored::Colorize;
use gputimer_shared::TimingReport;
use std::fs::File;
use std::io::BufWriter;
use tracing::info;

/// Print success message
pub fn success(msg: &str) {
    eprintln!("{} {}", "✓".green(), msg);
}

/// Print info message
pub fn info(msg: &str) {
    eprintln!("{} {}", "ℹ".blue(), msg);
}

/// Print warning message
pub fn warning(msg: &str) {
    eprintln!("{} {}", "⚠".yellow(), msg);
}

/// Write every report produced during a run as a JSON array
pub fn write_json_reports(reports: &[TimingReport], output_path: &str) -> Result<()> {
    info!("Generating JSON output: {}", output_path);

    let file = File::create(output_path)
        .with_context(|| format!("Failed to create output file: {}", output_path))?;

    let writer = BufWriter::new(file);

    serde_json::to_writer_pretty(writer, reports).context("Failed to serialize reports to JSON")?;

    info!("JSON output written to {}", output_path);

    Ok(())
}
