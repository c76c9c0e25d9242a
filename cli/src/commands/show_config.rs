//! Config command implementation

use crate::settings;
use anyhow::{Context, Result};
use clap::Args;
use gputimer_profiler::TimerConfig;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// TOML file with timer settings
    #[arg(short, long, env = "GPUTIMER_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Render a configuration the way it would be written to a file
pub fn render(config: &TimerConfig) -> Result<String> {
    toml::to_string_pretty(config).context("Failed to serialize configuration")
}

pub fn run(args: ConfigArgs) -> Result<()> {
    let config = settings::load_config(args.config.as_deref())?;
    config.validate().context("Invalid configuration")?;
    print!("{}", render(&config)?);
    Ok(())
}
