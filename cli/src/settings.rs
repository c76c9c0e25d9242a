//! Layered timer configuration: defaults, optional TOML file, environment

use anyhow::{Context, Result};
use gputimer_profiler::TimerConfig;
use std::path::Path;

/// Environment variable prefix, e.g. `GPUTIMER_CAPACITY=8`
pub const ENV_PREFIX: &str = "GPUTIMER";

/// Load a [`TimerConfig`].
///
/// Fields missing from every source keep their defaults. Environment
/// variables override the file.
pub fn load_config(path: Option<&Path>) -> Result<TimerConfig> {
    let mut builder = config::Config::builder();

    if let Some(path) = path {
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }
        builder = builder.add_source(config::File::from(path));
    }

    builder = builder.add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true));

    let settings = builder
        .build()
        .context("Failed to read configuration sources")?;
    settings
        .try_deserialize()
        .context("Failed to parse timer configuration")
}
