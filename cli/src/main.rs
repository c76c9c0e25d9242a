//! CLI for gputimer
//!
//! Commands:
//! - simulate: run a synthetic workload through the GPU timer on the
//!   simulated device and print the summary line
//! - config: print the effective timer configuration

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod output;
mod settings;

#[derive(Parser)]
#[command(name = "gputimer")]
#[command(about = "gputimer - asynchronous GPU latency profiler", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Time a synthetic workload on the simulated device
    Simulate(commands::simulate::SimulateArgs),

    /// Print the effective timer configuration as TOML
    Config(commands::show_config::ConfigArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate(args) => {
            init_tracing(args.verbose);
            commands::simulate::run(args)
        }
        Commands::Config(args) => {
            init_tracing(false);
            commands::show_config::run(args)
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    // Logs go to stderr so stdout carries only report lines.
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}
