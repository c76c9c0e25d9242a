//! Shared types and utilities for gputimer
//!
//! This crate contains the data structures exchanged between the profiler
//! library and the command-line driver: timing summaries, retirement counters
//! and the report envelope written to JSON, plus small tick/duration helpers.

pub mod types;
pub mod utils;

// Re-export commonly used types
pub use types::{counters::*, report::*, summary::*};
