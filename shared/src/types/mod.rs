//! Data types shared across the workspace

pub mod counters;
pub mod report;
pub mod summary;
