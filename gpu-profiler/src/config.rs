//! Timer configuration

use crate::ring::DEFAULT_CAPACITY;
use crate::wait::{PollPolicy, WaitStrategy};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Largest ring the configuration layer accepts
pub const MAX_CAPACITY: usize = 1024;

/// Construction-time settings for a [`crate::GpuTimer`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerConfig {
    /// Ring slots; a power of two. Pipeline depth is `capacity - 1`.
    pub capacity: usize,

    /// Number of initial retired measurements to throw away
    pub warmup_count: u64,

    /// Give up on a single query after this many milliseconds (None = wait forever)
    pub timeout_ms: Option<u64>,

    /// Pacing of the blocking poll during retirement
    pub wait: WaitStrategy,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            warmup_count: 0,
            timeout_ms: None,
            wait: WaitStrategy::Spin,
        }
    }
}

impl TimerConfig {
    /// Default configuration with the given warmup window
    pub fn with_warmup(warmup_count: u64) -> Self {
        Self {
            warmup_count,
            ..Self::default()
        }
    }

    /// Poll timeout, if one is configured
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Wait strategy and timeout used during retirement
    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy::new(self.wait, self.timeout())
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.capacity.is_power_of_two() {
            anyhow::bail!("Ring capacity must be a power of two, got {}", self.capacity);
        }

        if self.capacity > MAX_CAPACITY {
            anyhow::bail!("Ring capacity too large (max {})", MAX_CAPACITY);
        }

        if self.timeout_ms == Some(0) {
            anyhow::bail!("Poll timeout must be greater than 0");
        }

        if let WaitStrategy::Backoff { initial_us, max_us } = self.wait {
            if initial_us == 0 || max_us < initial_us {
                anyhow::bail!(
                    "Backoff needs 0 < initial_us <= max_us (got {} / {})",
                    initial_us,
                    max_us
                );
            }
        }

        Ok(())
    }
}
