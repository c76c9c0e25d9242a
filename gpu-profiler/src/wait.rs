//! Blocking wait on a non-blocking device poll
//!
//! The device only offers single-shot polls; retirement needs a result. A
//! [`PollPolicy`] turns the former into the latter by re-polling with one of
//! the [`WaitStrategy`] pacing modes. Without a timeout the wait never gives
//! up: an unresponsive device blocks the calling thread.

use serde::{Deserialize, Serialize};
use std::task::Poll;
use std::time::{Duration, Instant};

/// How to pace re-polls of a query that is not ready yet
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum WaitStrategy {
    /// Busy-spin with a CPU spin-loop hint
    #[default]
    Spin,

    /// Yield the thread to the scheduler between polls
    Yield,

    /// Sleep between polls, doubling the delay up to `max_us`
    Backoff { initial_us: u64, max_us: u64 },
}

impl WaitStrategy {
    /// Backoff with a 1us start and a 1ms ceiling
    pub const DEFAULT_BACKOFF: WaitStrategy = WaitStrategy::Backoff {
        initial_us: 1,
        max_us: 1_000,
    };
}

impl std::str::FromStr for WaitStrategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "spin" => Ok(WaitStrategy::Spin),
            "yield" => Ok(WaitStrategy::Yield),
            "backoff" => Ok(WaitStrategy::DEFAULT_BACKOFF),
            _ => anyhow::bail!("Invalid wait strategy: {}", s),
        }
    }
}

/// A poll that did not complete within the policy's timeout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Elapsed {
    pub waited: Duration,
    pub attempts: u64,
}

/// Wait strategy plus optional deadline
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollPolicy {
    pub strategy: WaitStrategy,
    pub timeout: Option<Duration>,
}

impl PollPolicy {
    pub fn new(strategy: WaitStrategy, timeout: Option<Duration>) -> Self {
        Self { strategy, timeout }
    }

    /// Re-run `poll` until it yields a value or the timeout expires.
    ///
    /// Each not-ready poll is counted in the process-wide metrics.
    pub fn wait_for<T>(&self, mut poll: impl FnMut() -> Poll<T>) -> Result<T, Elapsed> {
        let started = self.timeout.map(|_| Instant::now());
        let mut attempts = 0u64;
        let mut delay = match self.strategy {
            WaitStrategy::Backoff { initial_us, .. } => Duration::from_micros(initial_us.max(1)),
            _ => Duration::ZERO,
        };

        loop {
            if let Poll::Ready(value) = poll() {
                return Ok(value);
            }
            attempts += 1;
            crate::metrics::POLLS_NOT_READY.inc();

            if let (Some(timeout), Some(started)) = (self.timeout, started) {
                let waited = started.elapsed();
                if waited >= timeout {
                    return Err(Elapsed { waited, attempts });
                }
            }

            match self.strategy {
                WaitStrategy::Spin => std::hint::spin_loop(),
                WaitStrategy::Yield => std::thread::yield_now(),
                WaitStrategy::Backoff { max_us, .. } => {
                    std::thread::sleep(delay);
                    delay = (delay * 2).min(Duration::from_micros(max_us.max(1)));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready_after<T: Copy>(polls: u32, value: T) -> impl FnMut() -> Poll<T> {
        let mut remaining = polls;
        move || {
            if remaining == 0 {
                Poll::Ready(value)
            } else {
                remaining -= 1;
                Poll::Pending
            }
        }
    }

    #[test]
    fn test_every_strategy_eventually_returns() {
        for strategy in [
            WaitStrategy::Spin,
            WaitStrategy::Yield,
            WaitStrategy::Backoff {
                initial_us: 1,
                max_us: 8,
            },
        ] {
            let policy = PollPolicy::new(strategy, None);
            assert_eq!(policy.wait_for(ready_after(5, 42u64)), Ok(42));
        }
    }

    #[test]
    fn test_timeout_reports_elapsed() {
        let policy = PollPolicy::new(WaitStrategy::Yield, Some(Duration::from_millis(5)));
        let err = policy.wait_for(|| Poll::<u64>::Pending).unwrap_err();
        assert!(err.waited >= Duration::from_millis(5));
        assert!(err.attempts >= 1);
    }

    #[test]
    fn test_ready_result_wins_over_timeout() {
        let policy = PollPolicy::new(WaitStrategy::Spin, Some(Duration::from_secs(5)));
        assert_eq!(policy.wait_for(ready_after(0, 'x')), Ok('x'));
    }

    #[test]
    fn test_parse_strategy() {
        assert_eq!("spin".parse::<WaitStrategy>().unwrap(), WaitStrategy::Spin);
        assert_eq!("YIELD".parse::<WaitStrategy>().unwrap(), WaitStrategy::Yield);
        assert_eq!(
            "backoff".parse::<WaitStrategy>().unwrap(),
            WaitStrategy::DEFAULT_BACKOFF
        );
        assert!("sleep".parse::<WaitStrategy>().is_err());
    }
}
