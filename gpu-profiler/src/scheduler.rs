//! Issue/retire bookkeeping for in-flight brackets
//!
//! Two monotonically increasing counters: `issue_idx` counts brackets opened,
//! `retire_idx` counts brackets whose results have been read back. The
//! difference is the pipeline depth, which is capped at `capacity - 1` before
//! every issue so a ring slot is never reused while its previous occupant is
//! still unread.

/// In-flight window over the query ring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InFlight {
    issue_idx: u64,
    retire_idx: u64,
    max_in_flight: u64,
}

impl InFlight {
    /// Window for a ring of `capacity` slots
    pub fn new(capacity: usize) -> Self {
        Self {
            issue_idx: 0,
            retire_idx: 0,
            max_in_flight: capacity.saturating_sub(1) as u64,
        }
    }

    pub fn issue_idx(&self) -> u64 {
        self.issue_idx
    }

    pub fn retire_idx(&self) -> u64 {
        self.retire_idx
    }

    /// Deepest pipeline allowed once a new bracket has been issued
    pub fn max_in_flight(&self) -> u64 {
        self.max_in_flight
    }

    /// Brackets issued but not yet retired
    pub fn pending(&self) -> u64 {
        self.issue_idx - self.retire_idx
    }

    /// True while more than `limit` brackets are in flight
    pub fn exceeds(&self, limit: u64) -> bool {
        self.pending() > limit
    }

    /// True if the oldest bracket must be retired before the next issue
    pub fn must_retire_before_issue(&self) -> bool {
        self.exceeds(self.max_in_flight)
    }

    /// Claim the next issue index
    pub fn issue(&mut self) -> u64 {
        debug_assert!(
            !self.must_retire_before_issue(),
            "issuing into a slot that has not been retired"
        );
        let index = self.issue_idx;
        self.issue_idx += 1;
        index
    }

    /// Index of the most recently issued bracket
    pub fn last_issued(&self) -> u64 {
        self.issue_idx.wrapping_sub(1)
    }

    /// Mark the oldest in-flight bracket retired and return its index
    pub fn retire(&mut self) -> u64 {
        debug_assert!(self.retire_idx < self.issue_idx, "retiring past issue");
        let index = self.retire_idx;
        self.retire_idx += 1;
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_caps_at_capacity_minus_one() {
        let mut window = InFlight::new(4);
        assert_eq!(window.max_in_flight(), 3);

        for expected in 0..4 {
            assert!(!window.must_retire_before_issue());
            assert_eq!(window.issue(), expected);
        }
        assert_eq!(window.pending(), 4);
        assert!(window.must_retire_before_issue());

        assert_eq!(window.retire(), 0);
        assert!(!window.must_retire_before_issue());
        assert_eq!(window.last_issued(), 3);
    }

    #[test]
    fn test_drain_limit() {
        let mut window = InFlight::new(2);
        window.issue();
        assert!(window.exceeds(0));
        window.retire();
        assert!(!window.exceeds(0));
        assert_eq!(window.issue_idx(), window.retire_idx());
    }
}
