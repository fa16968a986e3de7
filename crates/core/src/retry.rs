//! Retry schedules used across the crate.
//!
//! Delay schedules are data rather than inline sleeps: a caller that just
//! failed attempt N looks up the delay for N and decides whether another
//! attempt remains.

use std::time::Duration;

/// A bounded retry schedule with a fixed delay sequence.
#[derive(Debug, Clone, Copy)]
pub struct RetrySchedule {
    /// Total attempts allowed, including the first one.
    pub max_attempts: u32,
    /// Delay in seconds after each failed attempt (1-based index).
    delays_secs: &'static [u64],
}

impl RetrySchedule {
    /// Delay to wait after failed attempt `attempt` (1-based) before the next
    /// one. Attempts beyond the schedule reuse the last delay.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let idx = (attempt.saturating_sub(1) as usize).min(self.delays_secs.len() - 1);
        Duration::from_secs(self.delays_secs[idx])
    }

    /// Whether another attempt is allowed after `attempt` (1-based) failed.
    pub fn attempts_remain(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

/// Media download retries: exponential 5s, 10s, 20s.
pub const DOWNLOAD_RETRY: RetrySchedule = RetrySchedule {
    max_attempts: 3,
    delays_secs: &[5, 10, 20],
};

/// Whole-fetch re-attempts when a pass comes back empty: 60s, 120s, 180s.
pub const FETCH_RETRY: RetrySchedule = RetrySchedule {
    max_attempts: 3,
    delays_secs: &[60, 120, 180],
};

/// Deleting files the upload client may still hold open: 2s, 4s, 6s.
pub const UNLOCK_RETRY: RetrySchedule = RetrySchedule {
    max_attempts: 3,
    delays_secs: &[2, 4, 6],
};
