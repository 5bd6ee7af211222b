//! Retry scheduling for failed deliveries.

use std::time::Duration;

/// Decides when a failed delivery is attempted again.
pub trait RetryStrategy: Send + Sync {
    /// Returns the delay before the next attempt, or None once `attempt`
    /// exhausts the budget. `attempt` is the number of attempts already
    /// made.
    fn next_delay(&self, attempt: u32) -> Option<Duration>;

    /// Returns the total attempt budget.
    fn max_attempts(&self) -> u32;

    /// Checks if another attempt remains.
    fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts()
    }
}

/// Doubling backoff: `base * 2^attempt`.
///
/// With the defaults (one-minute base, three attempts) a delivery is
/// retried 2 minutes after its first failure and 4 minutes after its
/// second; the third failure is terminal. The schedule is fixed, with
/// no jitter.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    /// Base delay.
    pub base: Duration,
    /// Total attempt budget.
    pub max_attempts: u32,
}

impl ExponentialBackoff {
    /// Creates the default schedule.
    pub fn new() -> Self {
        Self {
            base: Duration::from_secs(60),
            max_attempts: 3,
        }
    }

    /// Sets the base delay.
    pub fn base(mut self, base: Duration) -> Self {
        self.base = base;
        self
    }

    /// Sets the attempt budget.
    pub fn max_attempts(mut self, max: u32) -> Self {
        self.max_attempts = max;
        self
    }
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryStrategy for ExponentialBackoff {
    fn next_delay(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_attempts {
            return None;
        }

        let multiplier = 2_u32.saturating_pow(attempt);
        Some(self.base.saturating_mul(multiplier))
    }

    fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}
