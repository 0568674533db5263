//! Retry policy for send attempts.
//!
//! A failed send is only repeated when nothing reached the server (see
//! [`SendError::is_retryable`](crate::SendError::is_retryable)), and always
//! through the same account. The loop state is an explicit
//! `(attempts_remaining, backoff)` pair so the schedule can be tested on its own.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Retry configuration for one recipient's send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts per recipient, including the first.
    ///
    /// Default: 1 (no retries)
    #[serde(default = "defaults::max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry (in seconds), doubled after each retry.
    ///
    /// Default: 30 seconds
    #[serde(default = "defaults::base_delay_secs")]
    pub base_delay_secs: u64,

    /// Upper bound for the backoff (in seconds).
    ///
    /// Default: 300 seconds (5 minutes)
    #[serde(default = "defaults::max_delay_secs")]
    pub max_delay_secs: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: defaults::max_attempts(),
            base_delay_secs: defaults::base_delay_secs(),
            max_delay_secs: defaults::max_delay_secs(),
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh loop state for one recipient.
    #[must_use]
    pub fn start(&self) -> RetryState {
        RetryState {
            attempts_remaining: self.max_attempts.saturating_sub(1),
            backoff: Duration::from_secs(self.base_delay_secs.min(self.max_delay_secs)),
            max_delay: Duration::from_secs(self.max_delay_secs),
        }
    }
}

/// Where a recipient's retry loop currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryState {
    attempts_remaining: u32,
    backoff: Duration,
    max_delay: Duration,
}

impl RetryState {
    /// Consume one retry, returning how long to wait before it, or `None`
    /// once no attempts remain.
    pub fn next_backoff(&mut self) -> Option<Duration> {
        if self.attempts_remaining == 0 {
            return None;
        }

        self.attempts_remaining -= 1;
        let delay = self.backoff;
        self.backoff = self.backoff.saturating_mul(2).min(self.max_delay);
        Some(delay)
    }

    #[must_use]
    pub const fn attempts_remaining(&self) -> u32 {
        self.attempts_remaining
    }
}

mod defaults {
    pub const fn max_attempts() -> u32 {
        1
    }

    pub const fn base_delay_secs() -> u64 {
        30
    }

    pub const fn max_delay_secs() -> u64 {
        300 // 5 minutes
    }
}
