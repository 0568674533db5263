//! Randomised pacing between send attempts
//!
//! Every wait is drawn uniformly from
//! `[base_delay * (1 - jitter), base_delay * (1 + jitter)]` so the send
//! pattern never settles on a fixed period.
//!
//! # Example
//!
//! ```text
//! base_delay: 40s, jitter: 0.5
//! - every wait lies between 20s and 60s
//! - the mean wait is 40s
//! ```

use std::time::Duration;

use courier_common::tracing;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{error::DispatchError, shutdown::ShutdownListener};

/// Configuration for pacing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Mean delay between attempts, in seconds. Must be greater than zero.
    #[serde(default = "default_base_delay_secs")]
    pub base_delay_secs: f64,

    /// Fraction of the base delay to randomise by, between 0 and 1.
    #[serde(default = "default_jitter")]
    pub jitter: f64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            base_delay_secs: default_base_delay_secs(),
            jitter: default_jitter(),
        }
    }
}

const fn default_base_delay_secs() -> f64 {
    40.0
}

const fn default_jitter() -> f64 {
    0.5 // ±50%
}

/// How a wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Elapsed,
    Cancelled,
}

/// Jittered delay between sends
#[derive(Debug, Clone)]
pub struct RateLimiter {
    base_delay: f64,
    jitter: f64,
}

impl RateLimiter {
    /// Create a rate limiter, rejecting a non-positive delay and clamping
    /// jitter into `[0, 1]`.
    ///
    /// # Errors
    /// [`DispatchError::InvalidConfiguration`] when the base delay is not a
    /// positive, finite number of seconds, or when the longest jittered wait
    /// does not fit a [`Duration`].
    pub fn new(config: &RateLimitConfig) -> Result<Self, DispatchError> {
        if !config.base_delay_secs.is_finite() || config.base_delay_secs <= 0.0 {
            return Err(DispatchError::InvalidConfiguration(format!(
                "base delay must be greater than zero, got {}",
                config.base_delay_secs
            )));
        }

        let jitter = if config.jitter.is_nan() {
            0.0
        } else {
            config.jitter.clamp(0.0, 1.0)
        };
        if (jitter - config.jitter).abs() > f64::EPSILON || config.jitter.is_nan() {
            tracing::warn!(
                requested = config.jitter,
                used = jitter,
                "Jitter must lie between 0 and 1, clamping"
            );
        }

        let longest = config.base_delay_secs * (1.0 + jitter);
        if Duration::try_from_secs_f64(longest).is_err() {
            return Err(DispatchError::InvalidConfiguration(format!(
                "base delay of {}s with jitter {jitter} exceeds the longest possible wait",
                config.base_delay_secs
            )));
        }

        Ok(Self {
            base_delay: config.base_delay_secs,
            jitter,
        })
    }

    /// Shortest and longest possible wait.
    #[must_use]
    pub fn bounds(&self) -> (Duration, Duration) {
        (
            Duration::from_secs_f64(self.base_delay * (1.0 - self.jitter)),
            Duration::from_secs_f64(self.base_delay * (1.0 + self.jitter)),
        )
    }

    /// Draw one wait duration.
    #[must_use]
    pub fn sample(&self) -> Duration {
        let low = self.base_delay * (1.0 - self.jitter);
        let high = self.base_delay * (1.0 + self.jitter);

        Duration::from_secs_f64(rand::rng().random_range(low..=high))
    }

    /// Sleep for one sampled interval, returning early on shutdown.
    pub async fn wait(&self, shutdown: &mut ShutdownListener) -> WaitOutcome {
        let delay = self.sample();
        tracing::debug!(
            wait_seconds = delay.as_secs_f64(),
            "Sleeping before next email"
        );

        tokio::select! {
            () = tokio::time::sleep(delay) => WaitOutcome::Elapsed,
            () = shutdown.triggered() => WaitOutcome::Cancelled,
        }
    }
}
