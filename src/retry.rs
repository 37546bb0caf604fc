//! Whole-call retry for rotations.
//!
//! A rotation is retried as a unit: when a core step fails, the entire call
//! runs again after an exponentially growing delay. Reconciliation failures
//! never reach this layer because they are recorded, not raised.
//!
//! # Example
//!
//! ```rust,ignore
//! use keydra_iam::retry::RetryPolicy;
//! use std::time::Duration;
//!
//! let policy = RetryPolicy::new(3)
//!     .with_delays(Duration::from_secs(1), Duration::from_secs(30));
//! let result = policy.run(|| rotate_once(), |e| e.is_retryable()).await;
//! ```

use rand::Rng;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::RetrySettings;

/// How often, and how patiently, a rotation is attempted.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_delay: Duration,
    max_delay: Duration,
    multiplier: f64,
    jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_settings(&RetrySettings::default())
    }
}

impl RetryPolicy {
    /// A policy allowing `max_attempts` calls (at least one) with default delays.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// Replace the first delay and the cap on any delay.
    pub fn with_delays(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_delay = initial;
        self.max_delay = max;
        self
    }

    /// Build a policy from configuration.
    pub fn from_settings(settings: &RetrySettings) -> Self {
        Self {
            max_attempts: settings.max_attempts.max(1),
            initial_delay: settings.initial_delay,
            max_delay: settings.max_delay,
            multiplier: settings.multiplier,
            jitter: settings.jitter,
        }
    }

    /// Total number of calls the policy allows.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay slept after the failed call number `attempt` (0-indexed).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let millis = self.initial_delay.as_millis() as f64 * self.multiplier.powf(attempt as f64);
        let delay = Duration::from_millis(millis as u64).min(self.max_delay);

        if !self.jitter || delay.is_zero() {
            return delay;
        }
        Duration::from_millis(rand::rng().random_range(0..delay.as_millis() as u64))
    }

    /// Run `operation` until it succeeds, fails with an error `retryable`
    /// rejects, or the attempts run out.
    pub async fn run<F, Fut, T, E, P>(
        &self,
        mut operation: F,
        retryable: P,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
        P: Fn(&E) -> bool,
    {
        let mut attempt = 0;

        loop {
            debug!(attempt = attempt + 1, max_attempts = self.max_attempts, "Attempting");

            let error = match operation().await {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };
            attempt += 1;
            warn!(attempt, error = %error, "Attempt failed");

            if !retryable(&error) {
                return Err(RetryError::NotRetryable { attempts: attempt, error });
            }
            if attempt >= self.max_attempts {
                return Err(RetryError::Exhausted { attempts: attempt, error });
            }

            let delay = self.delay_after(attempt - 1);
            debug!(?delay, "Waiting before retry");
            tokio::time::sleep(delay).await;
        }
    }
}

/// Why [`RetryPolicy::run`] gave up.
#[derive(Debug)]
pub enum RetryError<E> {
    /// Every allowed attempt failed.
    Exhausted {
        /// Calls made
        attempts: u32,
        /// Error from the last call
        error: E,
    },

    /// A call failed with an error that must not be retried.
    NotRetryable {
        /// Calls made
        attempts: u32,
        /// The error
        error: E,
    },
}

impl<E> RetryError<E> {
    /// The error that ended the retries.
    pub fn into_inner(self) -> E {
        match self {
            RetryError::Exhausted { error, .. } | RetryError::NotRetryable { error, .. } => error,
        }
    }

    /// Number of calls made.
    pub fn attempts(&self) -> u32 {
        match self {
            RetryError::Exhausted { attempts, .. } | RetryError::NotRetryable { attempts, .. } => {
                *attempts
            }
        }
    }
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryError::Exhausted { attempts, error } => {
                write!(f, "Gave up after {} attempts: {}", attempts, error)
            }
            RetryError::NotRetryable { attempts, error } => {
                write!(f, "Not retryable (attempt {}): {}", attempts, error)
            }
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for RetryError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RetryError::Exhausted { error, .. } | RetryError::NotRetryable { error, .. } => {
                Some(error)
            }
        }
    }
}
