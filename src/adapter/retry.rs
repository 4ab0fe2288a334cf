//! Backoff policy for transient adapter failures
//!
//! Only adapters retry. Local errors (validation, codec, version conflicts,
//! partial batches) classify as permanent and are returned on the first try.

use crate::config::RetrySettings;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Exponential backoff with optional jitter
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Attempts after the first one
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub multiplier: f64,
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_settings(&RetrySettings::default())
    }
}

impl RetryPolicy {
    pub fn from_settings(settings: &RetrySettings) -> Self {
        Self {
            max_retries: settings.max_retries,
            initial_backoff: Duration::from_millis(settings.initial_backoff_ms),
            max_backoff: Duration::from_millis(settings.max_backoff_ms),
            multiplier: settings.multiplier,
            jitter: settings.jitter,
        }
    }

    /// A policy that never retries
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Backoff before retry number `attempt` (zero-based)
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let base = self.initial_backoff.as_secs_f64() * self.multiplier.powi(attempt as i32);
        let capped = base.min(self.max_backoff.as_secs_f64());

        // Up to 25% extra
        let secs = if self.jitter {
            capped * (1.0 + jitter_fraction() * 0.25)
        } else {
            capped
        };

        Duration::from_secs_f64(secs)
    }
}

/// Pseudo-random fraction in [0, 1) from the clock's sub-second nanos
fn jitter_fraction() -> f64 {
    use std::time::SystemTime;
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    (nanos % 1000) as f64 / 1000.0
}

/// How a failed call should be handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry,
    /// Retry after the duration the remote asked for
    RetryAfter(Duration),
    NoRetry,
}

/// Errors that know whether they are worth retrying
pub trait RetryableError {
    fn retry_decision(&self) -> RetryDecision;
}

/// Run `operation` until it succeeds, fails permanently, or the policy gives up
pub async fn retry<F, Fut, T, E>(policy: &RetryPolicy, operation_name: &str, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: RetryableError + std::fmt::Display,
{
    let mut attempt = 0;

    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        let wait = match err.retry_decision() {
            RetryDecision::NoRetry => {
                debug!(operation = operation_name, attempt, "Permanent failure: {}", err);
                return Err(err);
            }
            _ if attempt >= policy.max_retries => {
                warn!(
                    operation = operation_name,
                    attempts = attempt + 1,
                    "Giving up: {}",
                    err
                );
                return Err(err);
            }
            RetryDecision::RetryAfter(requested) => requested.min(policy.max_backoff),
            RetryDecision::Retry => policy.backoff_for(attempt),
        };

        warn!(
            operation = operation_name,
            attempt = attempt + 1,
            max_attempts = policy.max_retries + 1,
            backoff_ms = wait.as_millis() as u64,
            "Retrying after transient error: {}",
            err
        );

        sleep(wait).await;
        attempt += 1;
    }
}
