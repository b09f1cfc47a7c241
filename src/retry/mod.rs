//! Retry executor for operations that can hit transient "resource busy"
//! conditions.
//!
//! The executor is policy-free: the operation body classifies each attempt
//! by returning an [`Outcome`]. Busy attempts are retried with a capped
//! exponential backoff until the caller's timeout is spent.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::{Instant, sleep};
use tracing::debug;

use crate::compute::ApiError;

/// Result of a single attempt.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Outcome<T, E> {
    /// The attempt succeeded.
    Success(T),
    /// The attempt hit a transient condition; try again after a backoff.
    Retry,
    /// The attempt hit a terminal condition; stop immediately.
    Fail(E),
}

impl<T, E> Outcome<T, E> {
    /// Classifies an API result: busy errors are retried, every other error
    /// is terminal and mapped through `on_error`.
    pub fn from_api_result(
        result: Result<T, ApiError>,
        on_error: impl FnOnce(ApiError) -> E,
    ) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(err) if err.is_resource_busy() => Self::Retry,
            Err(err) => Self::Fail(on_error(err)),
        }
    }
}

/// Per-attempt information handed to the operation body.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RetryContext {
    attempt: u32,
}

impl RetryContext {
    /// One-based attempt number.
    #[must_use]
    pub const fn attempt(self) -> u32 {
        self.attempt
    }
}

/// Raised when an operation is still asking to be retried at its deadline.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("{description}: still busy after {attempts} attempt(s) over {elapsed:?}")]
pub struct RetryTimeout {
    /// Description of the operation.
    pub description: String,
    /// Number of attempts made.
    pub attempts: u32,
    /// Time spent before giving up.
    pub elapsed: Duration,
}

/// Runs operation bodies until they succeed, fail, or run out of time.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Retrier {
    initial_delay: Duration,
    max_delay: Duration,
}

impl Retrier {
    /// Creates an executor whose backoff starts at `initial_delay` and
    /// doubles up to `max_delay`.
    #[must_use]
    pub fn new(initial_delay: Duration, max_delay: Duration) -> Self {
        Self {
            initial_delay,
            max_delay: max_delay.max(initial_delay),
        }
    }

    /// Invokes `body` until it returns [`Outcome::Success`] or
    /// [`Outcome::Fail`].
    ///
    /// Each [`Outcome::Retry`] waits for the current backoff interval,
    /// clamped to the time left before `timeout`.
    ///
    /// # Errors
    ///
    /// Returns the body's error on [`Outcome::Fail`], or a [`RetryTimeout`]
    /// (converted into `E`) once `timeout` has elapsed, including when it
    /// elapses during a backoff wait.
    pub async fn run<T, E, F, Fut>(
        &self,
        description: &str,
        timeout: Duration,
        mut body: F,
    ) -> Result<T, E>
    where
        F: FnMut(RetryContext) -> Fut,
        Fut: Future<Output = Outcome<T, E>>,
        E: From<RetryTimeout>,
    {
        let started = Instant::now();
        let deadline = started + timeout;
        let mut delay = self.initial_delay;
        let mut attempt: u32 = 0;

        loop {
            attempt = attempt.saturating_add(1);
            match body(RetryContext { attempt }).await {
                Outcome::Success(value) => return Ok(value),
                Outcome::Fail(err) => {
                    debug!(operation = description, attempt, "operation failed");
                    return Err(err);
                }
                Outcome::Retry => {}
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(Self::timed_out(description, attempt, started).into());
            }

            let wait = delay.min(deadline - now);
            debug!(
                operation = description,
                attempt,
                wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX),
                "resource busy; will retry"
            );
            sleep(wait).await;

            if Instant::now() >= deadline {
                return Err(Self::timed_out(description, attempt, started).into());
            }
            delay = delay.saturating_mul(2).min(self.max_delay);
        }
    }

    fn timed_out(description: &str, attempts: u32, started: Instant) -> RetryTimeout {
        RetryTimeout {
            description: description.to_owned(),
            attempts,
            elapsed: started.elapsed(),
        }
    }
}

impl Default for Retrier {
    fn default() -> Self {
        Self::new(Duration::from_secs(5), Duration::from_secs(30))
    }
}

#[cfg(test)]
mod tests;
