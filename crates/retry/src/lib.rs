//! Bounded retry with exponential backoff.
//!
//! A [`RetryPolicy`] runs an async operation up to `max_attempts` times.
//! Between attempts it sleeps `base_delay * 2^(attempt-1)`, capped at
//! `max_delay`. Errors the `should_retry` predicate rejects end the run
//! immediately and are returned unchanged inside [`RetryError::Aborted`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Produced when a single attempt exceeds the per-attempt timeout.
///
/// Operation error types convert from this so a timed-out attempt flows
/// through the same retry decision as any other failure.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("attempt timed out after {after:?}")]
pub struct AttemptTimedOut {
    pub after: Duration,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RetryError<E> {
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: E },

    #[error("{0}")]
    Aborted(E),
}

impl<E> RetryError<E> {
    /// The underlying error that ended the run.
    pub fn last_error(&self) -> &E {
        match self {
            RetryError::Exhausted { last, .. } => last,
            RetryError::Aborted(e) => e,
        }
    }

    pub fn into_last_error(self) -> E {
        match self {
            RetryError::Exhausted { last, .. } => last,
            RetryError::Aborted(e) => e,
        }
    }
}

/// Retry tuning. Serialised with millisecond fields so it can live in JSON config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: Option<u64>,
    /// Per-attempt time bound. `None` lets attempts run unbounded.
    pub timeout_ms: Option<u64>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 500,
            max_delay_ms: Some(5_000),
            timeout_ms: None,
        }
    }
}

/// Passed to the `on_retry` observer before each backoff sleep.
#[derive(Debug)]
pub struct RetryNotice<'a, E> {
    /// The attempt that just failed (1-based).
    pub attempt: u32,
    pub delay: Duration,
    pub error: &'a E,
}

type RetryPredicate<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;

pub struct RetryPolicy<E> {
    config: RetryConfig,
    should_retry: RetryPredicate<E>,
}

impl<E> Clone for RetryPolicy<E> {
    fn clone(&self) -> Self {
        Self {
            config: self.config,
            should_retry: Arc::clone(&self.should_retry),
        }
    }
}

impl<E> fmt::Debug for RetryPolicy<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy").field("config", &self.config).finish()
    }
}

impl<E> RetryPolicy<E>
where
    E: From<AttemptTimedOut> + fmt::Display,
{
    /// Every error is retryable until a predicate is set.
    pub fn new(config: RetryConfig) -> Self {
        Self {
            config,
            should_retry: Arc::new(|_| true),
        }
    }

    pub fn with_should_retry<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.should_retry = Arc::new(predicate);
        self
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    fn max_attempts(&self) -> u32 {
        self.config.max_attempts.max(1)
    }

    /// Backoff before the retry that follows failed attempt `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        let delay = Duration::from_millis(self.config.base_delay_ms).saturating_mul(1u32 << exponent);
        match self.config.max_delay_ms {
            Some(max) => delay.min(Duration::from_millis(max)),
            None => delay,
        }
    }

    pub async fn execute<T, F, Fut>(&self, operation: F) -> Result<T, RetryError<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.execute_with(operation, |_: &RetryNotice<'_, E>| {}).await
    }

    /// Like [`execute`](Self::execute), reporting each scheduled retry to `on_retry`.
    ///
    /// The operation receives the 1-based attempt number.
    pub async fn execute_with<T, F, Fut, N>(&self, mut operation: F, mut on_retry: N) -> Result<T, RetryError<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        N: FnMut(&RetryNotice<'_, E>),
    {
        let max_attempts = self.max_attempts();
        let mut attempt = 1;
        loop {
            let result = match self.config.timeout_ms {
                Some(ms) => {
                    let after = Duration::from_millis(ms);
                    match tokio::time::timeout(after, operation(attempt)).await {
                        Ok(result) => result,
                        Err(_) => Err(E::from(AttemptTimedOut { after })),
                    }
                }
                None => operation(attempt).await,
            };

            let error = match result {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            if !(self.should_retry)(&error) {
                return Err(RetryError::Aborted(error));
            }
            if attempt >= max_attempts {
                log::warn!("Giving up after {} attempts: {}", attempt, error);
                return Err(RetryError::Exhausted { attempts: attempt, last: error });
            }

            let delay = self.delay_for(attempt);
            log::warn!("Attempt {} failed ({}), retrying in {:?}", attempt, error, delay);
            on_retry(&RetryNotice {
                attempt,
                delay,
                error: &error,
            });
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}
