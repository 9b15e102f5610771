use std::future::Future;
use std::time::Duration;

use backoff::{future::retry_notify, ExponentialBackoff, ExponentialBackoffBuilder};
use tracing::{debug, warn};

use crate::domain::models::RetryConfig;
use crate::domain::{BackendError, StoreResult};

/// Retry policy with exponential backoff for backend requests
///
/// Only errors where [`BackendError::is_transient`] holds are retried:
/// network failures, timeouts, HTTP 429 and 5xx. Backoff doubles from the
/// initial delay and is capped at the maximum.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    initial_backoff: Duration,
    max_backoff: Duration,
}

impl RetryPolicy {
    pub const fn new(max_retries: u32, initial_backoff_ms: u64, max_backoff_ms: u64) -> Self {
        Self {
            max_retries,
            initial_backoff: Duration::from_millis(initial_backoff_ms),
            max_backoff: Duration::from_millis(max_backoff_ms),
        }
    }

    fn schedule(&self) -> ExponentialBackoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(self.initial_backoff)
            .with_max_interval(self.max_backoff)
            .with_multiplier(2.0)
            .with_randomization_factor(0.0)
            .with_max_elapsed_time(None)
            .build()
    }

    /// Run `operation`, retrying transient failures up to `max_retries` times.
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> StoreResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = StoreResult<T>>,
    {
        let max_retries = self.max_retries;
        let mut attempt = 0u32;

        let result = retry_notify(
            self.schedule(),
            || {
                attempt += 1;
                let current = attempt;
                let fut = operation();
                async move {
                    fut.await.map_err(|err| {
                        if err.is_transient() && current <= max_retries {
                            backoff::Error::transient(err)
                        } else {
                            if err.is_transient() {
                                warn!("Request failed after {} attempts: {}", current, err);
                            }
                            backoff::Error::permanent(err)
                        }
                    })
                }
            },
            |err: BackendError, wait: Duration| {
                warn!("Transient backend error: {}. Retrying in {:?}...", err, wait);
            },
        )
        .await;

        if result.is_ok() && attempt > 1 {
            debug!("Request succeeded after {} retries", attempt - 1);
        }
        result
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self::new(
            config.max_retries,
            config.initial_backoff_ms,
            config.max_backoff_ms,
        )
    }
}
