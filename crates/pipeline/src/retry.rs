//! Retry policy for batch calls.

use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokensync_core::config::SyncConfig;
use tokensync_session::{ConnectionWatch, SessionError, SessionResult};

/// Bounded retry with a per-attempt timeout.
///
/// Between attempts a connected session waits a random delay; a disconnected
/// one waits for the reconnect signal and retries straight away.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    attempts: u32,
    min_delay: Duration,
    max_delay: Duration,
    call_timeout: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, min_delay: Duration, max_delay: Duration, call_timeout: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            min_delay,
            max_delay: max_delay.max(min_delay),
            call_timeout,
        }
    }

    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(
            config.retry.attempts,
            Duration::from_millis(config.retry.min_delay_ms),
            Duration::from_millis(config.retry.max_delay_ms),
            config.batch_timeout(),
        )
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    fn jitter(&self) -> Duration {
        let min = self.min_delay.as_millis() as u64;
        let max = self.max_delay.as_millis() as u64;
        if min >= max {
            return self.min_delay;
        }
        Duration::from_millis(rand::rng().random_range(min..=max))
    }

    /// Run `call` until it succeeds or the attempts are used up.
    ///
    /// Returns the last error once every attempt has failed.
    pub async fn run<T, F, Fut>(
        &self,
        connection: &ConnectionWatch,
        operation: &'static str,
        mut call: F,
    ) -> SessionResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = SessionResult<T>>,
    {
        let mut attempt = 0;

        loop {
            attempt += 1;
            let err = match tokio::time::timeout(self.call_timeout, call()).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(e)) => e,
                Err(_) => SessionError::Timeout(self.call_timeout),
            };

            if attempt >= self.attempts {
                return Err(err);
            }

            if connection.is_connected() {
                let delay = self.jitter();
                tracing::debug!(
                    operation,
                    attempt,
                    error = %err,
                    delay_ms = delay.as_millis() as u64,
                    "Request failed, retrying"
                );
                tokio::time::sleep(delay).await;
            } else {
                tracing::info!(operation, attempt, "Session lost, waiting for reconnect");
                connection.wait_reconnected().await;
            }
        }
    }
}
