use std::{future::Future, time::Duration};

/// Bounds every individual chain read: each attempt gets `timeout`, and
/// retryable failures are repeated up to `max_retries` times with an
/// exponentially growing delay starting at `backoff`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReadPolicy {
    pub timeout: Duration,
    pub max_retries: u32,
    pub backoff: Duration,
}

impl Default for ReadPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_retries: 2,
            backoff: Duration::from_millis(250),
        }
    }
}

impl ReadPolicy {
    pub async fn run<T, F, Fut>(&self, operation: &'static str, read: F) -> crate::Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = crate::Result<T>>,
    {
        let mut delay = self.backoff;
        let mut attempt = 0;

        loop {
            let result = match tokio::time::timeout(self.timeout, read()).await {
                Ok(result) => result,
                Err(_) => Err(crate::Error::ReadTimedOut {
                    operation,
                    timeout: self.timeout,
                }),
            };

            match result {
                Err(err) if err.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    tracing::debug!(operation, attempt, ?delay, error = %err, "retrying chain read");
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
                result => return result,
            }
        }
    }
}
