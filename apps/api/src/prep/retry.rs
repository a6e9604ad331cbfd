//! Client-side retry of a whole orchestration.
//!
//! Fixed bound, fixed backoff. Only errors that report themselves as
//! transient are reissued; everything else returns on the first failure.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

pub const MAX_RETRIES: u32 = 3;
pub const RETRY_BACKOFF: Duration = Duration::from_secs(2);

/// Errors that can say whether reissuing the same call might succeed.
pub trait Transient {
    fn is_transient(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            backoff: RETRY_BACKOFF,
        }
    }
}

/// A successful value together with how many retries it took.
#[derive(Debug, Clone, PartialEq)]
pub struct Retried<T> {
    pub value: T,
    pub retries: u32,
}

impl RetryPolicy {
    /// Runs `operation` until it succeeds, fails with a non-transient error,
    /// or `max_retries` retries have been spent. `on_progress` receives a
    /// status line before every retry.
    pub async fn run<T, E, F, Fut>(
        &self,
        mut on_progress: impl FnMut(&str),
        mut operation: F,
    ) -> Result<Retried<T>, E>
    where
        E: Transient + std::fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut retries = 0;

        loop {
            match operation().await {
                Ok(value) => return Ok(Retried { value, retries }),
                Err(e) if e.is_transient() && retries < self.max_retries => {
                    retries += 1;
                    let status = format!(
                        "Retrying (attempt {} of {})...",
                        retries + 1,
                        self.max_retries + 1
                    );
                    warn!(
                        "Attempt {} failed with a transient error, retrying after {}ms: {e}",
                        retries,
                        self.backoff.as_millis()
                    );
                    on_progress(&status);
                    tokio::time::sleep(self.backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
