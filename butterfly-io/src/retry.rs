//! Exponential-backoff retry wrapper shared by the Overpass and Nominatim
//! clients: up to 4 attempts, initial delay 3s, backoff factor 2.

use butterfly_common::Error;
use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub factor: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            initial_delay: Duration::from_secs(3),
            factor: 2,
        }
    }
}

/// Runs `f` under `policy`. Only `Error::HttpTransient` is retried; any
/// other error, or the last transient failure after the attempt budget is
/// exhausted, is returned as `Error::HttpFailure`.
pub async fn with_retry<F, Fut, T>(policy: RetryPolicy, mut f: F) -> Result<T, Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, Error>>,
{
    let mut delay = policy.initial_delay;
    let mut last_err = String::new();
    for attempt in 1..=policy.max_attempts {
        match f().await {
            Ok(v) => return Ok(v),
            Err(Error::HttpTransient(msg)) => {
                last_err = msg;
                if attempt == policy.max_attempts {
                    break;
                }
                tracing::warn!(attempt, delay_secs = delay.as_secs(), "retrying transient HTTP error");
                tokio::time::sleep(delay).await;
                delay *= policy.factor;
            }
            Err(other) => return Err(other),
        }
    }
    Err(Error::HttpFailure(last_err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn retries_transient_errors_then_succeeds() {
        let attempts = AtomicU32::new(0);
        let policy = RetryPolicy {
            max_attempts: 4,
            initial_delay: Duration::from_millis(1),
            factor: 2,
        };
        let result = with_retry(policy, || async {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Err(Error::HttpTransient("boom".into()))
            } else {
                Ok(42)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausts_attempts_and_surfaces_http_failure() {
        let policy = RetryPolicy {
            max_attempts: 2,
            initial_delay: Duration::from_millis(1),
            factor: 2,
        };
        let result: Result<(), Error> =
            with_retry(policy, || async { Err(Error::HttpTransient("down".into())) }).await;
        assert!(matches!(result, Err(Error::HttpFailure(_))));
    }

    #[tokio::test]
    async fn non_transient_errors_are_not_retried() {
        let policy = RetryPolicy::default();
        let attempts = AtomicU32::new(0);
        let result: Result<(), Error> = with_retry(policy, || async {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err(Error::LocationUnresolved)
        })
        .await;
        assert!(matches!(result, Err(Error::LocationUnresolved)));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
