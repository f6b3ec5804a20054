//! Exponential backoff for connecting and reading.
//!
//! Before retry `n` (0-based) the policy sleeps `base * k` where `k` is drawn
//! uniformly from `[1, 2^(n+1))`, capped at `max_sleep`. Only retryable
//! errors (see [`ZkError::is_retryable`]) are retried.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::{error, warn};
use zk_config::RetrySettings;

use crate::error::{ZkError, ZkResult};

/// Past this the shift would overflow; ZooKeeper clients cap it the same way.
const MAX_RETRY_EXPONENT: u32 = 29;

/// Retry policy shared by session start and every read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Base delay; the actual delay grows exponentially with jitter.
    pub base_sleep: Duration,
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Upper bound on any single delay.
    pub max_sleep: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetrySettings::default().into()
    }
}

impl From<RetrySettings> for RetryPolicy {
    fn from(settings: RetrySettings) -> Self {
        Self {
            base_sleep: settings.base_sleep,
            max_retries: settings.max_retries,
            max_sleep: settings.max_sleep,
        }
    }
}

impl RetryPolicy {
    /// Total attempts including the first one.
    pub fn total_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Smallest and largest delay before retry number `retry`.
    pub fn delay_bounds(&self, retry: u32) -> (Duration, Duration) {
        let upper = (1u32 << (retry.min(MAX_RETRY_EXPONENT) + 1)) - 1;
        (
            self.base_sleep.min(self.max_sleep),
            self.base_sleep.saturating_mul(upper).min(self.max_sleep),
        )
    }

    /// Delay before retry number `retry`.
    pub fn delay(&self, retry: u32) -> Duration {
        let span = 1u32 << (retry.min(MAX_RETRY_EXPONENT) + 1);
        let factor = rand::thread_rng().gen_range(0..span).max(1);
        self.base_sleep.saturating_mul(factor).min(self.max_sleep)
    }

    /// Run `f` until it succeeds, fails with a non-retryable error, or the
    /// retries run out. Exhaustion is reported as [`ZkError::Connection`].
    pub async fn run<T, F, Fut>(&self, op: &str, mut f: F) -> ZkResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ZkResult<T>>,
    {
        let total_attempts = self.total_attempts();
        let mut retry = 0;
        loop {
            match f().await {
                Ok(value) => return Ok(value),
                Err(err) if !err.is_retryable() => return Err(err),
                Err(err) if retry >= self.max_retries => {
                    error!(op, attempts = total_attempts, error = %err, "retries exhausted");
                    return Err(ZkError::Connection(format!(
                        "{op} failed after {total_attempts} attempt(s): {err}"
                    )));
                }
                Err(err) => {
                    let delay = self.delay(retry);
                    retry += 1;
                    warn!(
                        op,
                        attempt = retry,
                        total_attempts,
                        retry_in_ms = delay.as_millis(),
                        error = %err,
                        "attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    fn policy() -> RetryPolicy {
        RetryPolicy {
            base_sleep: Duration::from_millis(1000),
            max_retries: 3,
            max_sleep: Duration::from_secs(30),
        }
    }

    #[test]
    fn test_default_policy() {
        let p = RetryPolicy::default();
        assert_eq!(p.base_sleep, Duration::from_millis(1000));
        assert_eq!(p.max_retries, 3);
        assert_eq!(p.total_attempts(), 4);
    }

    #[test]
    fn test_delay_bounds_grow() {
        let p = policy();
        assert_eq!(
            p.delay_bounds(0),
            (Duration::from_millis(1000), Duration::from_millis(1000))
        );
        assert_eq!(p.delay_bounds(1).1, Duration::from_millis(3000));
        assert_eq!(p.delay_bounds(2).1, Duration::from_millis(7000));
        // capped
        assert_eq!(p.delay_bounds(10).1, Duration::from_secs(30));
        assert_eq!(p.delay_bounds(u32::MAX).1, Duration::from_secs(30));
    }

    #[test]
    fn test_delay_within_bounds() {
        let p = policy();
        for retry in 0..6 {
            let (lo, hi) = p.delay_bounds(retry);
            for _ in 0..50 {
                let d = p.delay(retry);
                assert!(d >= lo && d <= hi, "retry {retry}: {d:?} not in {lo:?}..={hi:?}");
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_recovers_from_transient_errors() {
        let calls = AtomicU32::new(0);
        let start = Instant::now();
        let out = policy()
            .run("list_children", || async {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(ZkError::Connection("connection loss".into()))
                } else {
                    Ok(7)
                }
            })
            .await
            .unwrap();
        assert_eq!(out, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(start.elapsed() >= Duration::from_millis(2000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_exhausts() {
        let calls = AtomicU32::new(0);
        let err = policy()
            .run("connect", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(ZkError::Connection("refused".into()))
            })
            .await
            .unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert!(matches!(err, ZkError::Connection(ref msg) if msg.contains("after 4 attempt(s)")));
    }

    #[tokio::test]
    async fn test_run_does_not_retry_resolution_errors() {
        let calls = AtomicU32::new(0);
        let err = policy()
            .run("get_data", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(ZkError::resolution("/missing", "node does not exist"))
            })
            .await
            .unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(err, ZkError::Resolution { .. }));
    }
}
