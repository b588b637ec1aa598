// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Capped exponential backoff with jitter for `BlmError::Unavailable`
//! (spec.md §7), shared by the orchestrator and command bus adapters so
//! the retry policy is defined in exactly one place.

use std::time::Duration;

use blm_core::{BlmError, BlmResult};

/// Default policy from spec.md §7: 3 attempts, 100 ms × 2ⁿ plus jitter.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3, base_delay: Duration::from_millis(100), max_delay: Duration::from_secs(5) }
    }
}

impl RetryPolicy {
    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base_ms = self.base_delay.as_millis() as f64;
        let capped_ms = (base_ms * 2f64.powi(attempt as i32)).min(self.max_delay.as_millis() as f64);
        let jitter = capped_ms * 0.25 * pseudo_random_fraction(attempt);
        Duration::from_millis((capped_ms + jitter) as u64)
    }

    /// Retry `op` against this policy. Only `BlmError::Unavailable` is
    /// retried; every other error kind is a hard failure that surfaces
    /// immediately (spec.md §7: `Unavailable` is the sole transient kind).
    pub async fn retry<T, F, Fut>(&self, mut op: F) -> BlmResult<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = BlmResult<T>>,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(BlmError::Unavailable(msg)) if attempt + 1 < self.max_attempts => {
                    tracing::warn!(attempt, error = %msg, "transient failure, retrying");
                    tokio::time::sleep(self.delay_for_attempt(attempt)).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Cheap deterministic "random" fraction in `[0, 1)`, keyed on attempt
/// number so repeated calls with the same attempt don't collide exactly,
/// without pulling in a full RNG for what is just jitter.
fn pseudo_random_fraction(attempt: u32) -> f64 {
    let hash = attempt.wrapping_mul(2654435761);
    (hash as f64) / (u32::MAX as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn succeeds_without_retry_on_first_try() {
        let policy = RetryPolicy::default();
        let calls = AtomicU32::new(0);
        let result: BlmResult<u32> = policy
            .retry(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(42) }
            })
            .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_unavailable_up_to_max_attempts() {
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
        };
        let calls = AtomicU32::new(0);
        let result: BlmResult<()> = policy
            .retry(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(BlmError::Unavailable("down".to_string())) }
            })
            .await;
        assert!(matches!(result, Err(BlmError::Unavailable(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn non_transient_errors_are_not_retried() {
        let policy = RetryPolicy::default();
        let calls = AtomicU32::new(0);
        let result: BlmResult<()> = policy
            .retry(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(BlmError::NotFound) }
            })
            .await;
        assert!(matches!(result, Err(BlmError::NotFound)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
