//! Fixed-delay retry for upstream calls.
//!
//! Every upstream failure is treated as transient: the hot-list endpoints
//! flap, and a platform that keeps failing is dropped for the cycle by the
//! caller rather than here.

use std::future::Future;
use std::time::Duration;

use crate::error::UpstreamError;
use crate::RetryPolicy;

/// Runs `operation` up to `policy.attempts` times, sleeping `policy.delay_ms`
/// between attempts. Returns the last error once attempts are exhausted.
pub(crate) async fn retry_fixed<T, F, Fut>(
    policy: RetryPolicy,
    label: &str,
    mut operation: F,
) -> Result<T, UpstreamError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, UpstreamError>>,
{
    let attempts = policy.attempts.max(1);
    let mut attempt = 1u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt >= attempts => return Err(err),
            Err(err) => {
                tracing::warn!(
                    operation = %label,
                    attempt,
                    attempts,
                    delay_ms = policy.delay_ms,
                    error = %err,
                    "upstream request failed, retrying"
                );
                attempt += 1;
                tokio::time::sleep(Duration::from_millis(policy.delay_ms)).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::*;

    fn api_err() -> UpstreamError {
        UpstreamError::ApiStatus {
            context: "test".to_owned(),
            code: Some(500),
        }
    }

    #[tokio::test]
    async fn succeeds_immediately_on_first_try() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_fixed(RetryPolicy::new(3, 0), "t", || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok::<u32, UpstreamError>(42)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_fixed(RetryPolicy::new(3, 0), "t", || {
            let c = Arc::clone(&c);
            async move {
                let attempt = c.fetch_add(1, Ordering::SeqCst) + 1;
                if attempt < 3 {
                    Err(api_err())
                } else {
                    Ok(99)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 99);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_configured_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_fixed(RetryPolicy::new(3, 0), "t", || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(api_err())
            }
        })
        .await;
        assert!(matches!(result, Err(UpstreamError::ApiStatus { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn waits_fixed_delay_between_attempts() {
        let start = std::time::Instant::now();
        let _ = retry_fixed(RetryPolicy::new(3, 20), "t", || async {
            Err::<u32, _>(api_err())
        })
        .await;
        assert!(start.elapsed() >= Duration::from_millis(40));
    }
}
