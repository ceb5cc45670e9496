//! Retry with exponential back-off and jitter for the classification boundary.
//!
//! [`retry_with_backoff`] wraps a fallible async operation and retries on
//! transient errors (throttling, network failures, 5xx). Classification is
//! the only boundary that retries: embedding faults are handled by the
//! fallback provider and chat faults propagate immediately.

use std::future::Future;
use std::time::Duration;

use crate::error::ModelError;

/// Returns `true` for errors that are worth retrying after a back-off delay.
///
/// **Retriable:**
/// - [`ModelError::Throttled`]: the gateway asked us to slow down.
/// - Network-level failures: timeout, connection reset.
/// - HTTP 5xx responses: transient server/infrastructure errors.
///
/// **Not retriable (hard stop):**
/// - Malformed responses or unrecognized labels; retrying won't fix them.
/// - Chat / embed / fallback faults; those boundaries do not retry at all.
pub(crate) fn is_retriable(err: &ModelError) -> bool {
    match err {
        ModelError::Throttled(_) => true,
        ModelError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        ModelError::Embed(_)
        | ModelError::Classify(_)
        | ModelError::Chat(_)
        | ModelError::Fallback(_) => false,
    }
}

/// Runs `operation` with up to `max_retries` additional attempts on transient
/// errors.
///
/// Delay doubles per attempt from `backoff_base_ms`, with ±25% jitter, capped
/// at 60 s. Non-retriable errors are returned immediately.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, ModelError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ModelError>>,
{
    const MAX_DELAY_MS: u64 = 60_000;
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let computed = backoff_base_ms.saturating_mul(1u64 << (attempt - 1).min(10));
                let capped = computed.min(MAX_DELAY_MS);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "transient gateway error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::*;

    #[test]
    fn throttled_is_retriable() {
        assert!(is_retriable(&ModelError::Throttled("429".to_owned())));
    }

    #[test]
    fn classify_error_is_not_retriable() {
        assert!(!is_retriable(&ModelError::Classify("bad label".to_owned())));
    }

    #[test]
    fn chat_error_is_not_retriable() {
        assert!(!is_retriable(&ModelError::Chat("boom".to_owned())));
    }

    #[tokio::test]
    async fn succeeds_immediately_on_first_try() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok::<u32, ModelError>(42)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_throttled_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                let attempt = c.fetch_add(1, Ordering::SeqCst) + 1;
                if attempt < 3 {
                    Err(ModelError::Throttled("slow down".to_owned()))
                } else {
                    Ok(99)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 99, "should succeed after retries");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(2, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(ModelError::Throttled("still throttled".to_owned()))
            }
        })
        .await;
        assert!(matches!(result, Err(ModelError::Throttled(_))));
        assert_eq!(
            calls.load(Ordering::SeqCst),
            3,
            "initial attempt plus two retries"
        );
    }

    #[tokio::test]
    async fn does_not_retry_classify_errors() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(ModelError::Classify("unrecognized label".to_owned()))
            }
        })
        .await;
        assert_eq!(
            calls.load(Ordering::SeqCst),
            1,
            "classify errors must not be retried"
        );
        assert!(matches!(result, Err(ModelError::Classify(_))));
    }
}
