//! Retry with exponential backoff for Bot API calls
//!
//! Flood control (`429`) and server errors are transient; anything else the API
//! rejects is not. When Telegram supplies `retry_after` that wait is honored
//! instead of the computed backoff.
//!
//! # Example
//!
//! ```no_run
//! use sticker_exporter::retry::{IsRetryable, with_retry};
//! use sticker_exporter::config::RetryConfig;
//!
//! #[derive(Debug)]
//! enum MyError {
//!     Transient,
//!     Permanent,
//! }
//!
//! impl std::fmt::Display for MyError {
//!     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
//!         write!(f, "{self:?}")
//!     }
//! }
//!
//! impl IsRetryable for MyError {
//!     fn is_retryable(&self) -> bool {
//!         matches!(self, MyError::Transient)
//!     }
//! }
//!
//! # async fn example() -> Result<(), MyError> {
//! let config = RetryConfig::default();
//! with_retry(&config, || async { Ok::<_, MyError>(()) }).await?;
//! # Ok(())
//! # }
//! ```

use crate::config::RetryConfig;
use crate::error::Error;
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Classifies errors as transient or permanent
pub trait IsRetryable {
    /// Returns true if the operation should be attempted again
    fn is_retryable(&self) -> bool;

    /// Server-mandated wait before the next attempt, if any
    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

impl IsRetryable for Error {
    fn is_retryable(&self) -> bool {
        match self {
            Error::Network(e) => e.is_timeout() || e.is_connect(),
            Error::TelegramApi { code, .. } => *code == 429 || *code >= 500,
            Error::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::ConnectionRefused
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::NotConnected
                    | std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::Interrupted
            ),
            Error::Config { .. }
            | Error::Workspace { .. }
            | Error::ExternalTool(_)
            | Error::Serialization(_)
            | Error::Other(_) => false,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            Error::TelegramApi {
                retry_after: Some(secs),
                ..
            } => Some(Duration::from_secs(*secs)),
            _ => None,
        }
    }
}

/// Run `operation` until it succeeds, fails permanently, or attempts run out
///
/// `config.max_attempts` counts retries, so the operation runs at most
/// `max_attempts + 1` times. A `retry_after` hint from the error replaces the
/// backoff delay for that attempt (still capped at `config.max_delay`).
pub async fn with_retry<F, Fut, T, E>(config: &RetryConfig, operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: IsRetryable + std::fmt::Display,
{
    with_retry_if(config, E::is_retryable, operation).await
}

/// Like [`with_retry`], but only errors accepted by `should_retry` are retried
///
/// Used where repeating an operation is only safe for a subset of the
/// transient failures, such as uploads the server may already have accepted.
pub async fn with_retry_if<F, Fut, T, E, P>(
    config: &RetryConfig,
    should_retry: P,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: IsRetryable + std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let mut attempt = 0;
    let mut delay = config.initial_delay;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    tracing::debug!(attempts = attempt + 1, "request succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) if should_retry(&e) && attempt < config.max_attempts => {
                attempt += 1;

                let wait = match e.retry_after() {
                    Some(hint) => hint.min(config.max_delay),
                    None if config.jitter => add_jitter(delay),
                    None => delay,
                };

                tracing::warn!(
                    error = %e,
                    attempt,
                    max_attempts = config.max_attempts,
                    delay_ms = wait.as_millis(),
                    "request failed, retrying"
                );

                tokio::time::sleep(wait).await;

                let next = Duration::from_secs_f64(delay.as_secs_f64() * config.backoff_multiplier);
                delay = next.min(config.max_delay);
            }
            Err(e) => {
                if should_retry(&e) {
                    tracing::error!(error = %e, attempts = attempt + 1, "retries exhausted");
                } else {
                    tracing::debug!(error = %e, "non-retryable error");
                }
                return Err(e);
            }
        }
    }
}

/// Stretch `delay` by a uniform 0-100% so concurrent callers spread out
fn add_jitter(delay: Duration) -> Duration {
    let factor: f64 = rand::thread_rng().gen_range(0.0..=1.0);
    Duration::from_secs_f64(delay.as_secs_f64() * (1.0 + factor))
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug)]
    enum TestError {
        Transient,
        Permanent,
        FloodWait(u64),
    }

    impl std::fmt::Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{self:?}")
        }
    }

    impl IsRetryable for TestError {
        fn is_retryable(&self) -> bool {
            !matches!(self, TestError::Permanent)
        }

        fn retry_after(&self) -> Option<Duration> {
            match self {
                TestError::FloodWait(ms) => Some(Duration::from_millis(*ms)),
                _ => None,
            }
        }
    }

    fn fast_config(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts,
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_secs(1),
            backoff_multiplier: 2.0,
            jitter: false,
        }
    }

    fn api_error(code: i32, retry_after: Option<u64>) -> Error {
        Error::TelegramApi {
            code,
            description: "test".into(),
            retry_after,
        }
    }

    #[tokio::test]
    async fn success_calls_once() {
        let counter = Arc::new(AtomicU32::new(0));
        let c = counter.clone();

        let result = with_retry(&RetryConfig::default(), || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok::<_, TestError>(42)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn transient_then_success() {
        let counter = Arc::new(AtomicU32::new(0));
        let c = counter.clone();

        let result = with_retry(&fast_config(3), || {
            let c = c.clone();
            async move {
                if c.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(TestError::Transient)
                } else {
                    Ok(7)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausted_returns_last_error() {
        let counter = Arc::new(AtomicU32::new(0));
        let c = counter.clone();

        let result = with_retry(&fast_config(2), || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<i32, _>(TestError::Transient)
            }
        })
        .await;

        assert!(matches!(result, Err(TestError::Transient)));
        assert_eq!(counter.load(Ordering::SeqCst), 3, "initial + 2 retries");
    }

    #[tokio::test]
    async fn permanent_error_is_not_retried() {
        let counter = Arc::new(AtomicU32::new(0));
        let c = counter.clone();

        let result = with_retry(&RetryConfig::default(), || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<i32, _>(TestError::Permanent)
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn zero_max_attempts_runs_once() {
        let counter = Arc::new(AtomicU32::new(0));
        let c = counter.clone();

        let result = with_retry(&fast_config(0), || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<i32, _>(TestError::Transient)
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn backoff_grows_between_attempts() {
        let config = RetryConfig {
            max_attempts: 3,
            initial_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 2.0,
            jitter: false,
        };
        let timestamps = Arc::new(tokio::sync::Mutex::new(Vec::new()));
        let ts = timestamps.clone();

        let _ = with_retry(&config, || {
            let ts = ts.clone();
            async move {
                ts.lock().await.push(std::time::Instant::now());
                Err::<i32, _>(TestError::Transient)
            }
        })
        .await;

        let ts = timestamps.lock().await;
        assert_eq!(ts.len(), 4);
        assert!(ts[1].duration_since(ts[0]) >= Duration::from_millis(40));
        assert!(ts[2].duration_since(ts[1]) >= Duration::from_millis(80));
        assert!(ts[3].duration_since(ts[2]) >= Duration::from_millis(160));
    }

    #[tokio::test]
    async fn retry_after_hint_replaces_backoff() {
        // initial_delay is long; the hint must win
        let config = RetryConfig {
            max_attempts: 1,
            initial_delay: Duration::from_secs(30),
            max_delay: Duration::from_secs(60),
            backoff_multiplier: 2.0,
            jitter: false,
        };
        let counter = Arc::new(AtomicU32::new(0));
        let c = counter.clone();
        let start = std::time::Instant::now();

        let result = with_retry(&config, || {
            let c = c.clone();
            async move {
                if c.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(TestError::FloodWait(20))
                } else {
                    Ok(())
                }
            }
        })
        .await;

        assert!(result.is_ok());
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn retry_after_hint_is_capped_by_max_delay() {
        let config = RetryConfig {
            max_attempts: 1,
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(30),
            backoff_multiplier: 2.0,
            jitter: false,
        };
        let start = std::time::Instant::now();

        let _ = with_retry(&config, || async { Err::<(), _>(TestError::FloodWait(60_000)) }).await;

        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn predicate_narrows_what_is_retried() {
        let counter = Arc::new(AtomicU32::new(0));
        let c = counter.clone();

        let result = with_retry_if(
            &fast_config(3),
            |e| matches!(e, TestError::FloodWait(_)),
            || {
                let c = c.clone();
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Err::<i32, _>(TestError::Transient)
                }
            },
        )
        .await;

        assert!(matches!(result, Err(TestError::Transient)));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn jitter_stays_within_bounds() {
        let delay = Duration::from_millis(50);
        for i in 0..200 {
            let jittered = add_jitter(delay);
            assert!(jittered >= delay, "iteration {i}: {jittered:?} < {delay:?}");
            assert!(jittered <= delay * 2, "iteration {i}: {jittered:?} > 2x");
        }
        assert_eq!(add_jitter(Duration::ZERO), Duration::ZERO);
    }

    #[test]
    fn telegram_flood_and_server_errors_are_retryable() {
        assert!(api_error(429, Some(3)).is_retryable());
        assert!(api_error(500, None).is_retryable());
        assert!(api_error(502, None).is_retryable());
    }

    #[test]
    fn telegram_client_errors_are_permanent() {
        assert!(!api_error(400, None).is_retryable());
        assert!(!api_error(403, None).is_retryable());
        assert!(!api_error(401, None).is_retryable());
    }

    #[test]
    fn telegram_retry_after_is_exposed() {
        assert_eq!(
            api_error(429, Some(3)).retry_after(),
            Some(Duration::from_secs(3))
        );
        assert_eq!(api_error(429, None).retry_after(), None);
        assert_eq!(Error::Other("x".into()).retry_after(), None);
    }

    #[test]
    fn io_transient_kinds_are_retryable() {
        for kind in [
            std::io::ErrorKind::TimedOut,
            std::io::ErrorKind::ConnectionReset,
            std::io::ErrorKind::BrokenPipe,
        ] {
            assert!(Error::Io(std::io::Error::new(kind, "x")).is_retryable(), "{kind:?}");
        }
        let denied = Error::Io(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "x"));
        assert!(!denied.is_retryable());
    }

    #[test]
    fn local_errors_are_permanent() {
        assert!(!Error::config("BOT_TOKEN", "missing").is_retryable());
        assert!(!Error::ExternalTool("not found".into()).is_retryable());
        assert!(!Error::Other("x".into()).is_retryable());
        let err = Error::Serialization(serde_json::from_str::<String>("bad").unwrap_err());
        assert!(!err.is_retryable());
    }
}
