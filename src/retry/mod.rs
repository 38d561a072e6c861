//! Retry policy (C9, spec.md §4.9).
//!
//! Generalizes the exponential-backoff loop the teacher hand-rolls in
//! `orchestration/sse_subscriber.rs` (`reconnect_delay = (reconnect_delay *
//! 2).min(max)`) into a reusable, categorized policy with jitter and a
//! `should_retry` predicate per spec.md's three named categories.

use std::time::Duration;

use rand::Rng;

use crate::errors::{ErrorCategory, StructuredError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyCategory {
    Default,
    Network,
    Api,
}

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub category: PolicyCategory,
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
    pub jitter: bool,
}

impl RetryConfig {
    pub fn default_policy() -> Self {
        Self {
            category: PolicyCategory::Default,
            max_attempts: 5,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
            jitter: true,
        }
    }

    pub fn network_policy() -> Self {
        Self {
            category: PolicyCategory::Network,
            max_attempts: u32::MAX,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            multiplier: 1.5,
            jitter: true,
        }
    }

    pub fn api_policy() -> Self {
        Self {
            category: PolicyCategory::Api,
            max_attempts: 5,
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
            jitter: true,
        }
    }

    /// `should_retry` predicates per spec.md §4.9.
    pub fn should_retry(&self, error: &StructuredError) -> bool {
        use ErrorCategory::*;
        match self.category {
            PolicyCategory::Default => match error.category {
                Network | Timeout | Api => true,
                Auth | Validation | Permission => false,
                _ => error.recoverable,
            },
            PolicyCategory::Network => match error.category {
                Network | Timeout => true,
                Api => matches!(
                    error.code.as_str(),
                    "CONNECTION_REFUSED" | "TIMEOUT" | "SERVICE_UNAVAILABLE" | "RATE_LIMITED" | "SERVER_ERROR"
                ),
                _ => false,
            },
            PolicyCategory::Api => match error.category {
                Network | Timeout => true,
                Api => matches!(
                    error.code.as_str(),
                    "SERVER_ERROR" | "RATE_LIMITED" | "SERVICE_UNAVAILABLE" | "TIMEOUT"
                ),
                _ => false,
            },
        }
    }

    /// Base delay for attempt `n` (1-indexed), before jitter: spec.md §4.9,
    /// property P5.
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let exp = self.multiplier.powi(attempt.saturating_sub(1) as i32);
        let millis = self.initial_delay.as_secs_f64() * 1000.0 * exp;
        let capped = millis.min(self.max_delay.as_secs_f64() * 1000.0);
        Duration::from_millis(capped.max(0.0) as u64)
    }

    /// Delay for attempt `n`, with jitter applied if enabled: `delay_n =
    /// base_delay(n) * (1 + U[0, 0.1])`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base = self.base_delay(attempt);
        if !self.jitter {
            return base;
        }
        let mut rng = rand::thread_rng();
        let factor = 1.0 + rng.gen_range(0.0..0.1);
        Duration::from_millis((base.as_millis() as f64 * factor) as u64)
    }
}

/// Runs `op` with this policy, retrying on `should_retry`-eligible errors
/// until `max_attempts` is exhausted or `cancel` resolves. Cancellation via
/// context cancels the delay promptly (spec.md §4.9).
pub async fn retry_with_policy<F, Fut, T>(
    policy: &RetryConfig,
    cancel: &tokio_util::sync::CancellationToken,
    mut op: F,
) -> Result<T, StructuredError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, StructuredError>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if attempt >= policy.max_attempts || !policy.should_retry(&err) {
                    return Err(err);
                }
                let delay = policy.delay_for_attempt(attempt);
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = cancel.cancelled() => return Err(err),
                }
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_delay_respects_cap() {
        let cfg = RetryConfig {
            category: PolicyCategory::Network,
            max_attempts: 5,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            multiplier: 1.5,
            jitter: false,
        };
        assert_eq!(cfg.base_delay(1), Duration::from_millis(500));
        assert_eq!(cfg.base_delay(2), Duration::from_millis(750));
        // 500 * 1.5^4 = 2531.25ms, well under the 10s cap
        assert_eq!(cfg.base_delay(5), Duration::from_millis(2531));
    }

    #[test]
    fn jitter_stays_within_bounds() {
        let cfg = RetryConfig::network_policy();
        let base = cfg.base_delay(3).as_millis() as f64;
        for _ in 0..50 {
            let got = cfg.delay_for_attempt(3).as_millis() as f64;
            assert!(got >= base);
            assert!(got <= base * 1.11);
        }
    }

    #[test]
    fn default_policy_predicate() {
        let cfg = RetryConfig::default_policy();
        assert!(cfg.should_retry(&StructuredError::network("x")));
        assert!(!cfg.should_retry(&StructuredError::auth("x")));
        assert!(!cfg.should_retry(&StructuredError::validation("x")));
    }

    #[test]
    fn network_policy_gates_api_codes() {
        let cfg = RetryConfig::network_policy();
        assert!(cfg.should_retry(&StructuredError::api("SERVER_ERROR", "x")));
        assert!(!cfg.should_retry(&StructuredError::api("BAD_REQUEST", "x")));
    }

    // A sync `#[test]` driving an async call via `tokio_test::block_on`,
    // the same shape the teacher uses in `ics/suggestions.rs` to call async
    // setup from otherwise-sync tests.
    #[test]
    fn retry_with_policy_retries_until_success() {
        let cfg = RetryConfig {
            category: PolicyCategory::Default,
            max_attempts: 3,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            multiplier: 1.0,
            jitter: false,
        };
        let cancel = tokio_util::sync::CancellationToken::new();
        let attempts = std::sync::atomic::AtomicU32::new(0);

        let result = tokio_test::block_on(retry_with_policy(&cfg, &cancel, || {
            let n = attempts.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(StructuredError::network("transient"))
                } else {
                    Ok::<u32, StructuredError>(42)
                }
            }
        }));

        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts.load(std::sync::atomic::Ordering::SeqCst), 3);
    }

    #[test]
    fn retry_with_policy_stops_on_non_retryable_error() {
        let cfg = RetryConfig::default_policy();
        let cancel = tokio_util::sync::CancellationToken::new();
        let attempts = std::sync::atomic::AtomicU32::new(0);

        let result = tokio_test::block_on(retry_with_policy(&cfg, &cancel, || {
            attempts.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            async { Err::<(), StructuredError>(StructuredError::auth("denied")) }
        }));

        assert!(result.is_err());
        assert_eq!(attempts.load(std::sync::atomic::Ordering::SeqCst), 1);
    }
}
