//! Bounded retry for provider calls
//!
//! Transient failures (network, timeouts, 429, 5xx) are retried with
//! exponential backoff; anything else fails on the first attempt.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

use super::Error;

/// Retry policy applied to every LLM round trip
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    max_retries: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Execute an operation, retrying transient failures
    pub async fn execute<F, Fut, T>(&self, operation: F, provider_name: &str) -> Result<T, Error>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        let attempts = self.max_retries + 1;
        let mut attempt = 1;

        loop {
            match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::info!("{provider_name} succeeded on attempt {attempt}/{attempts}");
                    }
                    return Ok(value);
                }
                Err(error) => {
                    if !is_retryable_error(&error.message) {
                        return Err(error);
                    }
                    if attempt >= attempts {
                        return Err(Error::new(
                            &error.provider,
                            format!("Failed after {attempts} attempts: {}", error.message),
                        ));
                    }

                    let delay = self.calculate_delay(attempt, &error.message);
                    tracing::warn!(
                        "{provider_name} attempt {attempt}/{attempts} failed: {}. Retrying in {:?}",
                        error.message,
                        delay
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Delay before the next attempt. Rate limits back off harder.
    fn calculate_delay(&self, attempt: u32, error: &str) -> Duration {
        let multiplier: u32 = if is_rate_limit(error) { 4 } else { 2 };
        let delay = self.base_delay * multiplier.pow(attempt.saturating_sub(1));
        delay.min(Duration::from_secs(60))
    }
}

fn is_rate_limit(error: &str) -> bool {
    let error_lower = error.to_lowercase();
    error_lower.contains("429")
        || error_lower.contains("too many requests")
        || error_lower.contains("rate limit")
        || error_lower.contains("quota exceeded")
}

/// Determine if an error is worth another attempt
pub fn is_retryable_error(error: &str) -> bool {
    let error_lower = error.to_lowercase();

    // Network errors
    if error_lower.contains("network")
        || error_lower.contains("connection")
        || error_lower.contains("timeout")
        || error_lower.contains("timed out")
    {
        return true;
    }

    if is_rate_limit(&error_lower) {
        return true;
    }

    // Server errors
    ["500", "502", "503", "504"]
        .iter()
        .any(|code| error_lower.contains(&format!("http {code}")))
        || error_lower.contains("internal server error")
        || error_lower.contains("bad gateway")
        || error_lower.contains("service unavailable")
        || error_lower.contains("overloaded")
}
