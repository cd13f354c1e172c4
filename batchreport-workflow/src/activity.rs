//! Units of work the engine can invoke by name.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::ActivityError;

/// A named, independently retryable unit of work with serializable I/O.
#[async_trait]
pub trait Activity: Send + Sync + 'static {
    type Params: DeserializeOwned + Send + 'static;
    type Output: Serialize + Send + 'static;

    fn name(&self) -> &'static str;

    async fn execute(&self, params: Self::Params) -> Result<Self::Output, ActivityError>;
}

/// JSON-in / JSON-out view of an [`Activity`], as stored in the engine registry.
#[async_trait]
pub(crate) trait ErasedActivity: Send + Sync {
    async fn execute_json(&self, input: Value) -> Result<Value, ActivityError>;
}

pub(crate) struct Erased<A>(pub A);

#[async_trait]
impl<A: Activity> ErasedActivity for Erased<A> {
    async fn execute_json(&self, input: Value) -> Result<Value, ActivityError> {
        let params: A::Params = serde_json::from_value(input)
            .map_err(|e| ActivityError::non_retryable(format!("decode params: {e}")))?;
        let output = self.0.execute(params).await?;
        serde_json::to_value(output)
            .map_err(|e| ActivityError::non_retryable(format!("encode output: {e}")))
    }
}

// ---------------------------------------------------------------------------
// Execution policy
// ---------------------------------------------------------------------------

/// Per-call execution policy.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityOptions {
    /// Wall-clock budget for the whole call, retries and backoff included.
    pub schedule_to_close_timeout: Duration,
    pub retry_policy: RetryPolicy,
}

impl ActivityOptions {
    pub fn new(schedule_to_close_timeout: Duration, retry_policy: RetryPolicy) -> Self {
        Self {
            schedule_to_close_timeout,
            retry_policy,
        }
    }
}

/// Exponential backoff capped at `maximum_interval`.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub initial_interval: Duration,
    pub backoff_coefficient: f64,
    pub maximum_interval: Duration,
    /// 0 means unlimited (bounded only by the timeout).
    pub maximum_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_secs(1),
            backoff_coefficient: 2.0,
            maximum_interval: Duration::from_secs(100),
            maximum_attempts: 0,
        }
    }
}

impl RetryPolicy {
    pub fn with_maximum_attempts(maximum_attempts: u32) -> Self {
        Self {
            maximum_attempts,
            ..Self::default()
        }
    }

    /// Whether attempt number `attempt` (1-based) may start.
    pub fn allows_attempt(&self, attempt: u32) -> bool {
        self.maximum_attempts == 0 || attempt <= self.maximum_attempts
    }

    /// Delay before the retry that follows failed attempt `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(63) as i32;
        let secs = self.initial_interval.as_secs_f64() * self.backoff_coefficient.powi(exp);
        let capped = secs.min(self.maximum_interval.as_secs_f64());
        if capped.is_finite() && capped >= 0.0 {
            Duration::from_secs_f64(capped)
        } else {
            self.maximum_interval
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_attempt_policy() {
        let p = RetryPolicy::with_maximum_attempts(1);
        assert!(p.allows_attempt(1));
        assert!(!p.allows_attempt(2));
    }

    #[test]
    fn zero_means_unlimited() {
        assert!(RetryPolicy::default().allows_attempt(1_000));
    }

    #[test]
    fn backoff_grows_and_caps() {
        let p = RetryPolicy::default();
        assert_eq!(p.delay_after(1), Duration::from_secs(1));
        assert_eq!(p.delay_after(2), Duration::from_secs(2));
        assert_eq!(p.delay_after(3), Duration::from_secs(4));
        assert_eq!(p.delay_after(20), Duration::from_secs(100));
    }
}
