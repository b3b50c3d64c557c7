//! Login rate limiter
//!
//! Counts failed logins per identifier (email or username, case-insensitive)
//! inside a sliding window. Once the limit is reached further attempts are
//! refused until old failures age out.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

pub struct LoginRateLimiter {
    failures: RwLock<HashMap<String, Vec<DateTime<Utc>>>>,
    max_attempts: usize,
    window: Duration,
}

impl LoginRateLimiter {
    /// 5 failures per 15 minutes
    pub fn new() -> Self {
        Self::with_limits(5, 15)
    }

    pub fn with_limits(max_attempts: u32, window_minutes: u64) -> Self {
        Self {
            failures: RwLock::new(HashMap::new()),
            max_attempts: max_attempts.max(1) as usize,
            window: Duration::minutes(window_minutes as i64),
        }
    }

    fn key(identifier: &str) -> String {
        identifier.trim().to_lowercase()
    }

    /// Whether the identifier has used up its attempts
    pub async fn is_limited(&self, identifier: &str) -> bool {
        let cutoff = Utc::now() - self.window;
        let mut failures = self.failures.write().await;
        match failures.get_mut(&Self::key(identifier)) {
            Some(times) => {
                times.retain(|t| *t > cutoff);
                times.len() >= self.max_attempts
            }
            None => false,
        }
    }

    /// Record a failure; identifiers whose failures have all aged out are dropped
    pub async fn record_failure(&self, identifier: &str) {
        let now = Utc::now();
        let cutoff = now - self.window;
        let mut failures = self.failures.write().await;
        Self::prune(&mut failures, cutoff);
        failures.entry(Self::key(identifier)).or_default().push(now);
    }

    /// Forget failures after a successful login
    pub async fn clear(&self, identifier: &str) {
        self.failures.write().await.remove(&Self::key(identifier));
    }

    /// Drop identifiers whose failures have all aged out
    pub async fn cleanup(&self) {
        let cutoff = Utc::now() - self.window;
        Self::prune(&mut *self.failures.write().await, cutoff);
    }

    fn prune(failures: &mut HashMap<String, Vec<DateTime<Utc>>>, cutoff: DateTime<Utc>) {
        failures.retain(|_, times| {
            times.retain(|t| *t > cutoff);
            !times.is_empty()
        });
    }

    #[cfg(test)]
    async fn tracked_identifiers(&self) -> usize {
        self.failures.read().await.len()
    }
}

impl Default for LoginRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_limit_after_max_failures() {
        let limiter = LoginRateLimiter::new();
        for _ in 0..4 {
            limiter.record_failure("asha@example.in").await;
        }
        assert!(!limiter.is_limited("asha@example.in").await);

        limiter.record_failure("asha@example.in").await;
        assert!(limiter.is_limited("asha@example.in").await);
        assert!(!limiter.is_limited("ravi@example.in").await);

        limiter.clear("asha@example.in").await;
        assert!(!limiter.is_limited("asha@example.in").await);
    }

    #[tokio::test]
    async fn test_identifier_is_case_insensitive() {
        let limiter = LoginRateLimiter::with_limits(2, 15);
        limiter.record_failure("Asha@Example.in").await;
        limiter.record_failure(" asha@example.IN ").await;
        assert!(limiter.is_limited("ASHA@EXAMPLE.IN").await);
    }

    #[tokio::test]
    async fn test_zero_window_never_limits() {
        let limiter = LoginRateLimiter::with_limits(1, 0);
        limiter.record_failure("x").await;
        assert!(!limiter.is_limited("x").await);
        limiter.cleanup().await;
        assert!(limiter.failures.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_stale_identifiers_do_not_accumulate() {
        let limiter = LoginRateLimiter::with_limits(5, 0);
        for i in 0..1000 {
            limiter.record_failure(&format!("guess-{}@example.in", i)).await;
        }
        assert!(limiter.tracked_identifiers().await <= 1);
    }

    #[tokio::test]
    async fn test_live_failures_survive_pruning() {
        let limiter = LoginRateLimiter::with_limits(2, 15);
        limiter.record_failure("asha@example.in").await;
        limiter.record_failure("ravi@example.in").await;
        limiter.record_failure("asha@example.in").await;
        assert_eq!(limiter.tracked_identifiers().await, 2);
        assert!(limiter.is_limited("asha@example.in").await);
    }
}
