//! Login rate limiting.
//!
//! One token bucket per normalized email address, so a credential-stuffing
//! run against one account is throttled without affecting other admins.

use governor::{
    clock::{Clock, DefaultClock},
    DefaultKeyedRateLimiter, Quota, RateLimiter,
};
use std::num::NonZeroU32;

/// Tracked keys above which refilled buckets are dropped on the next check.
const PRUNE_THRESHOLD: usize = 4096;

pub struct LoginRateLimiter {
    limiter: DefaultKeyedRateLimiter<String>,
    clock: DefaultClock,
    per_minute: u32,
}

impl LoginRateLimiter {
    /// `None` when `per_minute` is zero, which disables the limit.
    pub fn new(per_minute: u32) -> Option<Self> {
        let burst = NonZeroU32::new(per_minute)?;
        Some(Self {
            limiter: RateLimiter::keyed(Quota::per_minute(burst)),
            clock: DefaultClock::default(),
            per_minute,
        })
    }

    /// Counts one attempt for `email`. On rejection returns the seconds to
    /// wait, at least one.
    pub fn check(&self, email: &str) -> Result<(), u64> {
        if self.limiter.len() >= PRUNE_THRESHOLD {
            self.limiter.retain_recent();
        }
        let key = email.trim().to_lowercase();
        self.limiter.check_key(&key).map_err(|not_until| {
            not_until
                .wait_time_from(self.clock.now())
                .as_secs()
                .max(1)
        })
    }
}

impl std::fmt::Debug for LoginRateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRateLimiter")
            .field("per_minute", &self.per_minute)
            .field("tracked_keys", &self.limiter.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_disables_limiter() {
        assert!(LoginRateLimiter::new(0).is_none());
    }

    #[test]
    fn test_allows_burst_then_rejects() {
        let limiter = LoginRateLimiter::new(3).unwrap();
        for _ in 0..3 {
            assert!(limiter.check("admin@example.com").is_ok());
        }
        let retry_after = limiter.check("admin@example.com").unwrap_err();
        assert!(retry_after >= 1);
    }

    #[test]
    fn test_keys_are_normalized() {
        let limiter = LoginRateLimiter::new(1).unwrap();
        assert!(limiter.check("Admin@Example.com").is_ok());
        assert!(limiter.check("  admin@example.com ").is_err());
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = LoginRateLimiter::new(1).unwrap();
        assert!(limiter.check("first@example.com").is_ok());
        assert!(limiter.check("second@example.com").is_ok());
        assert!(limiter.check("first@example.com").is_err());
    }
}
