//! Fixed-window rate limiter for text-generation requests
//!
//! Counts requests in consecutive windows of fixed length. When a window is
//! exhausted the caller is told how many seconds remain until it resets.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::config::RateLimitConfig;
use crate::error::{AppError, AppResult};

/// Outcome of a rate limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed { remaining: u32 },
    Rejected { retry_after_secs: u64 },
}

struct Window {
    started: Instant,
    count: u32,
}

/// Fixed-window counter shared across request handlers
pub struct FixedWindowRateLimiter {
    max_requests: u32,
    window: Duration,
    state: Mutex<Option<Window>>,
}

impl FixedWindowRateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            state: Mutex::new(None),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.max_requests, Duration::from_secs(config.window_secs))
    }

    /// Record a request now
    pub fn check(&self) -> RateLimitDecision {
        self.check_at(Instant::now())
    }

    /// Record a request at the given instant
    pub fn check_at(&self, now: Instant) -> RateLimitDecision {
        // The counter stays consistent even if a holder panicked.
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        let expired = match state.as_ref() {
            Some(window) => now.saturating_duration_since(window.started) >= self.window,
            None => true,
        };
        if expired {
            *state = None;
        }
        let window = state.get_or_insert_with(|| Window {
            started: now,
            count: 0,
        });

        if window.count < self.max_requests {
            window.count += 1;
            RateLimitDecision::Allowed {
                remaining: self.max_requests - window.count,
            }
        } else {
            let elapsed = now.saturating_duration_since(window.started);
            let remaining = self.window.saturating_sub(elapsed);
            RateLimitDecision::Rejected {
                retry_after_secs: remaining.as_secs_f64().ceil().max(1.0) as u64,
            }
        }
    }

    /// Record a request, failing with [`AppError::RateLimited`] when exhausted
    pub fn acquire(&self) -> AppResult<()> {
        match self.check() {
            RateLimitDecision::Allowed { remaining } => {
                tracing::debug!(remaining, "Text generation request admitted");
                Ok(())
            }
            RateLimitDecision::Rejected { retry_after_secs } => {
                tracing::warn!(retry_after_secs, "Text generation rate limit exhausted");
                Err(AppError::RateLimited { retry_after_secs })
            }
        }
    }
}

impl Default for FixedWindowRateLimiter {
    fn default() -> Self {
        Self::from_config(&RateLimitConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admits_up_to_limit() {
        let limiter = FixedWindowRateLimiter::new(3, Duration::from_secs(60));
        let start = Instant::now();

        assert_eq!(limiter.check_at(start), RateLimitDecision::Allowed { remaining: 2 });
        assert_eq!(limiter.check_at(start), RateLimitDecision::Allowed { remaining: 1 });
        assert_eq!(limiter.check_at(start), RateLimitDecision::Allowed { remaining: 0 });
        assert!(matches!(
            limiter.check_at(start),
            RateLimitDecision::Rejected { .. }
        ));
    }

    #[test]
    fn test_retry_after_counts_down() {
        let limiter = FixedWindowRateLimiter::new(1, Duration::from_secs(60));
        let start = Instant::now();
        limiter.check_at(start);

        assert_eq!(
            limiter.check_at(start + Duration::from_secs(20)),
            RateLimitDecision::Rejected { retry_after_secs: 40 }
        );
        assert_eq!(
            limiter.check_at(start + Duration::from_millis(59_500)),
            RateLimitDecision::Rejected { retry_after_secs: 1 }
        );
    }

    #[test]
    fn test_new_window_admits_again() {
        let limiter = FixedWindowRateLimiter::new(1, Duration::from_secs(60));
        let start = Instant::now();
        limiter.check_at(start);
        assert!(matches!(
            limiter.check_at(start + Duration::from_secs(30)),
            RateLimitDecision::Rejected { .. }
        ));
        assert_eq!(
            limiter.check_at(start + Duration::from_secs(60)),
            RateLimitDecision::Allowed { remaining: 0 }
        );
    }

    #[test]
    fn test_acquire_maps_to_app_error() {
        let limiter = FixedWindowRateLimiter::new(0, Duration::from_secs(10));
        assert!(matches!(
            limiter.acquire(),
            Err(AppError::RateLimited { retry_after_secs: 10 })
        ));
    }
}
