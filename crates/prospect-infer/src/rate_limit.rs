//! Rolling-window request limiter owned by a single generator.

use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Allows at most `max_requests` per window; the count resets once the
/// window has elapsed since it opened.
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    state: Mutex<WindowState>,
}

struct WindowState {
    opened_at: Instant,
    count: u32,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            state: Mutex::new(WindowState {
                opened_at: Instant::now(),
                count: 0,
            }),
        }
    }

    pub fn per_minute(max_requests: u32) -> Self {
        Self::new(max_requests, Duration::from_secs(60))
    }

    /// Take one slot if available in the current window.
    pub fn try_acquire(&self) -> bool {
        let mut state = self.state.lock();
        if state.opened_at.elapsed() >= self.window {
            state.opened_at = Instant::now();
            state.count = 0;
        }
        if state.count >= self.max_requests {
            return false;
        }
        state.count += 1;
        true
    }

    /// Slots left in the current window.
    pub fn remaining(&self) -> u32 {
        let state = self.state.lock();
        if state.opened_at.elapsed() >= self.window {
            return self.max_requests;
        }
        self.max_requests.saturating_sub(state.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_within_window() {
        let limiter = RateLimiter::per_minute(2);
        assert!(limiter.try_acquire());
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());
        assert_eq!(limiter.remaining(), 0);
    }

    #[test]
    fn test_window_resets() {
        let limiter = RateLimiter::new(1, Duration::from_millis(1));
        assert!(limiter.try_acquire());
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(limiter.remaining(), 1);
        assert!(limiter.try_acquire());
    }

    #[test]
    fn test_zero_budget_denies() {
        let limiter = RateLimiter::per_minute(0);
        assert!(!limiter.try_acquire());
    }
}
