use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Fixed-window per-conversation turn limiter.
///
/// An owned object with an explicit lifecycle, never a module-level map:
/// every orchestrator instance carries its own limiter and tests reset it
/// with `clear`.
pub struct RateLimiter {
    max_per_window: u32,
    window: Duration,
    state: Mutex<HashMap<String, WindowState>>,
}

struct WindowState {
    window_start: Instant,
    count: u32,
}

impl RateLimiter {
    pub fn new(max_per_window: u32, window: Duration) -> Self {
        Self { max_per_window, window, state: Mutex::new(HashMap::new()) }
    }

    pub fn per_minute(max_per_minute: u32) -> Self {
        Self::new(max_per_minute, Duration::from_secs(60))
    }

    /// Record one attempt for `key` and report whether it is allowed.
    pub fn check(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut state = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let entry = state
            .entry(key.to_owned())
            .or_insert(WindowState { window_start: now, count: 0 });
        if now.duration_since(entry.window_start) >= self.window {
            entry.window_start = now;
            entry.count = 0;
        }
        entry.count += 1;
        entry.count <= self.max_per_window
    }

    pub fn clear(&self) {
        match self.state.lock() {
            Ok(mut state) => state.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::RateLimiter;

    #[test]
    fn allows_up_to_the_limit_then_blocks() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60));
        assert!(limiter.check("c-1"));
        assert!(limiter.check("c-1"));
        assert!(!limiter.check("c-1"));
    }

    #[test]
    fn conversations_are_limited_independently() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        assert!(limiter.check("c-1"));
        assert!(!limiter.check("c-1"));
        assert!(limiter.check("c-2"));
    }

    #[test]
    fn window_expiry_resets_the_count() {
        let limiter = RateLimiter::new(1, Duration::ZERO);
        assert!(limiter.check("c-1"));
        assert!(limiter.check("c-1"));
    }

    #[test]
    fn clear_resets_all_windows() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        assert!(limiter.check("c-1"));
        limiter.clear();
        assert!(limiter.check("c-1"));
    }
}
