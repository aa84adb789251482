use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::config::RateLimitConfig;

struct WindowState {
    count: u32,
    window_start: Instant,
}

/// Fixed-window counter over failed attempts, keyed per identity and per
/// origin. Whether an unavailable limiter fails open is an explicit
/// configuration decision (`enabled`), never an implicit default.
pub struct RateLimiter {
    enabled: bool,
    max_attempts: u32,
    window: Duration,
    state: Mutex<HashMap<String, WindowState>>,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            enabled: config.enabled,
            max_attempts: config.max_attempts,
            window: Duration::from_secs(config.window_secs),
            state: Mutex::new(HashMap::new()),
        }
    }

    /// Whether the key is still allowed to attempt. Disabled limiter always
    /// allows.
    pub fn check(&self, key: &str) -> bool {
        self.check_at(key, Instant::now())
    }

    /// Record one failed attempt against the key.
    pub fn record_failure(&self, key: &str) {
        self.record_failure_at(key, Instant::now());
    }

    /// Clear the key after a successful attempt.
    pub fn reset(&self, key: &str) {
        if !self.enabled {
            return;
        }
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.remove(key);
    }

    fn check_at(&self, key: &str, now: Instant) -> bool {
        if !self.enabled {
            return true;
        }
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(w) = state.get(key) {
            if now.duration_since(w.window_start) < self.window {
                return w.count < self.max_attempts;
            }
        } else {
            return true;
        }
        // 窗口已过期
        state.remove(key);
        true
    }

    fn record_failure_at(&self, key: &str, now: Instant) {
        if !self.enabled {
            return;
        }
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let entry = state.entry(key.to_string()).or_insert(WindowState {
            count: 0,
            window_start: now,
        });
        if now.duration_since(entry.window_start) >= self.window {
            entry.count = 0;
            entry.window_start = now;
        }
        entry.count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(enabled: bool, max_attempts: u32, window_secs: u64) -> RateLimiter {
        RateLimiter::new(&RateLimitConfig {
            enabled,
            max_attempts,
            window_secs,
        })
    }

    #[test]
    fn allows_until_threshold() {
        let rl = limiter(true, 3, 300);
        let t0 = Instant::now();
        for _ in 0..2 {
            assert!(rl.check_at("login:alice", t0));
            rl.record_failure_at("login:alice", t0);
        }
        assert!(rl.check_at("login:alice", t0));
        rl.record_failure_at("login:alice", t0);
        assert!(!rl.check_at("login:alice", t0));
    }

    #[test]
    fn keys_are_independent() {
        let rl = limiter(true, 1, 300);
        let t0 = Instant::now();
        rl.record_failure_at("login:alice", t0);
        assert!(!rl.check_at("login:alice", t0));
        assert!(rl.check_at("login:bob", t0));
        assert!(rl.check_at("ip:10.0.0.1", t0));
    }

    #[test]
    fn window_expiry_clears_count() {
        let rl = limiter(true, 1, 300);
        let t0 = Instant::now();
        rl.record_failure_at("login:alice", t0);
        assert!(!rl.check_at("login:alice", t0));
        assert!(rl.check_at("login:alice", t0 + Duration::from_secs(301)));
    }

    #[test]
    fn reset_clears_key() {
        let rl = limiter(true, 1, 300);
        let t0 = Instant::now();
        rl.record_failure_at("login:alice", t0);
        rl.reset("login:alice");
        assert!(rl.check_at("login:alice", t0));
    }

    #[test]
    fn disabled_limiter_fails_open() {
        let rl = limiter(false, 1, 300);
        let t0 = Instant::now();
        for _ in 0..10 {
            rl.record_failure_at("login:alice", t0);
        }
        assert!(rl.check_at("login:alice", t0));
    }
}
