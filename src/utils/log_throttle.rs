use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};
use std::time::{Duration, Instant};

#[derive(Debug)]
struct Window {
    opened_at: Instant,
    suppressed: u64,
}

/// Per-key rate limiter for log lines that can repeat on every evaluation,
/// such as gate redirects while the session is still being verified.
#[derive(Debug, Default)]
pub struct LogThrottle {
    windows: Mutex<HashMap<String, Window>>,
}

impl LogThrottle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `Some(suppressed)` when the line for `key` should be written,
    /// carrying how many were swallowed since the last one. Returns `None`
    /// while the current window for `key` is still open.
    pub fn check(&self, key: &str, interval: Duration) -> Option<u64> {
        // A poisoned map only loses throttling state; keep logging.
        let mut windows = match self.windows.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let now = Instant::now();

        if let Some(window) = windows.get_mut(key) {
            if now.duration_since(window.opened_at) < interval {
                window.suppressed += 1;
                return None;
            }
            let suppressed = window.suppressed;
            window.opened_at = now;
            window.suppressed = 0;
            return Some(suppressed);
        }

        windows.insert(
            key.to_string(),
            Window {
                opened_at: now,
                suppressed: 0,
            },
        );
        Some(0)
    }
}

static GLOBAL: OnceLock<LogThrottle> = OnceLock::new();

/// Process-wide [`LogThrottle::check`].
pub fn should_emit(key: &str, interval: Duration) -> Option<u64> {
    GLOBAL.get_or_init(LogThrottle::new).check(key, interval)
}
