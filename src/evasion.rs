use rand::Rng;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::sleep;

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:109.0) Gecko/20100101 Firefox/119.0",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
];

const DEFAULT_DELAY_MS: (u64, u64) = (500, 2000);

/// Gates outbound probe requests. When evasion is on, `admit` blocks the
/// calling worker for a randomized interval and hands back a rotated
/// User-Agent; when off it is a no-op. Requests are never reordered or
/// dropped, only delayed and tagged.
pub struct RateGate {
    enabled: bool,
    delay_ms: (u64, u64),
    cursor: AtomicUsize,
}

impl RateGate {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            delay_ms: DEFAULT_DELAY_MS,
            cursor: AtomicUsize::new(0),
        }
    }

    #[cfg(test)]
    pub fn with_delay_range(enabled: bool, min_ms: u64, max_ms: u64) -> Self {
        Self {
            enabled,
            delay_ms: (min_ms, max_ms),
            cursor: AtomicUsize::new(0),
        }
    }

    /// Called before each outbound request. Returns the identity header
    /// value to use, or None when evasion is disabled.
    pub async fn admit(&self) -> Option<&'static str> {
        if !self.enabled {
            return None;
        }

        let (min, max) = self.delay_ms;
        // Rng handle must not be held across the await point
        let wait = rand::thread_rng().gen_range(min..=max);
        sleep(Duration::from_millis(wait)).await;

        let idx = self.cursor.fetch_add(1, Ordering::Relaxed) % USER_AGENTS.len();
        Some(USER_AGENTS[idx])
    }
}
