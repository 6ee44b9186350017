use std::time::Duration;

/// Bounded exponential backoff used by delivery channels that retry.
/// `attempt` is zero-based: attempt 0 waits `base_delay`, each further
/// attempt doubles it up to `max_delay`.
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub jitter_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            jitter_factor: 0.25,
        }
    }
}

impl RetryPolicy {
    pub fn with_max_attempts(mut self, n: u32) -> Self {
        self.max_attempts = n;
        self
    }

    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base_ms = self.base_delay.as_millis() as u64;
        let backoff_ms = base_ms
            .checked_shl(attempt)
            .unwrap_or(u64::MAX)
            .min(self.max_delay.as_millis() as u64);
        Duration::from_millis(self.jittered(backoff_ms))
    }

    fn jittered(&self, ms: u64) -> u64 {
        if self.jitter_factor <= 0.0 {
            return ms;
        }
        // Clock-noise pseudo-randomness; enough to de-synchronize concurrent
        // retries without pulling in a rand crate.
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::SystemTime::UNIX_EPOCH)
            .unwrap_or_default()
            .subsec_nanos();
        let unit = f64::from(nanos % 10_000) / 10_000.0;
        let spread = ms as f64 * self.jitter_factor;
        ((ms as f64 - spread) + unit * 2.0 * spread).max(0.0) as u64
    }
}
