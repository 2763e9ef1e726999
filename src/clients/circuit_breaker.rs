// src/clients/circuit_breaker.rs
// Consecutive-failure counter + cooldown deadline. Grounded in the shape of
// `utils/rate_limiter.rs`'s governor-based wrapper, reimplemented as a plain
// atomic counter since the spec's breaker semantics (N consecutive failures,
// cooldown) don't need a token bucket.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::{Duration, Instant};

pub struct CircuitBreaker {
    threshold: u32,
    cooldown: Duration,
    consecutive_failures: AtomicU32,
    opened_at_millis: AtomicU64,
    epoch: Instant,
}

impl CircuitBreaker {
    pub fn new(threshold: u32, cooldown: Duration) -> Self {
        Self {
            threshold,
            cooldown,
            consecutive_failures: AtomicU32::new(0),
            opened_at_millis: AtomicU64::new(0),
            epoch: Instant::now(),
        }
    }

    /// Short-circuits further calls once open, until the cooldown elapses.
    pub fn is_open(&self) -> bool {
        let opened_at = self.opened_at_millis.load(Ordering::SeqCst);
        if opened_at == 0 {
            return false;
        }
        let elapsed = self.epoch.elapsed().as_millis() as u64;
        if elapsed.saturating_sub(opened_at) >= self.cooldown.as_millis() as u64 {
            // Cooldown elapsed: half-open, allow the next call to re-probe.
            self.opened_at_millis.store(0, Ordering::SeqCst);
            self.consecutive_failures.store(0, Ordering::SeqCst);
            return false;
        }
        true
    }

    pub fn record_success(&self) {
        self.consecutive_failures.store(0, Ordering::SeqCst);
        self.opened_at_millis.store(0, Ordering::SeqCst);
    }

    pub fn record_failure(&self) {
        let failures = self.consecutive_failures.fetch_add(1, Ordering::SeqCst) + 1;
        if failures >= self.threshold {
            self.opened_at_millis
                .store(self.epoch.elapsed().as_millis() as u64, Ordering::SeqCst);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_after_threshold_consecutive_failures() {
        let cb = CircuitBreaker::new(3, Duration::from_secs(30));
        assert!(!cb.is_open());
        cb.record_failure();
        cb.record_failure();
        assert!(!cb.is_open());
        cb.record_failure();
        assert!(cb.is_open());
    }

    #[test]
    fn success_resets_failure_count() {
        let cb = CircuitBreaker::new(3, Duration::from_secs(30));
        cb.record_failure();
        cb.record_failure();
        cb.record_success();
        cb.record_failure();
        assert!(!cb.is_open());
    }

    #[test]
    fn reopens_as_half_open_after_cooldown() {
        let cb = CircuitBreaker::new(1, Duration::from_millis(1));
        cb.record_failure();
        assert!(cb.is_open());
        std::thread::sleep(Duration::from_millis(20));
        assert!(!cb.is_open());
    }
}
