use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use parking_lot::RwLock;
use rand::Rng;

/// Failure gate for the content source. After `failure_threshold`
/// consecutive failures calls are skipped until `cooldown` has passed,
/// then one trial call is let through.
#[derive(Clone)]
pub struct CircuitBreaker {
    failures: Arc<AtomicU32>,
    opened_at: Arc<RwLock<Option<Instant>>>,
    open: Arc<AtomicBool>,
    cooldown: Duration,
    failure_threshold: u32,
}

impl CircuitBreaker {
    pub fn new(cooldown: Duration, failure_threshold: u32) -> Self {
        CircuitBreaker {
            failures: Arc::new(AtomicU32::new(0)),
            opened_at: Arc::new(RwLock::new(None)),
            open: Arc::new(AtomicBool::new(false)),
            cooldown,
            failure_threshold: failure_threshold.max(1),
        }
    }

    /// True while calls should be skipped.
    pub fn is_open(&self) -> bool {
        if !self.open.load(Ordering::Relaxed) {
            return false;
        }

        let opened_at = *self.opened_at.read();
        match opened_at {
            Some(at) if at.elapsed() >= self.cooldown => {
                // half-open: allow a trial call, one more failure reopens
                self.open.store(false, Ordering::Relaxed);
                self.failures.store(self.failure_threshold - 1, Ordering::Relaxed);
                false
            }
            _ => true,
        }
    }

    pub fn record_success(&self) {
        self.failures.store(0, Ordering::Relaxed);
        self.open.store(false, Ordering::Relaxed);
        *self.opened_at.write() = None;
    }

    pub fn record_failure(&self) {
        let failures = self.failures.fetch_add(1, Ordering::Relaxed) + 1;
        if failures >= self.failure_threshold {
            if !self.open.swap(true, Ordering::Relaxed) {
                tracing::warn!(failures, "Content source circuit opened");
            }
            *self.opened_at.write() = Some(Instant::now());
        }
    }

    pub fn failure_count(&self) -> u32 {
        self.failures.load(Ordering::Relaxed)
    }
}

/// Retry delays: doubling from `initial`, capped at `max`, with up to 20%
/// random jitter added.
#[derive(Debug, Clone, Copy)]
pub struct ExponentialBackoff {
    initial: Duration,
    max: Duration,
}

impl ExponentialBackoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        ExponentialBackoff { initial, max }
    }

    /// Delay before retry number `attempt` (0-indexed), without jitter.
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.min(16));
        self.initial.saturating_mul(factor).min(self.max)
    }

    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base = self.base_delay(attempt);
        let jitter_ms = base.as_millis() as u64 / 5;
        if jitter_ms == 0 {
            return base;
        }
        base + Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms))
    }
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self::new(Duration::from_millis(100), Duration::from_secs(5))
    }
}
