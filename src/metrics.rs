use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use serde::{Deserialize, Serialize};

/// Engine counters. All metrics are atomic counters for thread-safety;
/// clones share the same counters.
#[derive(Clone, Default)]
pub struct Metrics {
    pub plans_built: Arc<AtomicU64>,
    pub jobs_started: Arc<AtomicU64>,
    pub jobs_completed: Arc<AtomicU64>,
    pub jobs_failed: Arc<AtomicU64>,
    /// Stage start/finish events emitted by running jobs
    pub stage_transitions: Arc<AtomicU64>,
    pub content_cache_hits: Arc<AtomicU64>,
    pub content_cache_misses: Arc<AtomicU64>,
    /// Plans that stayed on curated tasks because the content source failed
    pub content_fallbacks: Arc<AtomicU64>,
    pub sessions_recorded: Arc<AtomicU64>,
    pub reviews_completed: Arc<AtomicU64>,
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub plans_built: u64,
    pub jobs_started: u64,
    pub jobs_completed: u64,
    pub jobs_failed: u64,
    pub stage_transitions: u64,
    pub content_cache_hits: u64,
    pub content_cache_misses: u64,
    pub content_fallbacks: u64,
    pub sessions_recorded: u64,
    pub reviews_completed: u64,
}

fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_plan_built(&self) {
        bump(&self.plans_built);
    }

    pub fn record_job_started(&self) {
        bump(&self.jobs_started);
    }

    pub fn record_job_completed(&self) {
        bump(&self.jobs_completed);
    }

    pub fn record_job_failed(&self) {
        bump(&self.jobs_failed);
    }

    pub fn record_stage_transition(&self) {
        bump(&self.stage_transitions);
    }

    pub fn record_cache_hit(&self) {
        bump(&self.content_cache_hits);
    }

    pub fn record_cache_miss(&self) {
        bump(&self.content_cache_misses);
    }

    pub fn record_fallback(&self) {
        bump(&self.content_fallbacks);
    }

    pub fn record_session(&self) {
        bump(&self.sessions_recorded);
    }

    pub fn record_review(&self) {
        bump(&self.reviews_completed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let read = |c: &AtomicU64| c.load(Ordering::Relaxed);
        MetricsSnapshot {
            plans_built: read(&self.plans_built),
            jobs_started: read(&self.jobs_started),
            jobs_completed: read(&self.jobs_completed),
            jobs_failed: read(&self.jobs_failed),
            stage_transitions: read(&self.stage_transitions),
            content_cache_hits: read(&self.content_cache_hits),
            content_cache_misses: read(&self.content_cache_misses),
            content_fallbacks: read(&self.content_fallbacks),
            sessions_recorded: read(&self.sessions_recorded),
            reviews_completed: read(&self.reviews_completed),
        }
    }
}
