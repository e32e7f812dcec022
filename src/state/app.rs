use crate::config::EngineConfig;
use crate::content::ContentCache;
use crate::metrics::Metrics;
use crate::pipeline::JobHub;

/// Process-wide shared state.
/// Everything mutable lives behind its own handle and is passed explicitly,
/// so cloning an `EngineState` shares the same cache, counters and channels.
#[derive(Clone)]
pub struct EngineState {
    /// Generated task lists (LRU with TTL)
    pub content_cache: ContentCache,
    pub metrics: Metrics,
    /// Live job progress channels
    pub hub: JobHub,
}

impl EngineState {
    pub fn new(config: &EngineConfig) -> Self {
        EngineState {
            content_cache: ContentCache::new(
                config.content.cache_capacity,
                chrono::Duration::hours(config.content.cache_ttl_hours),
            ),
            metrics: Metrics::new(),
            hub: JobHub::new(config.jobs.event_capacity),
        }
    }
}

impl Default for EngineState {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}
