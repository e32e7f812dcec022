use std::num::NonZeroUsize;
use std::sync::Arc;
use chrono::{DateTime, Duration, Utc};
use lru::LruCache;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use crate::difficulty::Difficulty;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CachedTasks {
    pub tasks: Vec<String>,
    pub stored_at: i64,
}

/// Cache key for one (topic, difficulty, user) request.
pub fn cache_key(topic: &str, difficulty: Difficulty, user_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(topic.trim().to_lowercase().as_bytes());
    hasher.update([0u8]);
    hasher.update(difficulty.as_str().as_bytes());
    hasher.update([0u8]);
    hasher.update(user_id.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// Bounded LRU of generated task lists with a time-to-live.
#[derive(Clone)]
pub struct ContentCache {
    entries: Arc<RwLock<LruCache<String, CachedTasks>>>,
    ttl: Duration,
}

impl ContentCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        ContentCache {
            entries: Arc::new(RwLock::new(LruCache::new(capacity))),
            ttl,
        }
    }

    /// Fresh entry for `key`, if any. Expired entries are evicted.
    pub fn get(&self, key: &str, now: DateTime<Utc>) -> Option<Vec<String>> {
        let expired = {
            let entries = self.entries.read();
            match entries.peek(key) {
                Some(cached) if now.timestamp() - cached.stored_at < self.ttl.num_seconds() => {
                    tracing::debug!(key = key.get(..12).unwrap_or(key), "Content cache hit");
                    return Some(cached.tasks.clone());
                }
                Some(_) => true,
                None => false,
            }
        };

        if expired {
            tracing::debug!(key = key.get(..12).unwrap_or(key), "Content cache entry expired");
            self.entries.write().pop(key);
        }
        None
    }

    pub fn put(&self, key: String, tasks: Vec<String>, now: DateTime<Utc>) {
        let cached = CachedTasks {
            tasks,
            stored_at: now.timestamp(),
        };
        self.entries.write().put(key, cached);
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
