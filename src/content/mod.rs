pub mod breaker;
pub mod cache;
pub mod ollama;
pub mod parse;
pub mod templates;

use std::future::Future;
use std::pin::Pin;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::difficulty::Difficulty;
use crate::error::PlanError;
use crate::metrics::Metrics;

pub use cache::ContentCache;
pub use ollama::OllamaContentSource;
pub use templates::curated_tasks;

/// What the task generator asks an external source for.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContentRequest {
    pub user_id: String,
    pub topic: String,
    pub subtopics: Vec<String>,
    pub difficulty: Difficulty,
}

pub type ContentFuture<'a> = Pin<Box<dyn Future<Output = anyhow::Result<Vec<String>>> + Send + 'a>>;

/// External task generator. May fail or hang; callers bound it with a
/// timeout and fall back to curated tasks.
pub trait ContentSource: Send + Sync {
    fn name(&self) -> &str;
    fn generate<'a>(&'a self, request: &'a ContentRequest) -> ContentFuture<'a>;
}

/// Source that never produces anything. Used when enrichment is disabled.
pub struct NoContent;

impl ContentSource for NoContent {
    fn name(&self) -> &str {
        "none"
    }

    fn generate<'a>(&'a self, _request: &'a ContentRequest) -> ContentFuture<'a> {
        Box::pin(async { Err::<Vec<String>, _>(anyhow::anyhow!("content generation disabled")) })
    }
}

/// Fetch AI tasks through the cache with a hard timeout.
///
/// Every failure is returned as `UpstreamContent`; callers treat it as a
/// signal to stay on curated tasks.
pub async fn fetch_tasks(
    source: &dyn ContentSource,
    cache: &ContentCache,
    metrics: &Metrics,
    request: &ContentRequest,
    timeout: std::time::Duration,
    now: DateTime<Utc>,
) -> Result<Vec<String>, PlanError> {
    let key = cache::cache_key(&request.topic, request.difficulty, &request.user_id);
    if let Some(tasks) = cache.get(&key, now) {
        metrics.record_cache_hit();
        return Ok(tasks);
    }
    metrics.record_cache_miss();

    let tasks = match tokio::time::timeout(timeout, source.generate(request)).await {
        Ok(Ok(tasks)) if !tasks.is_empty() => tasks,
        Ok(Ok(_)) => {
            return Err(PlanError::upstream(format!("{} returned no tasks", source.name())));
        }
        Ok(Err(e)) => {
            return Err(PlanError::upstream(format!("{}: {:#}", source.name(), e)));
        }
        Err(_) => {
            return Err(PlanError::upstream(format!(
                "{} timed out after {}ms",
                source.name(),
                timeout.as_millis()
            ))
            .with_source("tokio::time"));
        }
    };

    cache.put(key, tasks.clone(), now);
    Ok(tasks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use crate::error::ErrorKind;

    struct Counting(AtomicUsize);

    impl ContentSource for Counting {
        fn name(&self) -> &str {
            "counting"
        }

        fn generate<'a>(&'a self, request: &'a ContentRequest) -> ContentFuture<'a> {
            self.0.fetch_add(1, Ordering::SeqCst);
            let task = format!("practice {}", request.topic);
            Box::pin(async move { Ok(vec![task]) })
        }
    }

    struct Hanging;

    impl ContentSource for Hanging {
        fn name(&self) -> &str {
            "hanging"
        }

        fn generate<'a>(&'a self, _request: &'a ContentRequest) -> ContentFuture<'a> {
            Box::pin(async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(Vec::<String>::new())
            })
        }
    }

    fn request() -> ContentRequest {
        ContentRequest {
            user_id: "u1".to_string(),
            topic: "tries".to_string(),
            subtopics: vec![],
            difficulty: Difficulty::Medium,
        }
    }

    #[tokio::test]
    async fn second_call_is_served_from_cache() {
        let source = Counting(AtomicUsize::new(0));
        let cache = ContentCache::new(8, chrono::Duration::hours(24));
        let metrics = Metrics::new();
        let now = Utc::now();

        for _ in 0..2 {
            let tasks = fetch_tasks(&source, &cache, &metrics, &request(), Duration::from_secs(1), now)
                .await
                .unwrap();
            assert_eq!(tasks, vec!["practice tries".to_string()]);
        }
        assert_eq!(source.0.load(Ordering::SeqCst), 1);
        assert_eq!(metrics.snapshot().content_cache_hits, 1);
    }

    #[tokio::test]
    async fn hanging_source_times_out() {
        let cache = ContentCache::new(8, chrono::Duration::hours(24));
        let err = fetch_tasks(&Hanging, &cache, &Metrics::new(), &request(), Duration::from_millis(20), Utc::now())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::UpstreamContent);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn disabled_source_fails_cleanly() {
        let cache = ContentCache::new(8, chrono::Duration::hours(24));
        let err = fetch_tasks(&NoContent, &cache, &Metrics::new(), &request(), Duration::from_secs(1), Utc::now())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::UpstreamContent);
    }
}
