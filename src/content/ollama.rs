use std::time::{Duration, Instant};
use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use crate::config::ContentConfig;
use crate::content::breaker::{CircuitBreaker, ExponentialBackoff};
use crate::content::{parse, ContentFuture, ContentRequest, ContentSource};
use crate::error::PlanError;

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateChunk {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
}

/// Task generator backed by a local Ollama server.
pub struct OllamaContentSource {
    client: Client,
    config: ContentConfig,
    breaker: CircuitBreaker,
    backoff: ExponentialBackoff,
}

impl OllamaContentSource {
    pub fn new(config: ContentConfig) -> Result<Self, PlanError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .tcp_keepalive(Duration::from_secs(30))
            .pool_max_idle_per_host(4)
            .build()
            .map_err(|e| {
                PlanError::upstream(format!("Failed to create HTTP client: {}", e)).with_source("reqwest")
            })?;

        Ok(OllamaContentSource {
            client,
            breaker: CircuitBreaker::new(
                Duration::from_secs(config.breaker_cooldown_secs),
                config.breaker_threshold,
            ),
            backoff: ExponentialBackoff::default(),
            config,
        })
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    fn prompt(request: &ContentRequest) -> String {
        let mut prompt = format!(
            "You are a study coach. Write 3 to 5 short, concrete study tasks about \"{}\" at {} difficulty.",
            request.topic,
            request.difficulty.as_str()
        );
        if !request.subtopics.is_empty() {
            prompt.push_str(&format!(" Cover these subtopics: {}.", request.subtopics.join(", ")));
        }
        prompt.push_str(" Answer with a JSON array of strings only.");
        prompt
    }

    async fn call_once(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.config.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .json(&GenerateRequest {
                model: &self.config.model,
                prompt: prompt.to_string(),
                stream: true,
            })
            .send()
            .await
            .with_context(|| format!("Failed to connect to Ollama at {}", url))?
            .error_for_status()
            .with_context(|| format!("Ollama rejected request for model '{}'", self.config.model))?;

        let body = response
            .text()
            .await
            .with_context(|| format!("Failed to read response from model '{}'", self.config.model))?;

        // streamed responses arrive as one JSON object per line
        let mut text = String::new();
        for line in body.lines().filter(|l| !l.trim().is_empty()) {
            if let Ok(chunk) = serde_json::from_str::<GenerateChunk>(line) {
                text.push_str(&chunk.response);
                if chunk.done {
                    break;
                }
            }
        }

        if text.trim().is_empty() {
            anyhow::bail!("Model '{}' returned an empty response", self.config.model);
        }
        Ok(text)
    }

    async fn generate_with_retry(&self, request: &ContentRequest) -> Result<Vec<String>> {
        if self.breaker.is_open() {
            anyhow::bail!("circuit open after {} failures", self.breaker.failure_count());
        }

        let prompt = Self::prompt(request);
        let start = Instant::now();
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let delay = self.backoff.delay_for_attempt(attempt - 1);
                tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, "Retrying content call");
                tokio::time::sleep(delay).await;
            }

            match self.call_once(&prompt).await.and_then(|raw| parse::extract_tasks(&raw)) {
                Ok(tasks) => {
                    self.breaker.record_success();
                    tracing::info!(
                        model = %self.config.model,
                        topic = %request.topic,
                        tasks = tasks.len(),
                        latency_ms = start.elapsed().as_millis() as u64,
                        "Content generated"
                    );
                    return Ok(tasks);
                }
                Err(e) => {
                    self.breaker.record_failure();
                    tracing::warn!(
                        model = %self.config.model,
                        attempt,
                        error = %e,
                        "Content call failed"
                    );
                    last_error = Some(e);
                    if self.breaker.is_open() {
                        break;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow::anyhow!("no attempts made")))
    }
}

impl ContentSource for OllamaContentSource {
    fn name(&self) -> &str {
        "ollama"
    }

    fn generate<'a>(&'a self, request: &'a ContentRequest) -> ContentFuture<'a> {
        Box::pin(self.generate_with_retry(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::difficulty::Difficulty;

    #[test]
    fn prompt_names_topic_and_subtopics() {
        let prompt = OllamaContentSource::prompt(&ContentRequest {
            user_id: "u".to_string(),
            topic: "hash maps".to_string(),
            subtopics: vec!["collisions".to_string(), "load factor".to_string()],
            difficulty: Difficulty::Hard,
        });
        assert!(prompt.contains("\"hash maps\""));
        assert!(prompt.contains("hard difficulty"));
        assert!(prompt.contains("collisions, load factor"));
    }

    #[tokio::test]
    async fn unreachable_server_fails_and_trips_breaker() {
        let config = ContentConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: 1,
            max_retries: 0,
            breaker_threshold: 1,
            ..ContentConfig::default()
        };
        let source = OllamaContentSource::new(config).unwrap();
        let request = ContentRequest {
            user_id: "u".to_string(),
            topic: "queues".to_string(),
            subtopics: vec![],
            difficulty: Difficulty::Easy,
        };
        assert!(source.generate(&request).await.is_err());
        assert!(source.breaker().is_open());
    }
}
