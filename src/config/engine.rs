use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use lazy_static::lazy_static;
use crate::config::paths::{app_data_dir, config_path};
use crate::error::PlanError;

/// Thresholds for the energy-trend rules.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RulesConfig {
    /// Consecutive high-energy days that force a recovery day
    pub max_beast_days: usize,
    /// Every Nth ISO week is a soft week; 0 disables
    pub soft_week_interval: u32,
}

impl Default for RulesConfig {
    fn default() -> Self {
        RulesConfig {
            max_beast_days: 3,
            soft_week_interval: 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ContentConfig {
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
    pub cache_ttl_hours: i64,
    pub cache_capacity: usize,
    pub max_retries: u32,
    pub breaker_threshold: u32,
    pub breaker_cooldown_secs: u64,
}

impl Default for ContentConfig {
    fn default() -> Self {
        ContentConfig {
            base_url: "http://localhost:11434".to_string(),
            model: "qwen2.5:7b-instruct".to_string(),
            timeout_secs: 20,
            cache_ttl_hours: 24,
            cache_capacity: 200,
            max_retries: 2,
            breaker_threshold: 3,
            breaker_cooldown_secs: 60,
        }
    }
}

impl ContentConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct JobConfig {
    pub poll_interval_ms: u64,
    pub max_poll_attempts: u32,
    pub event_capacity: usize,
}

impl Default for JobConfig {
    fn default() -> Self {
        JobConfig {
            poll_interval_ms: 500,
            max_poll_attempts: 120,
            event_capacity: 32,
        }
    }
}

impl JobConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct EngineConfig {
    pub rules: RulesConfig,
    pub content: ContentConfig,
    pub jobs: JobConfig,
    /// Overrides the platform data directory for the file store
    pub data_dir: Option<PathBuf>,
}

impl EngineConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, PlanError> {
        Ok(toml::from_str::<EngineConfig>(content)?)
    }

    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(app_data_dir)
    }
}

fn load_engine_config_internal() -> EngineConfig {
    let path = config_path();

    match std::fs::read_to_string(&path) {
        Ok(content) => match EngineConfig::from_toml_str(&content) {
            Ok(config) => {
                tracing::info!(path = ?path, "Loaded engine config");
                config
            }
            Err(e) => {
                tracing::warn!(path = ?path, error = %e, "Failed to parse engine config, using defaults");
                EngineConfig::default()
            }
        },
        Err(_) => {
            tracing::info!(path = ?path, "No engine config found, using defaults");
            EngineConfig::default()
        }
    }
}

lazy_static! {
    static ref ENGINE_CONFIG: EngineConfig = load_engine_config_internal();
}

/// Get the cached engine configuration (loaded once on first use)
pub fn get_engine_config() -> &'static EngineConfig {
    &ENGINE_CONFIG
}
