pub mod engine;
pub mod paths;

pub use engine::{get_engine_config, ContentConfig, EngineConfig, JobConfig, RulesConfig};
