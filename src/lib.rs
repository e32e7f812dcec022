pub mod config;
pub mod content;
pub mod curriculum;
pub mod difficulty;
pub mod energy;
pub mod engine;
pub mod error;
pub mod logging;
pub mod mastery;
pub mod metrics;
pub mod pipeline;
pub mod plan;
pub mod review;
pub mod sessions;
pub mod state;
pub mod store;

pub use engine::StudyEngine;
pub use error::{ErrorKind, PlanError};

#[cfg(test)]
#[path = "../tests"]
mod tests {
    // Re-export test modules
    #[path = "error_handling_test.rs"]
    mod error_handling_test;
    #[path = "json_extraction_test.rs"]
    mod json_extraction_test;
}
