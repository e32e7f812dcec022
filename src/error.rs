use serde::{Serialize, Deserialize};
use std::fmt;

/// Error categories callers branch on (retry vs. surface to the learner).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Input outside documented bounds, rejected before any stage runs
    Validation,
    /// Content-generation source unavailable or timed out
    UpstreamContent,
    /// Datastore read/write failure
    Persistence,
    /// A pipeline stage failed
    PipelineStage,
    /// Unknown job or review item
    NotFound,
    /// A bounded wait ran out
    Timeout,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::UpstreamContent => "upstream_content",
            ErrorKind::Persistence => "persistence",
            ErrorKind::PipelineStage => "pipeline_stage",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Timeout => "timeout",
        }
    }

    /// Whether the same request may succeed if simply retried later.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorKind::UpstreamContent | ErrorKind::Persistence | ErrorKind::Timeout
        )
    }
}

/// Field-level input validation failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("phase {0} is outside [1, 6]")]
    Phase(u8),
    #[error("energy {0} is outside [1, 5]")]
    Energy(u8),
    #[error("time budget {0} minutes is outside [15, 480]")]
    TimeBudget(u32),
    #[error("numDays {0} is outside [1, 14]")]
    NumDays(u32),
    #[error("understanding score {0} is outside [1, 5]")]
    Understanding(u8),
    #[error("completion rate {0} is outside [0, 100]")]
    Completion(u8),
    #[error("review quality {0} is outside [0, 5]")]
    Quality(u8),
    #[error("{0} must not be empty")]
    Empty(&'static str),
    #[error("energy already logged for {0}")]
    DuplicateEnergyEntry(chrono::NaiveDate),
}

/// Unified error type for the engine.
/// Every fallible operation returns Result<T, PlanError>.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanError {
    pub kind: ErrorKind,
    pub message: String,
    pub stage: String,
    pub context: Option<String>,
    pub source: Option<String>,
}

impl PlanError {
    /// Create a new error of the given kind at a stage
    pub fn new<S: Into<String>>(kind: ErrorKind, message: S, stage: &'static str) -> Self {
        PlanError {
            kind,
            message: message.into(),
            stage: stage.to_string(),
            context: None,
            source: None,
        }
    }

    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::new(ErrorKind::Validation, message, "validation")
    }

    pub fn persistence<S: Into<String>>(message: S) -> Self {
        Self::new(ErrorKind::Persistence, message, "store")
    }

    pub fn upstream<S: Into<String>>(message: S) -> Self {
        Self::new(ErrorKind::UpstreamContent, message, "content")
    }

    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::new(ErrorKind::NotFound, message, "lookup")
    }

    pub fn stage_failed<S: Into<String>>(message: S, stage: &'static str) -> Self {
        Self::new(ErrorKind::PipelineStage, message, stage)
    }

    /// Re-attribute the error to a different stage
    pub fn with_stage<S: Into<String>>(mut self, stage: S) -> Self {
        self.stage = stage.into();
        self
    }

    /// Add additional context information
    pub fn with_context<S: Into<String>>(mut self, context: S) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Add source error information
    pub fn with_source<S: Into<String>>(mut self, source: S) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

impl fmt::Display for PlanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.stage, self.message)?;
        if let Some(ref context) = self.context {
            write!(f, " (context: {})", context)?;
        }
        if let Some(ref source) = self.source {
            write!(f, " (source: {})", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for PlanError {}

impl From<ValidationError> for PlanError {
    fn from(err: ValidationError) -> Self {
        PlanError::validation(err.to_string())
    }
}

impl From<anyhow::Error> for PlanError {
    fn from(err: anyhow::Error) -> Self {
        PlanError::new(ErrorKind::PipelineStage, format!("{:#}", err), "unknown")
            .with_source("anyhow")
    }
}

impl From<std::io::Error> for PlanError {
    fn from(err: std::io::Error) -> Self {
        PlanError::new(ErrorKind::Persistence, format!("I/O error: {}", err), "io")
            .with_source("std::io")
    }
}

impl From<serde_json::Error> for PlanError {
    fn from(err: serde_json::Error) -> Self {
        PlanError::new(ErrorKind::Persistence, format!("JSON error: {}", err), "json_parse")
            .with_source("serde_json")
    }
}

impl From<toml::de::Error> for PlanError {
    fn from(err: toml::de::Error) -> Self {
        PlanError::new(ErrorKind::Validation, format!("TOML error: {}", err), "toml_parse")
            .with_source("toml")
    }
}

impl From<tokio::time::error::Elapsed> for PlanError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        PlanError::new(ErrorKind::Timeout, "Operation timed out", "timeout")
            .with_source("tokio::time")
    }
}
