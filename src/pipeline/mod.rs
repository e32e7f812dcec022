pub mod context;
pub mod hub;
pub mod job;
pub mod stages;
pub mod timing;

use std::time::Duration;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::config::RulesConfig;
use crate::content::{ContentCache, ContentSource};
use crate::curriculum::ConceptGraph;
use crate::error::PlanError;
use crate::metrics::Metrics;
use crate::plan::PlanInput;
use crate::store::Datastore;

pub use context::PlanContext;
pub use hub::{JobHub, JobRunner, JobSubscription};
pub use job::{JobEvent, JobRecord, JobStatus, JobUpdate, StageStatus};
use timing::StageTimer;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Stage {
    Analyzer,
    Tutor,
    Planner,
    TaskGenerator,
}

impl Stage {
    pub const ALL: [Stage; 4] = [Stage::Analyzer, Stage::Tutor, Stage::Planner, Stage::TaskGenerator];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Analyzer => "analyzer",
            Stage::Tutor => "tutor",
            Stage::Planner => "planner",
            Stage::TaskGenerator => "taskGenerator",
        }
    }
}

/// Read-side collaborators every stage may use.
#[derive(Clone, Copy)]
pub struct StageDeps<'a> {
    pub store: &'a dyn Datastore,
    pub graph: &'a ConceptGraph,
    pub rules: &'a RulesConfig,
}

/// Collaborators for content enrichment.
pub struct ContentDeps<'a> {
    pub source: &'a dyn ContentSource,
    pub cache: &'a ContentCache,
    pub metrics: &'a Metrics,
    pub timeout: Duration,
    pub now: DateTime<Utc>,
}

/// A stage failed; logs are everything produced up to and including the
/// failure.
#[derive(Debug, Clone)]
pub struct StageFailure {
    pub stage: Stage,
    pub error: PlanError,
    pub logs: Vec<String>,
}

/// Progress callback. An error aborts the run as a failure of that stage.
pub type StageObserver<'o> = dyn FnMut(Stage, StageStatus, &[String]) -> Result<(), PlanError> + Send + 'o;

fn run_sync_stage(stage: Stage, ctx: &PlanContext, deps: &StageDeps<'_>) -> Result<PlanContext, PlanError> {
    match stage {
        Stage::Analyzer => stages::analyze(ctx, deps),
        Stage::Tutor => stages::tutor(ctx),
        Stage::Planner => stages::plan(ctx),
        // without a content source the planner's curated tasks stand
        Stage::TaskGenerator => Ok(ctx.clone()),
    }
}

fn failure(stage: Stage, error: PlanError, ctx: &PlanContext) -> StageFailure {
    let error = error.with_stage(stage.as_str());
    let mut logs = ctx.logs.clone();
    logs.push(format!("{}: failed: {}", stage.as_str(), error));
    tracing::error!(stage = stage.as_str(), kind = error.kind.as_str(), error = %error, "Pipeline stage failed");
    StageFailure { stage, error, logs }
}

/// Run `stages` in order without progress reporting or content enrichment.
pub fn run_sync(stages: &[Stage], input: PlanInput, deps: &StageDeps<'_>) -> Result<PlanContext, StageFailure> {
    let mut ctx = PlanContext::new(input);
    for &stage in stages {
        let _timer = StageTimer::new(stage, None);
        ctx = run_sync_stage(stage, &ctx, deps).map_err(|e| failure(stage, e, &ctx))?;
    }
    Ok(ctx)
}

/// Run `stages` in order, reporting each transition to `observer`.
///
/// The first failing stage (or observer call) aborts the remaining stages.
pub async fn run_pipeline(
    stages: &[Stage],
    input: PlanInput,
    deps: StageDeps<'_>,
    content: Option<&ContentDeps<'_>>,
    job_id: &str,
    observer: &mut StageObserver<'_>,
) -> Result<PlanContext, StageFailure> {
    let mut ctx = PlanContext::new(input);

    for &stage in stages {
        observer(stage, StageStatus::Running, &ctx.logs).map_err(|e| failure(stage, e, &ctx))?;

        let timer = StageTimer::new(stage, Some(job_id));
        let next = match (stage, content) {
            (Stage::TaskGenerator, Some(content)) => stages::generate_tasks(&ctx, content).await,
            _ => run_sync_stage(stage, &ctx, &deps),
        };
        drop(timer);

        ctx = next.map_err(|e| failure(stage, e, &ctx))?;
        observer(stage, StageStatus::Completed, &ctx.logs).map_err(|e| failure(stage, e, &ctx))?;
    }

    Ok(ctx)
}
