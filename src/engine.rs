use std::sync::Arc;
use chrono::{DateTime, NaiveDate, Utc};
use crate::config::EngineConfig;
use crate::content::{ContentSource, NoContent};
use crate::curriculum::ConceptGraph;
use crate::energy::EnergyLogEntry;
use crate::error::PlanError;
use crate::metrics::MetricsSnapshot;
use crate::pipeline::{run_sync, JobRecord, JobRunner, JobStatus, JobSubscription, StageDeps};
use crate::plan::{builder_for, render_checklist, PlanInput, StudyPlan};
use crate::review::{self, ReviewItem};
use crate::sessions::{self, SessionOutcome, SessionResult};
use crate::state::EngineState;
use crate::store::Datastore;

/// Entry point for hosts: plans, jobs, sessions, reviews and energy logging
/// over one injected store.
pub struct StudyEngine<S: Datastore + 'static> {
    store: Arc<S>,
    graph: Arc<ConceptGraph>,
    config: Arc<EngineConfig>,
    content: Arc<dyn ContentSource>,
    state: EngineState,
}

impl<S: Datastore + 'static> Clone for StudyEngine<S> {
    fn clone(&self) -> Self {
        StudyEngine {
            store: self.store.clone(),
            graph: self.graph.clone(),
            config: self.config.clone(),
            content: self.content.clone(),
            state: self.state.clone(),
        }
    }
}

impl<S: Datastore + 'static> StudyEngine<S> {
    /// Engine without an external content source; jobs fall back to curated
    /// tasks.
    pub fn new(store: Arc<S>, graph: ConceptGraph, config: EngineConfig) -> Self {
        Self::with_content(store, graph, config, Arc::new(NoContent))
    }

    pub fn with_content(
        store: Arc<S>,
        graph: ConceptGraph,
        config: EngineConfig,
        content: Arc<dyn ContentSource>,
    ) -> Self {
        let state = EngineState::new(&config);
        tracing::info!(
            concepts = graph.len(),
            content_source = content.name(),
            "Study engine ready"
        );
        StudyEngine {
            store,
            graph: Arc::new(graph),
            config: Arc::new(config),
            content,
            state,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.state.metrics.snapshot()
    }

    fn runner(&self) -> JobRunner {
        JobRunner {
            store: self.store.clone(),
            graph: self.graph.clone(),
            config: self.config.clone(),
            content: self.content.clone(),
            state: self.state.clone(),
        }
    }

    /// Build a plan in-process with curated tasks only.
    ///
    /// Deterministic: the same input over the same stored state yields the
    /// same plan.
    pub fn build_plan(&self, input: PlanInput) -> Result<StudyPlan, PlanError> {
        let input = input.validate()?;
        let builder = builder_for(input.strategy);
        let deps = StageDeps {
            store: self.store.as_ref(),
            graph: self.graph.as_ref(),
            rules: &self.config.rules,
        };

        let ctx = run_sync(builder.stages(), input, &deps).map_err(|failure| {
            tracing::warn!(stage = failure.stage.as_str(), logs = failure.logs.len(), "Plan build failed");
            failure.error
        })?;
        let plan = ctx.into_plan()?;

        self.state.metrics.record_plan_built();
        tracing::info!(
            user_id = %plan.user_id,
            topic = %plan.topic,
            day_type = plan.day_type.as_str(),
            minutes = plan.total_minutes(),
            "Plan built"
        );
        Ok(plan)
    }

    /// Queue a background plan job and return its id.
    /// Must be called from within a tokio runtime.
    pub fn start_plan_job(&self, input: PlanInput) -> Result<String, PlanError> {
        self.runner().start(input)
    }

    pub fn subscribe_to_job(&self, job_id: &str) -> Result<JobSubscription, PlanError> {
        JobSubscription::open(
            &self.state.hub,
            self.store.clone(),
            self.config.jobs.clone(),
            job_id,
        )
    }

    /// Wait for a job's plan, following pushed progress and polling when push
    /// is unavailable.
    pub async fn await_job(&self, job_id: &str) -> Result<StudyPlan, PlanError> {
        self.subscribe_to_job(job_id)?.wait().await
    }

    pub fn job_status(&self, job_id: &str) -> Result<JobStatus, PlanError> {
        Ok(self.job_record(job_id)?.status)
    }

    pub fn job_record(&self, job_id: &str) -> Result<JobRecord, PlanError> {
        self.store
            .load_job(job_id)?
            .ok_or_else(|| PlanError::not_found(format!("job '{}' not found", job_id)))
    }

    pub fn record_session_outcome(&self, result: SessionResult) -> Result<SessionOutcome, PlanError> {
        let outcome = sessions::record_session_outcome(self.store.as_ref(), result, Utc::now())?;
        self.state.metrics.record_session();
        Ok(outcome)
    }

    pub fn complete_review(&self, review_id: &str, quality: u8) -> Result<ReviewItem, PlanError> {
        let item = review::complete_review(self.store.as_ref(), review_id, quality, Utc::now())?;
        self.state.metrics.record_review();
        Ok(item)
    }

    pub fn due_reviews(&self, user_id: &str, now: DateTime<Utc>) -> Result<Vec<ReviewItem>, PlanError> {
        self.store.reviews_due(user_id, now)
    }

    pub fn log_energy(&self, user_id: &str, date: NaiveDate, score: u8) -> Result<EnergyLogEntry, PlanError> {
        let entry = EnergyLogEntry::new(date, score)?;
        self.store.append_energy(user_id, entry.clone())?;
        tracing::info!(user_id = user_id, date = %date, score = score, "Energy logged");
        Ok(entry)
    }

    pub fn render_checklist(&self, plan: &StudyPlan) -> String {
        render_checklist(plan)
    }
}
