use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use chrono::Utc;
use parking_lot::RwLock;
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use crate::config::{EngineConfig, JobConfig};
use crate::content::ContentSource;
use crate::curriculum::ConceptGraph;
use crate::error::{ErrorKind, PlanError};
use crate::pipeline::job::{JobRecord, JobUpdate, StageStatus};
use crate::pipeline::{run_pipeline, ContentDeps, Stage, StageDeps, StageFailure};
use crate::plan::{builder_for, PlanInput, StudyPlan};
use crate::state::EngineState;
use crate::store::Datastore;

/// Per-job push channels. A channel exists from job start until the job
/// reaches a terminal state.
#[derive(Clone)]
pub struct JobHub {
    channels: Arc<RwLock<HashMap<String, broadcast::Sender<JobUpdate>>>>,
    capacity: usize,
}

impl JobHub {
    pub fn new(capacity: usize) -> Self {
        JobHub {
            channels: Arc::new(RwLock::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }

    pub fn open(&self, job_id: &str) {
        let (sender, _) = broadcast::channel(self.capacity);
        self.channels.write().insert(job_id.to_string(), sender);
    }

    /// Send to current subscribers. Having none is not an error.
    pub fn publish(&self, job_id: &str, update: JobUpdate) {
        if let Some(sender) = self.channels.read().get(job_id) {
            let _ = sender.send(update);
        }
    }

    /// Drop the channel; live subscribers see the stream end.
    pub fn close(&self, job_id: &str) {
        self.channels.write().remove(job_id);
    }

    pub fn subscribe(&self, job_id: &str) -> Option<broadcast::Receiver<JobUpdate>> {
        self.channels.read().get(job_id).map(|s| s.subscribe())
    }

    pub fn active_jobs(&self) -> usize {
        self.channels.read().len()
    }
}

/// Ordered view of one job's progress.
///
/// Replays what the job record already holds, then follows the push
/// channel. If the channel lags or is gone it polls the job record at a
/// fixed interval for a bounded number of attempts.
pub struct JobSubscription {
    job_id: String,
    store: Arc<dyn Datastore>,
    config: JobConfig,
    live: Option<BroadcastStream<JobUpdate>>,
    pending: VecDeque<JobUpdate>,
    last_seq: u64,
    idle_polls: u32,
    done: bool,
}

impl JobSubscription {
    pub fn open(hub: &JobHub, store: Arc<dyn Datastore>, config: JobConfig, job_id: &str) -> Result<Self, PlanError> {
        // subscribe before reading the record so nothing falls in between
        let receiver = hub.subscribe(job_id);
        let record = store
            .load_job(job_id)?
            .ok_or_else(|| PlanError::not_found(format!("job '{}' not found", job_id)))?;

        let mut subscription = JobSubscription {
            job_id: job_id.to_string(),
            store,
            config,
            live: receiver.map(BroadcastStream::new),
            pending: VecDeque::new(),
            last_seq: 0,
            idle_polls: 0,
            done: false,
        };
        subscription.absorb(&record);
        Ok(subscription)
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Whether updates currently arrive by push.
    pub fn is_live(&self) -> bool {
        self.live.is_some()
    }

    /// Queue record events newer than what was already delivered, plus the
    /// terminal update if the job is finished. Returns whether anything new
    /// was queued.
    fn absorb(&mut self, record: &JobRecord) -> bool {
        let mut fresh = false;
        let seen = self.last_seq;
        for event in record.progress.iter().filter(|e| e.seq > seen) {
            self.pending.push_back(JobUpdate::Progress(*event));
            self.last_seq = event.seq;
            fresh = true;
        }
        if let Some(update) = record.final_update() {
            self.pending.push_back(update);
            self.live = None;
            fresh = true;
        }
        fresh
    }

    async fn poll(&mut self) -> Result<(), PlanError> {
        while self.idle_polls < self.config.max_poll_attempts {
            self.idle_polls += 1;
            let record = self
                .store
                .load_job(&self.job_id)?
                .ok_or_else(|| PlanError::not_found(format!("job '{}' disappeared", self.job_id)))?;
            if self.absorb(&record) {
                self.idle_polls = 0;
                return Ok(());
            }
            tokio::time::sleep(self.config.poll_interval()).await;
        }

        Err(PlanError::new(
            ErrorKind::Timeout,
            format!(
                "job '{}' made no progress in {} polls",
                self.job_id, self.config.max_poll_attempts
            ),
            "subscription",
        ))
    }

    /// Next update, or `None` once the terminal update has been delivered.
    pub async fn next(&mut self) -> Result<Option<JobUpdate>, PlanError> {
        loop {
            if let Some(update) = self.pending.pop_front() {
                if update.is_terminal() {
                    self.done = true;
                    self.pending.clear();
                }
                return Ok(Some(update));
            }
            if self.done {
                return Ok(None);
            }

            let Some(stream) = self.live.as_mut() else {
                self.poll().await?;
                continue;
            };

            match stream.next().await {
                Some(Ok(JobUpdate::Progress(event))) => {
                    if event.seq > self.last_seq {
                        self.last_seq = event.seq;
                        self.pending.push_back(JobUpdate::Progress(event));
                    }
                }
                Some(Ok(update)) => self.pending.push_back(update),
                Some(Err(BroadcastStreamRecvError::Lagged(missed))) => {
                    tracing::warn!(job_id = %self.job_id, missed, "Subscriber lagged, switching to polling");
                    self.live = None;
                }
                None => {
                    tracing::debug!(job_id = %self.job_id, "Push channel closed, switching to polling");
                    self.live = None;
                }
            }
        }
    }

    /// Drain until the job finishes.
    pub async fn wait(mut self) -> Result<StudyPlan, PlanError> {
        while let Some(update) = self.next().await? {
            match update {
                JobUpdate::Completed { plan } => return Ok(*plan),
                JobUpdate::Failed { error } => return Err(error),
                JobUpdate::Progress(_) => {}
            }
        }
        Err(PlanError::stage_failed(
            format!("job '{}' ended without a result", self.job_id),
            "subscription",
        ))
    }
}

/// Everything a detached job needs, cloneable into the spawned task.
#[derive(Clone)]
pub struct JobRunner {
    pub store: Arc<dyn Datastore>,
    pub graph: Arc<ConceptGraph>,
    pub config: Arc<EngineConfig>,
    pub content: Arc<dyn ContentSource>,
    pub state: EngineState,
}

impl JobRunner {
    /// Validate, persist a queued record and spawn the job. Returns the job
    /// id immediately; the job runs to completion whether or not anyone
    /// subscribes.
    pub fn start(&self, input: PlanInput) -> Result<String, PlanError> {
        let input = input.validate()?;
        let handle = tokio::runtime::Handle::try_current().map_err(|e| {
            PlanError::stage_failed(format!("no async runtime to run the job: {}", e), "job")
        })?;

        let record = JobRecord::queued(input, Utc::now());
        let job_id = record.id.clone();
        self.store.save_job(&record)?;
        self.state.hub.open(&job_id);
        self.state.metrics.record_job_started();
        tracing::info!(job_id = %job_id, user_id = %record.user_id, strategy = ?record.payload.strategy, "Plan job queued");

        let runner = self.clone();
        handle.spawn(async move { runner.run(record).await });
        Ok(job_id)
    }

    async fn run(self, mut record: JobRecord) {
        let job_id = record.id.clone();
        let builder = builder_for(record.payload.strategy);
        let deps = StageDeps {
            store: self.store.as_ref(),
            graph: self.graph.as_ref(),
            rules: &self.config.rules,
        };
        let content = ContentDeps {
            source: self.content.as_ref(),
            cache: &self.state.content_cache,
            metrics: &self.state.metrics,
            timeout: self.config.content.timeout(),
            now: Utc::now(),
        };

        let payload = record.payload.clone();
        let store = self.store.clone();
        let hub = self.state.hub.clone();
        let metrics = self.state.metrics.clone();
        let record_ref = &mut record;
        let mut observer = |stage: Stage, status: StageStatus, logs: &[String]| -> Result<(), PlanError> {
            let event = record_ref.push_event(stage, status, Utc::now());
            record_ref.logs = logs.to_vec();
            store.save_job(record_ref)?;
            metrics.record_stage_transition();
            tracing::info!(job_id = %record_ref.id, seq = event.seq, stage = stage.as_str(), status = ?status, "Job progress");
            hub.publish(&record_ref.id, JobUpdate::Progress(event));
            Ok(())
        };

        let outcome = run_pipeline(
            builder.stages(),
            payload,
            deps,
            builder.enriches_content().then_some(&content),
            &job_id,
            &mut observer,
        )
        .await;

        let update = match outcome.and_then(|ctx| {
            ctx.into_plan().map_err(|e| StageFailure {
                stage: Stage::Planner,
                error: e,
                logs: Vec::new(),
            })
        }) {
            Ok(plan) => {
                record.complete(plan.clone(), Utc::now());
                self.state.metrics.record_job_completed();
                self.state.metrics.record_plan_built();
                tracing::info!(job_id = %job_id, "Plan job completed");
                JobUpdate::Completed { plan: Box::new(plan) }
            }
            Err(failure) => {
                let event = record.push_event(failure.stage, StageStatus::Failed, Utc::now());
                if !failure.logs.is_empty() {
                    record.logs = failure.logs;
                }
                record.fail(failure.error.clone(), Utc::now());
                self.state.metrics.record_job_failed();
                tracing::warn!(job_id = %job_id, stage = failure.stage.as_str(), error = %failure.error, "Plan job failed");
                self.state.hub.publish(&job_id, JobUpdate::Progress(event));
                JobUpdate::Failed { error: failure.error }
            }
        };

        if let Err(e) = self.store.save_job(&record) {
            tracing::error!(job_id = %job_id, error = %e, "Failed to persist final job state");
        }
        self.state.hub.publish(&job_id, update);
        self.state.hub.close(&job_id);
    }
}
