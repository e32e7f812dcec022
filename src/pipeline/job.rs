use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::error::PlanError;
use crate::pipeline::Stage;
use crate::plan::{PlanInput, StudyPlan};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    Running,
    Completed,
    Failed,
}

/// One progress event. `seq` is strictly increasing within a job.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct JobEvent {
    pub seq: u64,
    pub stage: Stage,
    pub status: StageStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum JobStatus {
    Queued,
    Running { stage: Stage },
    Completed,
    Failed,
}

/// What subscribers receive.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum JobUpdate {
    Progress(JobEvent),
    Completed { plan: Box<StudyPlan> },
    Failed { error: PlanError },
}

impl JobUpdate {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobUpdate::Progress(_))
    }
}

/// Persisted state of one background plan job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    pub id: String,
    pub user_id: String,
    pub status: JobStatus,
    pub payload: PlanInput,
    pub progress: Vec<JobEvent>,
    pub logs: Vec<String>,
    pub result: Option<StudyPlan>,
    pub error: Option<PlanError>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobRecord {
    pub fn queued(payload: PlanInput, now: DateTime<Utc>) -> Self {
        JobRecord {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: payload.user_id.clone(),
            status: JobStatus::Queued,
            payload,
            progress: Vec::new(),
            logs: Vec::new(),
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.status, JobStatus::Completed | JobStatus::Failed)
    }

    /// Append a progress event and move the status along with it.
    pub fn push_event(&mut self, stage: Stage, status: StageStatus, now: DateTime<Utc>) -> JobEvent {
        let event = JobEvent {
            seq: self.progress.last().map_or(1, |e| e.seq + 1),
            stage,
            status,
        };
        self.progress.push(event);
        if status == StageStatus::Running {
            self.status = JobStatus::Running { stage };
        }
        self.updated_at = now;
        event
    }

    pub fn complete(&mut self, plan: StudyPlan, now: DateTime<Utc>) {
        self.status = JobStatus::Completed;
        self.result = Some(plan);
        self.updated_at = now;
    }

    pub fn fail(&mut self, error: PlanError, now: DateTime<Utc>) {
        self.status = JobStatus::Failed;
        self.result = None;
        self.error = Some(error);
        self.updated_at = now;
    }

    /// Terminal update for a finished job, `None` while it is still running.
    pub fn final_update(&self) -> Option<JobUpdate> {
        match (&self.status, &self.result, &self.error) {
            (JobStatus::Completed, Some(plan), _) => Some(JobUpdate::Completed {
                plan: Box::new(plan.clone()),
            }),
            (JobStatus::Failed, _, Some(error)) => Some(JobUpdate::Failed { error: error.clone() }),
            (JobStatus::Completed, None, _) | (JobStatus::Failed, _, None) => Some(JobUpdate::Failed {
                error: PlanError::stage_failed("job finished without a result", "job"),
            }),
            _ => None,
        }
    }
}
