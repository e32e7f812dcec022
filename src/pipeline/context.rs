use serde::Serialize;
use crate::difficulty::DifficultyAdvice;
use crate::energy::{BeastStreak, DayType, ModeAssessment};
use crate::error::PlanError;
use crate::pipeline::Stage;
use crate::plan::blocks::{BlockType, Ratios};
use crate::plan::{PlanInput, StudyPlan};

/// Where in the curriculum today's session lands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Focus {
    pub concept_id: Option<String>,
    pub topic: String,
    pub prerequisites: Vec<String>,
    pub reason: String,
}

impl Focus {
    /// Key mastery is stored under.
    pub fn mastery_key(&self) -> &str {
        self.concept_id.as_deref().unwrap_or(&self.topic)
    }
}

/// Analyzer output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    pub focus: Focus,
    pub mastery: Option<u8>,
    pub struggling: bool,
    pub mode: ModeAssessment,
    /// Requested budget after mode caps
    pub budget_minutes: u32,
    /// Day types of recent sessions, oldest first
    pub history: Vec<DayType>,
}

/// Tutor output.
#[derive(Debug, Clone, PartialEq)]
pub struct TutorAdvice {
    pub day_type: DayType,
    pub day_type_reason: String,
    /// Streak carried into the next planned day
    pub streak: BeastStreak,
    pub difficulty: DifficultyAdvice,
    pub ratios: Ratios,
    pub block_sequence: Vec<BlockType>,
}

/// State threaded through the pipeline. Stages never mutate a context in
/// place; each returns a new one.
#[derive(Debug, Clone)]
pub struct PlanContext {
    pub input: PlanInput,
    pub analysis: Option<Analysis>,
    pub advice: Option<TutorAdvice>,
    pub plan: Option<StudyPlan>,
    pub logs: Vec<String>,
}

impl PlanContext {
    /// `input` must already be validated.
    pub fn new(input: PlanInput) -> Self {
        PlanContext {
            input,
            analysis: None,
            advice: None,
            plan: None,
            logs: Vec::new(),
        }
    }

    pub fn analysis(&self) -> Result<&Analysis, PlanError> {
        self.analysis
            .as_ref()
            .ok_or_else(|| missing(Stage::Analyzer))
    }

    pub fn advice(&self) -> Result<&TutorAdvice, PlanError> {
        self.advice.as_ref().ok_or_else(|| missing(Stage::Tutor))
    }

    pub fn plan(&self) -> Result<&StudyPlan, PlanError> {
        self.plan.as_ref().ok_or_else(|| missing(Stage::Planner))
    }

    pub fn with_analysis(&self, analysis: Analysis, log: String) -> Self {
        let mut next = self.clone();
        next.analysis = Some(analysis);
        next.logs.push(log);
        next
    }

    pub fn with_advice(&self, advice: TutorAdvice, log: String) -> Self {
        let mut next = self.clone();
        next.advice = Some(advice);
        next.logs.push(log);
        next
    }

    pub fn with_plan(&self, plan: StudyPlan, log: String) -> Self {
        let mut next = self.clone();
        next.plan = Some(plan);
        next.logs.push(log);
        next
    }

    pub fn into_plan(self) -> Result<StudyPlan, PlanError> {
        self.plan.ok_or_else(|| missing(Stage::Planner))
    }
}

fn missing(stage: Stage) -> PlanError {
    PlanError::stage_failed(format!("{} output missing from context", stage.as_str()), "pipeline")
}
