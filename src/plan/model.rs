use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use crate::difficulty::Difficulty;
use crate::energy::{DayType, SystemMode};
use crate::plan::blocks::StudyBlock;

/// Audit trail explaining how the plan was reached.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlanReasoning {
    pub system_mode: Option<SystemMode>,
    pub mode_message: String,
    pub constraints: Vec<String>,
    pub day_type_reason: String,
    pub difficulty_reason: String,
    pub focus_reason: String,
    pub allocation_notes: Vec<String>,
}

/// One day inside a multi-day plan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DayPlan {
    pub day_index: u32,
    pub date: NaiveDate,
    pub energy: u8,
    pub day_type: DayType,
    pub intensity_level: u8,
    pub difficulty: Difficulty,
    pub time_budget_minutes: u32,
    pub blocks: Vec<StudyBlock>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StudyPlan {
    pub user_id: String,
    pub topic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concept_id: Option<String>,
    pub phase: u8,
    pub energy: u8,
    pub date: NaiveDate,
    pub time_budget_minutes: u32,
    pub day_type: DayType,
    pub intensity_level: u8,
    pub system_mode: SystemMode,
    pub difficulty: Difficulty,
    pub blocks: Vec<StudyBlock>,
    pub reasoning: PlanReasoning,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multi_day: Option<Vec<DayPlan>>,
}

impl StudyPlan {
    pub fn total_minutes(&self) -> u32 {
        self.blocks.iter().map(|b| b.duration_minutes).sum()
    }

    /// Copy the top-level blocks into day 0 of a multi-day plan.
    pub fn sync_first_day(&mut self) {
        if let Some(first) = self.multi_day.as_mut().and_then(|days| days.first_mut()) {
            first.blocks = self.blocks.clone();
        }
    }
}
