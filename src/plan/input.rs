use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use crate::energy::check_energy;
use crate::error::{PlanError, ValidationError};

pub const MIN_BUDGET_MINUTES: u32 = 15;
pub const MAX_BUDGET_MINUTES: u32 = 480;
pub const MAX_PLAN_DAYS: u32 = 14;
pub const DEFAULT_PLAN_DAYS: u32 = 7;

/// Which planner runs the request.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlanStrategy {
    /// Analyzer, tutor and planner with curated tasks only
    #[default]
    Heuristic,
    /// Full pipeline including content enrichment
    Agent,
}

/// A plan request as callers submit it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlanInput {
    pub user_id: String,
    /// Free topic, used when no curriculum concept applies
    pub topic: String,
    #[serde(default)]
    pub subtopics: Vec<String>,
    #[serde(default)]
    pub concept_id: Option<String>,
    pub phase: u8,
    pub energy: u8,
    pub time_budget_minutes: u32,
    pub date: NaiveDate,
    #[serde(default)]
    pub generate_week_plan: bool,
    #[serde(default)]
    pub num_days: Option<u32>,
    #[serde(default)]
    pub strategy: PlanStrategy,
}

impl PlanInput {
    /// Check bounds and return the normalized request.
    ///
    /// The time budget is rounded down to a multiple of 5 minutes; a week
    /// plan without `numDays` covers 7 days.
    pub fn validate(&self) -> Result<PlanInput, PlanError> {
        if self.user_id.trim().is_empty() {
            return Err(ValidationError::Empty("userId").into());
        }
        if self.topic.trim().is_empty() && self.concept_id.is_none() {
            return Err(ValidationError::Empty("topic").into());
        }
        if !(1..=6).contains(&self.phase) {
            return Err(ValidationError::Phase(self.phase).into());
        }
        check_energy(self.energy)?;
        if !(MIN_BUDGET_MINUTES..=MAX_BUDGET_MINUTES).contains(&self.time_budget_minutes) {
            return Err(ValidationError::TimeBudget(self.time_budget_minutes).into());
        }

        let num_days = if self.generate_week_plan {
            let n = self.num_days.unwrap_or(DEFAULT_PLAN_DAYS);
            if !(1..=MAX_PLAN_DAYS).contains(&n) {
                return Err(ValidationError::NumDays(n).into());
            }
            Some(n)
        } else {
            None
        };

        let mut normalized = self.clone();
        normalized.time_budget_minutes = self.time_budget_minutes - self.time_budget_minutes % 5;
        normalized.num_days = num_days;
        Ok(normalized)
    }

    /// Number of days the plan covers.
    pub fn day_count(&self) -> u32 {
        if self.generate_week_plan {
            self.num_days.unwrap_or(DEFAULT_PLAN_DAYS)
        } else {
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn input() -> PlanInput {
        PlanInput {
            user_id: "u1".to_string(),
            topic: "graphs".to_string(),
            subtopics: vec![],
            concept_id: None,
            phase: 2,
            energy: 3,
            time_budget_minutes: 60,
            date: NaiveDate::from_ymd_opt(2025, 3, 5).unwrap(),
            generate_week_plan: false,
            num_days: None,
            strategy: PlanStrategy::Heuristic,
        }
    }

    #[test]
    fn bounds_are_enforced() {
        for bad in [
            PlanInput { phase: 7, ..input() },
            PlanInput { phase: 0, ..input() },
            PlanInput { energy: 6, ..input() },
            PlanInput { time_budget_minutes: 10, ..input() },
            PlanInput { time_budget_minutes: 481, ..input() },
            PlanInput { generate_week_plan: true, num_days: Some(15), ..input() },
            PlanInput { topic: " ".to_string(), ..input() },
        ] {
            assert_eq!(bad.validate().unwrap_err().kind, ErrorKind::Validation);
        }
    }

    #[test]
    fn budget_is_normalized_down() {
        let v = PlanInput { time_budget_minutes: 67, ..input() }.validate().unwrap();
        assert_eq!(v.time_budget_minutes, 65);
        let edge = PlanInput { time_budget_minutes: 480, ..input() }.validate().unwrap();
        assert_eq!(edge.time_budget_minutes, 480);
    }

    #[test]
    fn week_plan_defaults_to_seven_days() {
        let v = PlanInput { generate_week_plan: true, ..input() }.validate().unwrap();
        assert_eq!(v.day_count(), 7);
        assert_eq!(input().validate().unwrap().day_count(), 1);
    }
}
