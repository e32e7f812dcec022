pub mod day_type;
pub mod system_mode;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use crate::error::{PlanError, ValidationError};

pub use day_type::{classify_day, BeastStreak, DayType, DayTypeDecision};
pub use system_mode::{classify_mode, ModeAssessment, SystemMode};

/// One self-reported energy score for a day.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EnergyLogEntry {
    pub date: NaiveDate,
    pub score: u8,
}

impl EnergyLogEntry {
    pub fn new(date: NaiveDate, score: u8) -> Result<Self, PlanError> {
        check_energy(score)?;
        Ok(EnergyLogEntry { date, score })
    }
}

pub fn check_energy(score: u8) -> Result<(), PlanError> {
    if !(1..=5).contains(&score) {
        return Err(ValidationError::Energy(score).into());
    }
    Ok(())
}
