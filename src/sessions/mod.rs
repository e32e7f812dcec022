pub mod analyzer;
pub mod reflection;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use crate::energy::DayType;
use crate::error::{PlanError, ValidationError};

pub use analyzer::{analyze_outcome, record_session_outcome, OutcomeAnalysis, SessionOutcome};
pub use reflection::{classify_reflection, ReflectionSignal, Sentiment};

/// What the learner reports when a study session ends.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionResult {
    pub user_id: String,
    pub concept_id: Option<String>,
    pub topic: String,
    #[serde(default)]
    pub subtopic: Option<String>,
    pub date: NaiveDate,
    pub day_type: DayType,
    /// 1..=5
    pub understanding_score: u8,
    /// 0..=100
    pub completion_rate: u8,
    #[serde(default)]
    pub reflection: Option<String>,
    /// Pre-classified reflection; derived from `reflection` when absent
    #[serde(default)]
    pub reflection_signal: Option<ReflectionSignal>,
    #[serde(default)]
    pub high_retention: bool,
}

impl SessionResult {
    pub fn validate(&self) -> Result<(), PlanError> {
        if self.user_id.trim().is_empty() {
            return Err(ValidationError::Empty("userId").into());
        }
        if self.topic.trim().is_empty() {
            return Err(ValidationError::Empty("topic").into());
        }
        if !(1..=5).contains(&self.understanding_score) {
            return Err(ValidationError::Understanding(self.understanding_score).into());
        }
        if self.completion_rate > 100 {
            return Err(ValidationError::Completion(self.completion_rate).into());
        }
        Ok(())
    }

    /// Key under which mastery is tracked: the concept id, or the topic for
    /// free-topic sessions.
    pub fn mastery_key(&self) -> &str {
        self.concept_id.as_deref().unwrap_or(&self.topic)
    }

    pub fn review_subtopic(&self) -> &str {
        self.subtopic.as_deref().unwrap_or(&self.topic)
    }
}

/// A saved session. Also the source of day-type history for planning.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub session_id: String,
    #[serde(flatten)]
    pub result: SessionResult,
    pub recorded_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn new(result: SessionResult, recorded_at: DateTime<Utc>) -> Self {
        SessionRecord {
            session_id: uuid::Uuid::new_v4().to_string(),
            result,
            recorded_at,
        }
    }
}

/// One day type per calendar day for the unbroken run of days ending the
/// day before `today`, oldest first.
///
/// A day with several sessions counts once, at its most intense session.
/// A day without sessions ends the run.
pub fn day_type_history(sessions: &[SessionRecord], today: NaiveDate) -> Vec<DayType> {
    let mut ordered: Vec<&SessionRecord> = sessions.iter().filter(|s| s.result.date < today).collect();
    ordered.sort_by_key(|s| (s.result.date, s.recorded_at));

    let mut per_day: Vec<(NaiveDate, DayType)> = Vec::new();
    for session in ordered {
        let day_type = session.result.day_type;
        match per_day.last_mut() {
            Some((date, kept)) if *date == session.result.date => {
                if day_type.intensity_level() >= kept.intensity_level() {
                    *kept = day_type;
                }
            }
            _ => per_day.push((session.result.date, day_type)),
        }
    }

    let mut expected = today.pred_opt();
    let mut run = Vec::new();
    for (date, day_type) in per_day.into_iter().rev() {
        if Some(date) != expected {
            break;
        }
        run.push(day_type);
        expected = date.pred_opt();
    }
    run.reverse();
    run
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(date: NaiveDate, day_type: DayType, minute: u32) -> SessionRecord {
        let result = SessionResult {
            user_id: "u1".to_string(),
            concept_id: None,
            topic: "Rust".to_string(),
            subtopic: None,
            date,
            day_type,
            understanding_score: 3,
            completion_rate: 70,
            reflection: None,
            reflection_signal: None,
            high_retention: false,
        };
        let recorded_at = date.and_hms_opt(9, minute, 0).unwrap().and_utc();
        SessionRecord::new(result, recorded_at)
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    #[test]
    fn history_collapses_to_one_entry_per_day() {
        let sessions = vec![
            session(day(9), DayType::Beast, 0),
            session(day(9), DayType::Minimum, 5),
            session(day(9), DayType::Beast, 10),
            session(day(8), DayType::Normal, 0),
        ];
        assert_eq!(
            day_type_history(&sessions, day(10)),
            vec![DayType::Normal, DayType::Beast]
        );
    }

    #[test]
    fn a_rest_day_ends_the_run() {
        let sessions = vec![
            session(day(1), DayType::Beast, 0),
            session(day(2), DayType::Beast, 0),
            session(day(3), DayType::Beast, 0),
        ];
        assert!(day_type_history(&sessions, day(13)).is_empty());

        let sessions = vec![
            session(day(6), DayType::Beast, 0),
            session(day(8), DayType::Beast, 0),
            session(day(9), DayType::Beast, 0),
        ];
        assert_eq!(day_type_history(&sessions, day(10)), vec![DayType::Beast, DayType::Beast]);
    }

    #[test]
    fn sessions_on_or_after_today_are_ignored() {
        let sessions = vec![
            session(day(9), DayType::Normal, 0),
            session(day(10), DayType::Beast, 0),
        ];
        assert_eq!(day_type_history(&sessions, day(10)), vec![DayType::Normal]);
    }
}
