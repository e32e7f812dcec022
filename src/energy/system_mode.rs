use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use crate::config::RulesConfig;
use crate::energy::{DayType, EnergyLogEntry};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SystemMode {
    Normal,
    ForcedRecovery,
    Intervention,
}

impl SystemMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SystemMode::Normal => "NORMAL",
            SystemMode::ForcedRecovery => "FORCED_RECOVERY",
            SystemMode::Intervention => "INTERVENTION",
        }
    }
}

/// Result of the energy-trend check: the mode plus the hard constraints the
/// rest of the planner must respect.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ModeAssessment {
    pub mode: SystemMode,
    pub message: String,
    pub constraints: Vec<String>,
    pub soft_week: bool,
}

/// Focused minutes allowed while in forced recovery.
pub const FORCED_RECOVERY_BUDGET_CAP: u32 = 120;

impl ModeAssessment {
    /// Upper bound on today's time budget, if the mode imposes one.
    pub fn budget_cap(&self) -> Option<u32> {
        match self.mode {
            SystemMode::ForcedRecovery => Some(FORCED_RECOVERY_BUDGET_CAP),
            _ => None,
        }
    }

    /// Apply the mode's effect on a classified day type. Returns the adjusted
    /// type and a note when anything changed.
    pub fn adjust_day(&self, day_type: DayType) -> (DayType, Option<String>) {
        match self.mode {
            SystemMode::ForcedRecovery | SystemMode::Intervention if day_type != DayType::Recovery => (
                DayType::Recovery,
                Some(format!("{} mode: {} downgraded to recovery", self.mode.as_str(), day_type.as_str())),
            ),
            SystemMode::Normal if self.soft_week && day_type == DayType::Beast => (
                DayType::Normal,
                Some("soft week: beast downgraded to normal".to_string()),
            ),
            _ => (day_type, None),
        }
    }
}

/// Classify the multi-day energy trend.
///
/// `history` is chronological and must not contain today. Rules are checked
/// in order and the first match wins.
pub fn classify_mode(
    history: &[EnergyLogEntry],
    today_score: u8,
    today: NaiveDate,
    rules: &RulesConfig,
) -> ModeAssessment {
    let recent_high = history.iter().rev().take(rules.max_beast_days).filter(|e| e.score >= 4).count();
    if rules.max_beast_days > 0
        && history.len() >= rules.max_beast_days
        && recent_high == rules.max_beast_days
    {
        return ModeAssessment {
            mode: SystemMode::ForcedRecovery,
            message: format!(
                "You have been pushing too hard: {} high-energy days in a row. Today is a recovery day.",
                rules.max_beast_days
            ),
            constraints: vec![
                "Cap focused work at 2 hours".to_string(),
                "No new commitments".to_string(),
                "Wind down and rest earlier tonight".to_string(),
            ],
            soft_week: false,
        };
    }

    let prior_low = history.iter().rev().take(2).filter(|e| e.score <= 2).count();
    if today_score <= 2 && history.len() >= 2 && prior_low == 2 {
        return ModeAssessment {
            mode: SystemMode::Intervention,
            message: "Energy has been low for three days running. Keep today light and check in with someone."
                .to_string(),
            constraints: vec![
                "Only light work today".to_string(),
                "Reach out to a support contact".to_string(),
            ],
            soft_week: false,
        };
    }

    let week = today.iso_week().week();
    if rules.soft_week_interval > 0 && week % rules.soft_week_interval == 0 {
        return ModeAssessment {
            mode: SystemMode::Normal,
            message: format!("ISO week {} is a soft week: maintenance only.", week),
            constraints: vec![
                "No new commitments".to_string(),
                "Maintenance work only".to_string(),
            ],
            soft_week: true,
        };
    }

    ModeAssessment {
        mode: SystemMode::Normal,
        message: "Energy trend is sustainable.".to_string(),
        constraints: Vec::new(),
        soft_week: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn log(scores: &[u8]) -> Vec<EnergyLogEntry> {
        let start = date(2025, 3, 1);
        scores
            .iter()
            .enumerate()
            .map(|(i, s)| EnergyLogEntry {
                date: start + chrono::Duration::days(i as i64),
                score: *s,
            })
            .collect()
    }

    // 2025-03-05 is in ISO week 10, not a multiple of 4
    fn weekday() -> NaiveDate {
        date(2025, 3, 5)
    }

    #[test]
    fn three_high_days_force_recovery() {
        let a = classify_mode(&log(&[5, 5, 5]), 5, weekday(), &RulesConfig::default());
        assert_eq!(a.mode, SystemMode::ForcedRecovery);
        assert_eq!(a.constraints.len(), 3);
    }

    #[test]
    fn short_history_never_forces_recovery() {
        let a = classify_mode(&log(&[5, 5]), 5, weekday(), &RulesConfig::default());
        assert_eq!(a.mode, SystemMode::Normal);
    }

    #[test]
    fn three_low_days_trigger_intervention() {
        let a = classify_mode(&log(&[4, 2, 1]), 2, weekday(), &RulesConfig::default());
        assert_eq!(a.mode, SystemMode::Intervention);

        let b = classify_mode(&log(&[2, 3, 1]), 2, weekday(), &RulesConfig::default());
        assert_eq!(b.mode, SystemMode::Normal);
    }

    #[test]
    fn soft_week_uses_iso_week_numbers() {
        // 2024-12-30 belongs to ISO week 1 of 2025, a naive day count says week 53
        let rules = RulesConfig { max_beast_days: 3, soft_week_interval: 1 };
        assert!(classify_mode(&[], 3, date(2024, 12, 30), &rules).soft_week);

        let every_fourth = RulesConfig::default();
        // 2025-01-20 is ISO week 4
        let a = classify_mode(&[], 3, date(2025, 1, 20), &every_fourth);
        assert!(a.soft_week);
        assert_eq!(a.mode, SystemMode::Normal);
        // 2025-01-19 is a Sunday, still ISO week 3
        assert!(!classify_mode(&[], 3, date(2025, 1, 19), &every_fourth).soft_week);
    }

    #[test]
    fn zero_interval_disables_soft_weeks() {
        let rules = RulesConfig { max_beast_days: 3, soft_week_interval: 0 };
        assert!(!classify_mode(&[], 3, date(2025, 1, 20), &rules).soft_week);
    }

    #[test]
    fn mode_effects_on_day_type() {
        let forced = classify_mode(&log(&[4, 5, 4]), 5, weekday(), &RulesConfig::default());
        assert_eq!(forced.budget_cap(), Some(FORCED_RECOVERY_BUDGET_CAP));
        assert_eq!(forced.adjust_day(DayType::Beast).0, DayType::Recovery);

        let rules = RulesConfig { max_beast_days: 3, soft_week_interval: 1 };
        let soft = classify_mode(&[], 5, weekday(), &rules);
        assert_eq!(soft.budget_cap(), None);
        assert_eq!(soft.adjust_day(DayType::Beast).0, DayType::Normal);
        let (kept, note) = soft.adjust_day(DayType::Minimum);
        assert_eq!(kept, DayType::Minimum);
        assert!(note.is_none());
    }
}
