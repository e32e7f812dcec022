use serde::{Deserialize, Serialize};

/// Beast days allowed in a row before a forced downgrade.
pub const MAX_CONSECUTIVE_BEAST: u32 = 3;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DayType {
    Minimum,
    Normal,
    Beast,
    Recovery,
}

impl DayType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DayType::Minimum => "minimum",
            DayType::Normal => "normal",
            DayType::Beast => "beast",
            DayType::Recovery => "recovery",
        }
    }

    /// 1 = light, 2 = regular, 3 = heavy
    pub fn intensity_level(&self) -> u8 {
        match self {
            DayType::Minimum | DayType::Recovery => 1,
            DayType::Normal => 2,
            DayType::Beast => 3,
        }
    }

    pub fn is_low_intensity(&self) -> bool {
        matches!(self, DayType::Minimum | DayType::Recovery)
    }

    fn from_energy(energy: u8) -> Self {
        match energy {
            0..=2 => DayType::Minimum,
            3 => DayType::Normal,
            _ => DayType::Beast,
        }
    }
}

/// Running count of consecutive beast days, carried by the caller across a
/// multi-day planning loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeastStreak(pub u32);

impl BeastStreak {
    /// Trailing run of beast days at the end of `history`.
    pub fn from_history(history: &[DayType]) -> Self {
        BeastStreak(history.iter().rev().take_while(|d| **d == DayType::Beast).count() as u32)
    }

    pub fn advance(self, today: DayType) -> Self {
        if today == DayType::Beast {
            BeastStreak(self.0 + 1)
        } else {
            BeastStreak(0)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayTypeDecision {
    pub day_type: DayType,
    pub reason: String,
    /// Streak to hand to the next day's classification
    pub streak: BeastStreak,
}

/// Classify today's intensity from energy and the ordered history of
/// previous day types.
pub fn classify_day(energy: u8, history: &[DayType], streak: BeastStreak) -> DayTypeDecision {
    let base = DayType::from_energy(energy);
    let prior_beasts = streak.0.max(BeastStreak::from_history(history).0);

    let (day_type, reason) = if base == DayType::Beast && prior_beasts >= MAX_CONSECUTIVE_BEAST {
        (
            DayType::Minimum,
            format!(
                "energy {} maps to beast, but {} beast days in a row already; forced down to minimum",
                energy, prior_beasts
            ),
        )
    } else if energy <= 2
        && history.iter().rev().take(3).filter(|d| d.is_low_intensity()).count() >= 2
    {
        (
            DayType::Recovery,
            format!("energy {} after repeated low days; recovery day", energy),
        )
    } else {
        (base, format!("energy {} maps to {}", energy, base.as_str()))
    };

    DayTypeDecision {
        day_type,
        reason,
        streak: BeastStreak(prior_beasts).advance(day_type),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use DayType::*;

    #[test]
    fn base_mapping() {
        assert_eq!(classify_day(1, &[], BeastStreak(0)).day_type, Minimum);
        assert_eq!(classify_day(3, &[], BeastStreak(0)).day_type, Normal);
        assert_eq!(classify_day(4, &[], BeastStreak(0)).day_type, Beast);
    }

    #[test]
    fn fourth_beast_is_forced_to_minimum() {
        let d = classify_day(5, &[Beast, Beast, Beast], BeastStreak(3));
        assert_eq!(d.day_type, Minimum);
        assert_eq!(d.streak, BeastStreak(0));
    }

    #[test]
    fn history_alone_enforces_streak() {
        // caller forgot the counter; the trailing run still counts
        let d = classify_day(5, &[Normal, Beast, Beast, Beast], BeastStreak(0));
        assert_eq!(d.day_type, Minimum);
    }

    #[test]
    fn third_beast_is_allowed() {
        let d = classify_day(5, &[Beast, Beast], BeastStreak(2));
        assert_eq!(d.day_type, Beast);
        assert_eq!(d.streak, BeastStreak(3));
    }

    #[test]
    fn repeated_low_days_become_recovery() {
        assert_eq!(classify_day(2, &[Normal, Minimum, Recovery], BeastStreak(0)).day_type, Recovery);
        assert_eq!(classify_day(2, &[Minimum, Normal, Normal], BeastStreak(0)).day_type, Minimum);
        // energy 3 is never recovery
        assert_eq!(classify_day(3, &[Minimum, Minimum, Minimum], BeastStreak(0)).day_type, Normal);
    }

    #[test]
    fn streak_never_yields_four_beasts_over_a_loop() {
        let mut history = Vec::new();
        let mut streak = BeastStreak::default();
        for _ in 0..20 {
            let d = classify_day(5, &history, streak);
            history.push(d.day_type);
            streak = d.streak;
        }
        for window in history.windows(4) {
            assert!(window.iter().any(|d| *d != Beast));
        }
    }
}
