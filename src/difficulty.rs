use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    fn rank(self) -> i8 {
        match self {
            Difficulty::Easy => 0,
            Difficulty::Medium => 1,
            Difficulty::Hard => 2,
        }
    }

    fn from_rank(rank: i8) -> Self {
        match rank {
            i8::MIN..=0 => Difficulty::Easy,
            1 => Difficulty::Medium,
            _ => Difficulty::Hard,
        }
    }

    fn from_mastery(mastery: Option<u8>) -> Self {
        match mastery {
            Some(m) if m >= 75 => Difficulty::Hard,
            Some(m) if m >= 50 => Difficulty::Medium,
            Some(_) => Difficulty::Easy,
            None => Difficulty::Medium,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DifficultyAdvice {
    pub level: Difficulty,
    pub reasoning: String,
}

/// Choose a task difficulty from mastery, energy and recent struggle.
///
/// The combined adjustment moves at most one step from the mastery-based
/// level and is clamped at both ends of the scale.
pub fn advise(mastery: Option<u8>, energy: u8, recently_struggling: bool) -> DifficultyAdvice {
    let base = Difficulty::from_mastery(mastery);

    let energy_adj: i8 = match energy {
        0..=2 => -1,
        3 => 0,
        _ => 1,
    };
    let struggle_adj: i8 = if recently_struggling { -1 } else { 0 };
    let net = (energy_adj + struggle_adj).clamp(-1, 1);
    let level = Difficulty::from_rank(base.rank() + net);

    let mastery_part = match mastery {
        Some(m) if m >= 75 => format!("mastery {} is high", m),
        Some(m) if m >= 50 => format!("mastery {} is developing", m),
        Some(m) => format!("mastery {} is low", m),
        None => "no mastery data yet".to_string(),
    };
    let energy_part = match energy_adj {
        -1 => format!("energy {} is low (step down)", energy),
        1 => format!("energy {} is high (step up)", energy),
        _ => format!("energy {} is steady", energy),
    };
    let mut reasoning = format!("{}, so base level {}; {}", mastery_part, base.as_str(), energy_part);
    if recently_struggling {
        reasoning.push_str("; recent struggle on this concept (step down)");
    }
    reasoning.push_str(&format!("; chosen level {}", level.as_str()));

    DifficultyAdvice { level, reasoning }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mastery_buckets() {
        assert_eq!(advise(Some(80), 3, false).level, Difficulty::Hard);
        assert_eq!(advise(Some(75), 3, false).level, Difficulty::Hard);
        assert_eq!(advise(Some(74), 3, false).level, Difficulty::Medium);
        assert_eq!(advise(Some(49), 3, false).level, Difficulty::Easy);
        assert_eq!(advise(None, 3, false).level, Difficulty::Medium);
    }

    #[test]
    fn adjustments_move_at_most_one_step() {
        // -1 energy, -1 struggle: still only one step down
        assert_eq!(advise(Some(90), 1, true).level, Difficulty::Medium);
        // +1 energy, -1 struggle cancel out
        assert_eq!(advise(Some(60), 5, true).level, Difficulty::Medium);
        assert_eq!(advise(Some(60), 5, false).level, Difficulty::Hard);
    }

    #[test]
    fn clamped_at_the_ends() {
        assert_eq!(advise(Some(10), 1, true).level, Difficulty::Easy);
        assert_eq!(advise(Some(99), 5, false).level, Difficulty::Hard);
    }

    #[test]
    fn reasoning_names_every_factor() {
        let advice = advise(Some(55), 2, true);
        assert!(advice.reasoning.contains("mastery 55"));
        assert!(advice.reasoning.contains("energy 2 is low"));
        assert!(advice.reasoning.contains("recent struggle"));
    }
}
