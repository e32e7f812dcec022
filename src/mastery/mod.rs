use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Score assumed for a concept the learner has never touched.
pub const DEFAULT_MASTERY: u8 = 50;

/// Per-(user, concept) mastery state. Created on first touch, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConceptMasteryRecord {
    pub user_id: String,
    pub concept_id: String,
    pub mastery_score: u8,
    pub struggling: bool,
    pub last_practiced_at: Option<DateTime<Utc>>,
    /// Append-only session notes
    #[serde(default)]
    pub notes: Vec<String>,
}

impl ConceptMasteryRecord {
    pub fn new<U: Into<String>, C: Into<String>>(user_id: U, concept_id: C) -> Self {
        ConceptMasteryRecord {
            user_id: user_id.into(),
            concept_id: concept_id.into(),
            mastery_score: DEFAULT_MASTERY,
            struggling: false,
            last_practiced_at: None,
            notes: Vec::new(),
        }
    }

    /// Apply a signed delta, clamping the result to [0, 100].
    pub fn apply_delta(&mut self, delta: i32) -> u8 {
        self.mastery_score = clamp_score(self.mastery_score as i32 + delta);
        self.mastery_score
    }

    pub fn append_note<S: Into<String>>(&mut self, note: S) {
        self.notes.push(note.into());
    }
}

pub fn clamp_score(raw: i32) -> u8 {
    raw.clamp(0, 100) as u8
}

/// Before/after view of one mastery write.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MasteryUpdate {
    pub concept_id: String,
    pub previous_score: u8,
    pub new_score: u8,
    pub delta: i32,
    pub struggling: bool,
    pub applied_rules: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_is_clamped() {
        let mut r = ConceptMasteryRecord::new("u", "c");
        r.mastery_score = 98;
        assert_eq!(r.apply_delta(5), 100);
        r.mastery_score = 2;
        assert_eq!(r.apply_delta(-5), 0);
    }

    #[test]
    fn notes_accumulate() {
        let mut r = ConceptMasteryRecord::new("u", "c");
        r.append_note("first");
        r.append_note("second");
        assert_eq!(r.notes, vec!["first".to_string(), "second".to_string()]);
    }
}
