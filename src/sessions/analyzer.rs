use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::error::PlanError;
use crate::mastery::{clamp_score, ConceptMasteryRecord, MasteryUpdate};
use crate::review::{ensure_review_item, ReviewItem};
use crate::sessions::reflection::{classify_reflection, ReflectionSignal, Sentiment};
use crate::sessions::{SessionRecord, SessionResult};
use crate::store::Datastore;

/// Pure result of scoring one session against a mastery record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutcomeAnalysis {
    pub delta: i32,
    /// Some(true) = mark struggling, Some(false) = clear, None = unchanged
    pub struggling: Option<bool>,
    pub applied_rules: Vec<String>,
}

/// Score a session. Rules are cumulative; their deltas are summed.
pub fn analyze_outcome(
    understanding: u8,
    completion: u8,
    reflection: Option<ReflectionSignal>,
) -> OutcomeAnalysis {
    let mut delta = 0;
    let mut struggling = None;
    let mut applied_rules = Vec::new();

    if understanding >= 4 && completion >= 80 {
        delta += 5;
        struggling = Some(false);
        applied_rules.push("strong session (+5, struggle cleared)".to_string());
    } else if understanding >= 3 && completion >= 60 {
        delta += 2;
        applied_rules.push("solid session (+2)".to_string());
    } else if understanding <= 2 || completion < 50 {
        delta -= 3;
        if understanding <= 2 && completion < 50 {
            struggling = Some(true);
            applied_rules.push("weak understanding and low completion (-3, struggling)".to_string());
        } else {
            applied_rules.push("weak session (-3)".to_string());
        }
    }

    if let Some(signal) = reflection {
        if signal.sentiment == Sentiment::Negative || signal.struggle_keywords > 2 {
            delta -= 2;
            struggling = Some(true);
            applied_rules.push(format!(
                "negative reflection, {} struggle keywords (-2, struggling)",
                signal.struggle_keywords
            ));
        } else if signal.sentiment == Sentiment::Positive && signal.struggle_keywords == 0 {
            delta += 1;
            applied_rules.push("positive reflection (+1)".to_string());
        }
    }

    OutcomeAnalysis {
        delta,
        struggling,
        applied_rules,
    }
}

/// What recording a session produced. The session itself is always saved
/// when this is returned; `analysis_error` reports a failed best-effort
/// mastery/review step without undoing that save.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionOutcome {
    pub session_id: String,
    pub mastery_update: Option<MasteryUpdate>,
    pub new_review_items: Vec<ReviewItem>,
    pub analysis_error: Option<PlanError>,
}

/// Save the session, then update mastery and review items.
pub fn record_session_outcome<S: Datastore + ?Sized>(
    store: &S,
    result: SessionResult,
    now: DateTime<Utc>,
) -> Result<SessionOutcome, PlanError> {
    result.validate()?;

    let record = SessionRecord::new(result, now);
    store.save_session(&record).map_err(|e| e.with_context("saving session record"))?;
    tracing::info!(
        session_id = %record.session_id,
        user_id = %record.result.user_id,
        topic = %record.result.topic,
        "Session saved"
    );

    match apply_analysis(store, &record, now) {
        Ok((mastery_update, new_review_items)) => Ok(SessionOutcome {
            session_id: record.session_id,
            mastery_update: Some(mastery_update),
            new_review_items,
            analysis_error: None,
        }),
        Err(e) => {
            tracing::warn!(
                session_id = %record.session_id,
                error = %e,
                "Session analysis failed; session kept"
            );
            Ok(SessionOutcome {
                session_id: record.session_id,
                mastery_update: None,
                new_review_items: Vec::new(),
                analysis_error: Some(e.with_stage("session_analysis")),
            })
        }
    }
}

fn apply_analysis<S: Datastore + ?Sized>(
    store: &S,
    record: &SessionRecord,
    now: DateTime<Utc>,
) -> Result<(MasteryUpdate, Vec<ReviewItem>), PlanError> {
    let result = &record.result;
    let signal = result
        .reflection_signal
        .or_else(|| result.reflection.as_deref().map(classify_reflection));

    let key = result.mastery_key();
    let mut mastery = store
        .get_mastery(&result.user_id, key)?
        .unwrap_or_else(|| ConceptMasteryRecord::new(result.user_id.as_str(), key));

    let analysis = analyze_outcome(result.understanding_score, result.completion_rate, signal);
    let previous_score = mastery.mastery_score;
    let new_score = clamp_score(previous_score as i32 + analysis.delta);
    mastery.mastery_score = new_score;
    if let Some(flag) = analysis.struggling {
        mastery.struggling = flag;
    }
    mastery.last_practiced_at = Some(now);
    mastery.append_note(format!(
        "{} | {} day | understanding {}/5, completion {}% | {} -> {} | {}",
        result.date,
        result.day_type.as_str(),
        result.understanding_score,
        result.completion_rate,
        previous_score,
        new_score,
        analysis.applied_rules.join("; ")
    ));
    store.upsert_mastery(&mastery)?;

    let struggled = analysis.struggling == Some(true);
    let mut new_review_items = Vec::new();
    if result.high_retention || struggled {
        let (item, created) =
            ensure_review_item(store, &result.user_id, &result.topic, result.review_subtopic(), now)?;
        if created {
            new_review_items.push(item);
        }
    }

    tracing::info!(
        user_id = %result.user_id,
        concept = key,
        previous = previous_score,
        new = new_score,
        struggling = mastery.struggling,
        reviews_created = new_review_items.len(),
        "Mastery updated"
    );

    Ok((
        MasteryUpdate {
            concept_id: key.to_string(),
            previous_score,
            new_score,
            delta: new_score as i32 - previous_score as i32,
            struggling: mastery.struggling,
            applied_rules: analysis.applied_rules,
        },
        new_review_items,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signal(sentiment: Sentiment, struggle_keywords: u32) -> Option<ReflectionSignal> {
        Some(ReflectionSignal { sentiment, struggle_keywords })
    }

    #[test]
    fn strong_session_clears_struggle() {
        let a = analyze_outcome(5, 90, None);
        assert_eq!(a.delta, 5);
        assert_eq!(a.struggling, Some(false));
    }

    #[test]
    fn solid_session() {
        let a = analyze_outcome(3, 60, None);
        assert_eq!(a.delta, 2);
        assert_eq!(a.struggling, None);
    }

    #[test]
    fn weak_session_marks_struggle_only_when_both_fail() {
        let both = analyze_outcome(1, 30, None);
        assert_eq!(both.delta, -3);
        assert_eq!(both.struggling, Some(true));

        let one = analyze_outcome(2, 70, None);
        assert_eq!(one.delta, -3);
        assert_eq!(one.struggling, None);
    }

    #[test]
    fn middling_session_without_a_rule() {
        // understanding 3, completion 55: neither +2 nor -3
        let a = analyze_outcome(3, 55, None);
        assert_eq!(a.delta, 0);
        assert!(a.applied_rules.is_empty());
    }

    #[test]
    fn reflection_rules_stack() {
        let a = analyze_outcome(5, 90, signal(Sentiment::Positive, 0));
        assert_eq!(a.delta, 6);

        let b = analyze_outcome(5, 90, signal(Sentiment::Neutral, 3));
        assert_eq!(b.delta, 3);
        assert_eq!(b.struggling, Some(true));

        let c = analyze_outcome(3, 60, signal(Sentiment::Positive, 1));
        assert_eq!(c.delta, 2);
    }
}
