pub mod sm2;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use crate::error::{PlanError, ValidationError};
use crate::store::Datastore;

pub use sm2::Sm2State;

/// A (topic, subtopic) pair the learner is asked to revisit on an SM-2
/// schedule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReviewItem {
    pub id: String,
    pub user_id: String,
    pub topic: String,
    pub subtopic: String,
    #[serde(flatten)]
    pub state: Sm2State,
    pub last_review_at: Option<DateTime<Utc>>,
    pub next_review_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl ReviewItem {
    /// New item in the initial SM-2 state, first due one day after creation.
    pub fn new(user_id: &str, topic: &str, subtopic: &str, now: DateTime<Utc>) -> Self {
        let state = Sm2State::default();
        ReviewItem {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            topic: topic.to_string(),
            subtopic: subtopic.to_string(),
            state,
            last_review_at: None,
            next_review_at: now + Duration::days(state.interval_days as i64),
            created_at: now,
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_review_at <= now
    }

    /// Record a review of quality `quality` taken at `reviewed_at`.
    pub fn record_review(&mut self, quality: u8, reviewed_at: DateTime<Utc>) -> Result<(), PlanError> {
        if quality > 5 {
            return Err(ValidationError::Quality(quality).into());
        }
        let state = self.state.review(quality);
        let next_review_at = reviewed_at
            .checked_add_signed(Duration::days(state.interval_days as i64))
            .ok_or_else(|| {
                PlanError::validation(format!(
                    "next review {} days after {} is out of range",
                    state.interval_days, reviewed_at
                ))
            })?;
        self.state = state;
        self.last_review_at = Some(reviewed_at);
        self.next_review_at = next_review_at;
        Ok(())
    }
}

/// Create a review item for (user, topic, subtopic) unless one already
/// exists. Returns the item and whether it was newly created.
pub fn ensure_review_item<S: Datastore + ?Sized>(
    store: &S,
    user_id: &str,
    topic: &str,
    subtopic: &str,
    now: DateTime<Utc>,
) -> Result<(ReviewItem, bool), PlanError> {
    if let Some(existing) = store.find_review_item(user_id, topic, subtopic)? {
        tracing::debug!(
            review_id = %existing.id,
            topic = topic,
            subtopic = subtopic,
            "Review item already open"
        );
        return Ok((existing, false));
    }

    let item = ReviewItem::new(user_id, topic, subtopic, now);
    store.insert_review_item(&item)?;
    tracing::info!(
        review_id = %item.id,
        user_id = user_id,
        topic = topic,
        subtopic = subtopic,
        next_review_at = %item.next_review_at,
        "Review item created"
    );
    Ok((item, true))
}

/// Apply a review to a stored item and persist the new schedule.
pub fn complete_review<S: Datastore + ?Sized>(
    store: &S,
    review_id: &str,
    quality: u8,
    now: DateTime<Utc>,
) -> Result<ReviewItem, PlanError> {
    if quality > 5 {
        return Err(ValidationError::Quality(quality).into());
    }
    let mut item = store
        .get_review_item(review_id)?
        .ok_or_else(|| PlanError::not_found(format!("review item '{}' not found", review_id)))?;

    item.record_review(quality, now)?;
    store.update_review_item(&item)?;

    tracing::info!(
        review_id = review_id,
        quality = quality,
        interval_days = item.state.interval_days,
        ease_factor = item.state.ease_factor,
        "Review completed"
    );
    Ok(item)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn ensure_is_idempotent_per_key() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let (a, created_a) = ensure_review_item(&store, "u1", "Rust", "borrowing", now).unwrap();
        let (b, created_b) = ensure_review_item(&store, "u1", "Rust", "borrowing", now).unwrap();
        assert!(created_a);
        assert!(!created_b);
        assert_eq!(a.id, b.id);

        let (_, other_user) = ensure_review_item(&store, "u2", "Rust", "borrowing", now).unwrap();
        assert!(other_user);
    }

    #[test]
    fn completing_moves_next_review_forward() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let (item, _) = ensure_review_item(&store, "u1", "Rust", "traits", now).unwrap();

        let later = now + Duration::days(1);
        let updated = complete_review(&store, &item.id, 5, later).unwrap();
        assert_eq!(updated.state.repetitions, 1);
        assert_eq!(updated.last_review_at, Some(later));
        assert!(updated.next_review_at >= later);
        assert_eq!(store.get_review_item(&item.id).unwrap().unwrap(), updated);
    }

    #[test]
    fn unknown_item_and_bad_quality() {
        let store = MemoryStore::new();
        let err = complete_review(&store, "missing", 3, Utc::now()).unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::NotFound);
        let err = complete_review(&store, "missing", 9, Utc::now()).unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Validation);
    }

    #[test]
    fn many_perfect_reviews_stay_schedulable() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let (item, _) = ensure_review_item(&store, "u1", "Rust", "macros", now).unwrap();

        let mut last = item;
        for _ in 0..40 {
            last = complete_review(&store, &last.id, 5, now).unwrap();
        }
        assert_eq!(last.state.interval_days, sm2::MAX_INTERVAL_DAYS);
        assert_eq!(last.next_review_at, now + Duration::days(sm2::MAX_INTERVAL_DAYS as i64));
    }
}
