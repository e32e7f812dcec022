pub mod file;
pub mod memory;

use chrono::{DateTime, NaiveDate, Utc};
use crate::energy::EnergyLogEntry;
use crate::error::PlanError;
use crate::mastery::ConceptMasteryRecord;
use crate::pipeline::job::JobRecord;
use crate::review::ReviewItem;
use crate::sessions::SessionRecord;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Read/write contract the engine needs from persistence.
///
/// Writes are per-key upserts with last-write-wins semantics; no
/// compare-and-swap is offered.
pub trait Datastore: Send + Sync {
    fn get_mastery(&self, user_id: &str, concept_id: &str) -> Result<Option<ConceptMasteryRecord>, PlanError>;
    fn upsert_mastery(&self, record: &ConceptMasteryRecord) -> Result<(), PlanError>;

    fn insert_review_item(&self, item: &ReviewItem) -> Result<(), PlanError>;
    fn update_review_item(&self, item: &ReviewItem) -> Result<(), PlanError>;
    fn get_review_item(&self, id: &str) -> Result<Option<ReviewItem>, PlanError>;
    fn find_review_item(&self, user_id: &str, topic: &str, subtopic: &str) -> Result<Option<ReviewItem>, PlanError>;
    /// Items due at or before `now`, earliest first.
    fn reviews_due(&self, user_id: &str, now: DateTime<Utc>) -> Result<Vec<ReviewItem>, PlanError>;

    fn save_session(&self, record: &SessionRecord) -> Result<(), PlanError>;
    /// Sessions dated in `[since, until)`, oldest first.
    fn recent_sessions(&self, user_id: &str, since: NaiveDate, until: NaiveDate) -> Result<Vec<SessionRecord>, PlanError>;

    /// Append one entry; a second entry for the same day is rejected.
    fn append_energy(&self, user_id: &str, entry: EnergyLogEntry) -> Result<(), PlanError>;
    /// Up to `limit` most recent entries dated before `before`, oldest first.
    fn recent_energy(&self, user_id: &str, before: NaiveDate, limit: usize) -> Result<Vec<EnergyLogEntry>, PlanError>;

    fn save_job(&self, job: &JobRecord) -> Result<(), PlanError>;
    fn load_job(&self, job_id: &str) -> Result<Option<JobRecord>, PlanError>;
}
