use std::collections::{BTreeMap, HashMap};
use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use crate::energy::EnergyLogEntry;
use crate::error::{PlanError, ValidationError};
use crate::mastery::ConceptMasteryRecord;
use crate::pipeline::job::JobRecord;
use crate::review::ReviewItem;
use crate::sessions::SessionRecord;
use crate::store::Datastore;

/// How long finished jobs are kept after their last update.
pub const JOB_RETENTION_DAYS: i64 = 7;

/// Everything the engine persists, in one serializable snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSnapshot {
    /// user -> concept -> record
    pub mastery: BTreeMap<String, BTreeMap<String, ConceptMasteryRecord>>,
    pub reviews: BTreeMap<String, ReviewItem>,
    pub sessions: Vec<SessionRecord>,
    /// user -> entries sorted by date
    pub energy: BTreeMap<String, Vec<EnergyLogEntry>>,
    pub jobs: HashMap<String, JobRecord>,
}

/// In-process datastore. Suitable for tests and as the cache behind
/// `FileStore`.
#[derive(Default)]
pub struct MemoryStore {
    data: RwLock<StoreSnapshot>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        MemoryStore {
            data: RwLock::new(snapshot),
        }
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        self.data.read().clone()
    }

    pub fn into_snapshot(self) -> StoreSnapshot {
        self.data.into_inner()
    }

    /// Replace the whole contents.
    pub fn replace(&self, snapshot: StoreSnapshot) {
        *self.data.write() = snapshot;
    }
}

impl Datastore for MemoryStore {
    fn get_mastery(&self, user_id: &str, concept_id: &str) -> Result<Option<ConceptMasteryRecord>, PlanError> {
        Ok(self
            .data
            .read()
            .mastery
            .get(user_id)
            .and_then(|m| m.get(concept_id))
            .cloned())
    }

    fn upsert_mastery(&self, record: &ConceptMasteryRecord) -> Result<(), PlanError> {
        let mut record = record.clone();
        record.mastery_score = record.mastery_score.min(100);
        self.data
            .write()
            .mastery
            .entry(record.user_id.clone())
            .or_default()
            .insert(record.concept_id.clone(), record);
        Ok(())
    }

    fn insert_review_item(&self, item: &ReviewItem) -> Result<(), PlanError> {
        let mut data = self.data.write();
        if data.reviews.contains_key(&item.id) {
            return Err(PlanError::persistence(format!("review item '{}' already exists", item.id)));
        }
        data.reviews.insert(item.id.clone(), item.clone());
        Ok(())
    }

    fn update_review_item(&self, item: &ReviewItem) -> Result<(), PlanError> {
        let mut data = self.data.write();
        match data.reviews.get_mut(&item.id) {
            Some(slot) => {
                *slot = item.clone();
                Ok(())
            }
            None => Err(PlanError::not_found(format!("review item '{}' not found", item.id))),
        }
    }

    fn get_review_item(&self, id: &str) -> Result<Option<ReviewItem>, PlanError> {
        Ok(self.data.read().reviews.get(id).cloned())
    }

    fn find_review_item(&self, user_id: &str, topic: &str, subtopic: &str) -> Result<Option<ReviewItem>, PlanError> {
        Ok(self
            .data
            .read()
            .reviews
            .values()
            .find(|r| r.user_id == user_id && r.topic == topic && r.subtopic == subtopic)
            .cloned())
    }

    fn reviews_due(&self, user_id: &str, now: DateTime<Utc>) -> Result<Vec<ReviewItem>, PlanError> {
        let mut due: Vec<ReviewItem> = self
            .data
            .read()
            .reviews
            .values()
            .filter(|r| r.user_id == user_id && r.is_due(now))
            .cloned()
            .collect();
        due.sort_by(|a, b| a.next_review_at.cmp(&b.next_review_at).then_with(|| a.id.cmp(&b.id)));
        Ok(due)
    }

    fn save_session(&self, record: &SessionRecord) -> Result<(), PlanError> {
        let mut data = self.data.write();
        data.sessions.retain(|s| s.session_id != record.session_id);
        data.sessions.push(record.clone());
        Ok(())
    }

    fn recent_sessions(&self, user_id: &str, since: NaiveDate, until: NaiveDate) -> Result<Vec<SessionRecord>, PlanError> {
        let mut sessions: Vec<SessionRecord> = self
            .data
            .read()
            .sessions
            .iter()
            .filter(|s| s.result.user_id == user_id && s.result.date >= since && s.result.date < until)
            .cloned()
            .collect();
        sessions.sort_by_key(|s| (s.result.date, s.recorded_at));
        Ok(sessions)
    }

    fn append_energy(&self, user_id: &str, entry: EnergyLogEntry) -> Result<(), PlanError> {
        let mut data = self.data.write();
        let log = data.energy.entry(user_id.to_string()).or_default();
        match log.binary_search_by_key(&entry.date, |e| e.date) {
            Ok(_) => Err(ValidationError::DuplicateEnergyEntry(entry.date).into()),
            Err(pos) => {
                log.insert(pos, entry);
                Ok(())
            }
        }
    }

    fn recent_energy(&self, user_id: &str, before: NaiveDate, limit: usize) -> Result<Vec<EnergyLogEntry>, PlanError> {
        let data = self.data.read();
        let Some(log) = data.energy.get(user_id) else {
            return Ok(Vec::new());
        };
        let mut entries: Vec<EnergyLogEntry> =
            log.iter().rev().filter(|e| e.date < before).take(limit).copied().collect();
        entries.reverse();
        Ok(entries)
    }

    /// Upsert the job, dropping finished jobs idle for longer than
    /// `JOB_RETENTION_DAYS` relative to this job's update time.
    fn save_job(&self, job: &JobRecord) -> Result<(), PlanError> {
        let cutoff = job.updated_at - chrono::Duration::days(JOB_RETENTION_DAYS);
        let mut data = self.data.write();
        let before = data.jobs.len();
        data.jobs.retain(|_, j| !j.is_terminal() || j.updated_at >= cutoff);
        let pruned = before - data.jobs.len();
        if pruned > 0 {
            tracing::debug!(pruned, "Pruned finished jobs");
        }
        data.jobs.insert(job.id.clone(), job.clone());
        Ok(())
    }

    fn load_job(&self, job_id: &str) -> Result<Option<JobRecord>, PlanError> {
        Ok(self.data.read().jobs.get(job_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    #[test]
    fn energy_is_append_only_per_day() {
        let store = MemoryStore::new();
        store.append_energy("u", EnergyLogEntry { date: day(1), score: 3 }).unwrap();
        let err = store.append_energy("u", EnergyLogEntry { date: day(1), score: 5 }).unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Validation);
    }

    #[test]
    fn recent_energy_is_chronological_and_excludes_today() {
        let store = MemoryStore::new();
        for (d, s) in [(1, 1), (2, 2), (3, 3), (4, 4), (5, 5)] {
            store.append_energy("u", EnergyLogEntry { date: day(d), score: s }).unwrap();
        }
        let recent = store.recent_energy("u", day(5), 3).unwrap();
        let scores: Vec<u8> = recent.iter().map(|e| e.score).collect();
        assert_eq!(scores, vec![2, 3, 4]);
        assert!(store.recent_energy("nobody", day(5), 3).unwrap().is_empty());
    }

    #[test]
    fn old_finished_jobs_are_pruned() {
        use crate::plan::{PlanInput, PlanStrategy};

        let store = MemoryStore::new();
        let input = PlanInput {
            user_id: "u".to_string(),
            topic: "Rust".to_string(),
            subtopics: Vec::new(),
            concept_id: None,
            phase: 1,
            energy: 3,
            time_budget_minutes: 60,
            date: day(1),
            generate_week_plan: false,
            num_days: None,
            strategy: PlanStrategy::Heuristic,
        };
        let start = Utc::now();

        let mut finished = JobRecord::queued(input.clone(), start);
        finished.fail(PlanError::not_found("x"), start);
        let stalled = JobRecord::queued(input.clone(), start);
        store.save_job(&finished).unwrap();
        store.save_job(&stalled).unwrap();

        let later = start + chrono::Duration::days(JOB_RETENTION_DAYS + 1);
        let fresh = JobRecord::queued(input, later);
        store.save_job(&fresh).unwrap();

        assert!(store.load_job(&finished.id).unwrap().is_none());
        assert!(store.load_job(&stalled.id).unwrap().is_some());
        assert!(store.load_job(&fresh.id).unwrap().is_some());
    }
}
