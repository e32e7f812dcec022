use std::path::{Path, PathBuf};
use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::Mutex;
use crate::energy::EnergyLogEntry;
use crate::error::PlanError;
use crate::mastery::ConceptMasteryRecord;
use crate::pipeline::job::JobRecord;
use crate::review::ReviewItem;
use crate::sessions::SessionRecord;
use crate::store::memory::{MemoryStore, StoreSnapshot};
use crate::store::Datastore;

const STORE_FILE: &str = "store.json";

/// JSON-file datastore: reads go to memory, every write rewrites the
/// snapshot file atomically (temp file + rename).
pub struct FileStore {
    path: PathBuf,
    inner: MemoryStore,
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Open (or create) the store under `dir`.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, PlanError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|e| {
            PlanError::persistence(format!("Failed to create data directory: {}", e))
                .with_context(format!("path: {:?}", dir))
        })?;

        let path = dir.join(STORE_FILE);
        let snapshot = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str::<StoreSnapshot>(&content).map_err(|e| {
                PlanError::persistence(format!("Failed to parse {}: {}", STORE_FILE, e))
                    .with_context(format!("path: {:?}", path))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = ?path, "No store file yet, starting empty");
                StoreSnapshot::default()
            }
            Err(e) => {
                return Err(PlanError::persistence(format!("Failed to read {}: {}", STORE_FILE, e))
                    .with_context(format!("path: {:?}", path)));
            }
        };

        tracing::info!(path = ?path, "File store opened");
        Ok(FileStore {
            path,
            inner: MemoryStore::from_snapshot(snapshot),
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, snapshot: &StoreSnapshot) -> Result<(), PlanError> {
        let json = serde_json::to_string_pretty(snapshot).map_err(|e| {
            PlanError::persistence(format!("Failed to serialize store: {}", e))
        })?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)
            .and_then(|_| std::fs::rename(&tmp, &self.path))
            .map_err(|e| {
                let _ = std::fs::remove_file(&tmp);
                PlanError::persistence(format!("Failed to write {}: {}", STORE_FILE, e))
                    .with_context(format!("path: {:?}", self.path))
            })
    }

    /// Apply a write to a copy of the data, flush the copy to disk, and only
    /// then make it visible. A failed flush leaves memory untouched. Writes
    /// are serialized so snapshots land in order.
    fn write<F>(&self, f: F) -> Result<(), PlanError>
    where
        F: FnOnce(&MemoryStore) -> Result<(), PlanError>,
    {
        let _guard = self.write_lock.lock();
        let staged = MemoryStore::from_snapshot(self.inner.snapshot());
        f(&staged)?;
        let snapshot = staged.into_snapshot();
        self.persist(&snapshot)?;
        self.inner.replace(snapshot);
        Ok(())
    }
}

impl Datastore for FileStore {
    fn get_mastery(&self, user_id: &str, concept_id: &str) -> Result<Option<ConceptMasteryRecord>, PlanError> {
        self.inner.get_mastery(user_id, concept_id)
    }

    fn upsert_mastery(&self, record: &ConceptMasteryRecord) -> Result<(), PlanError> {
        self.write(|m| m.upsert_mastery(record))
    }

    fn insert_review_item(&self, item: &ReviewItem) -> Result<(), PlanError> {
        self.write(|m| m.insert_review_item(item))
    }

    fn update_review_item(&self, item: &ReviewItem) -> Result<(), PlanError> {
        self.write(|m| m.update_review_item(item))
    }

    fn get_review_item(&self, id: &str) -> Result<Option<ReviewItem>, PlanError> {
        self.inner.get_review_item(id)
    }

    fn find_review_item(&self, user_id: &str, topic: &str, subtopic: &str) -> Result<Option<ReviewItem>, PlanError> {
        self.inner.find_review_item(user_id, topic, subtopic)
    }

    fn reviews_due(&self, user_id: &str, now: DateTime<Utc>) -> Result<Vec<ReviewItem>, PlanError> {
        self.inner.reviews_due(user_id, now)
    }

    fn save_session(&self, record: &SessionRecord) -> Result<(), PlanError> {
        self.write(|m| m.save_session(record))
    }

    fn recent_sessions(&self, user_id: &str, since: NaiveDate, until: NaiveDate) -> Result<Vec<SessionRecord>, PlanError> {
        self.inner.recent_sessions(user_id, since, until)
    }

    fn append_energy(&self, user_id: &str, entry: EnergyLogEntry) -> Result<(), PlanError> {
        self.write(|m| m.append_energy(user_id, entry))
    }

    fn recent_energy(&self, user_id: &str, before: NaiveDate, limit: usize) -> Result<Vec<EnergyLogEntry>, PlanError> {
        self.inner.recent_energy(user_id, before, limit)
    }

    fn save_job(&self, job: &JobRecord) -> Result<(), PlanError> {
        self.write(|m| m.save_job(job))
    }

    fn load_job(&self, job_id: &str) -> Result<Option<JobRecord>, PlanError> {
        self.inner.load_job(job_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mastery::ConceptMasteryRecord;

    #[test]
    fn survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = FileStore::open(dir.path()).unwrap();
            let mut record = ConceptMasteryRecord::new("u1", "ownership");
            record.mastery_score = 64;
            store.upsert_mastery(&record).unwrap();
            store
                .append_energy("u1", EnergyLogEntry { date: NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(), score: 4 })
                .unwrap();
        }

        let reopened = FileStore::open(dir.path()).unwrap();
        let record = reopened.get_mastery("u1", "ownership").unwrap().unwrap();
        assert_eq!(record.mastery_score, 64);
        let energy = reopened
            .recent_energy("u1", NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(), 3)
            .unwrap();
        assert_eq!(energy.len(), 1);
    }

    #[test]
    fn corrupt_file_is_a_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(STORE_FILE), "{not json").unwrap();
        let err = FileStore::open(dir.path()).err().unwrap();
        assert_eq!(err.kind, crate::error::ErrorKind::Persistence);
    }

    #[test]
    fn failed_flush_leaves_memory_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();

        // a directory in place of the store file makes the rename fail
        let blocker = dir.path().join(STORE_FILE);
        std::fs::create_dir(&blocker).unwrap();
        std::fs::write(blocker.join("keep"), "x").unwrap();

        let record = ConceptMasteryRecord::new("u1", "ownership");
        let err = store.upsert_mastery(&record).unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Persistence);
        assert!(store.get_mastery("u1", "ownership").unwrap().is_none());

        std::fs::remove_dir_all(&blocker).unwrap();
        store.upsert_mastery(&record).unwrap();
        assert!(store.get_mastery("u1", "ownership").unwrap().is_some());
        let reopened = FileStore::open(dir.path()).unwrap();
        assert!(reopened.get_mastery("u1", "ownership").unwrap().is_some());
    }
}
