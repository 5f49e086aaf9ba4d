//! # JSON File Store
//!
//! [`SessionStore`] backed by one pretty-printed JSON file per record:
//! `<data_dir>/<collection>/<key>.json`. Writes go to a temporary file that
//! is renamed over the target.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::record::{SessionRecord, FINALIZED_PREFIX};
use super::SessionStore;
use crate::error::{Result, RoastLoggerError};

const RECORD_EXTENSION: &str = "json";

/// Directory of JSON session records
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Open (creating if needed) the collection directory
    ///
    /// # Arguments
    ///
    /// * `data_dir` - Root data directory
    /// * `collection` - Sub-directory holding this store's records
    ///
    /// # Errors
    ///
    /// Returns `Io` if the directory cannot be created.
    pub fn open(data_dir: impl AsRef<Path>, collection: &str) -> Result<Self> {
        let dir = data_dir.as_ref().join(collection);
        fs::create_dir_all(&dir)?;
        debug!("Session store at {}", dir.display());
        Ok(Self { dir })
    }

    /// Directory holding the records
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid {
            return Err(RoastLoggerError::Store(format!("Invalid record key '{}'", key)));
        }
        Ok(self.dir.join(format!("{}.{}", key, RECORD_EXTENSION)))
    }
}

impl SessionStore for JsonFileStore {
    fn save(&mut self, key: &str, record: &SessionRecord) -> Result<()> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension("json.tmp");

        fs::write(&tmp, serde_json::to_string_pretty(record)?)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Option<SessionRecord>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(serde_json::from_str(&text)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn delete(&mut self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn list_finalized(&self, limit: usize) -> Result<Vec<SessionRecord>> {
        let mut records = Vec::new();

        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let is_record = path.extension().is_some_and(|ext| ext == RECORD_EXTENSION);
            let is_finalized = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .is_some_and(|stem| stem.starts_with(FINALIZED_PREFIX));
            if !is_record || !is_finalized {
                continue;
            }

            let parsed = fs::read_to_string(&path)
                .map_err(RoastLoggerError::from)
                .and_then(|text| serde_json::from_str::<SessionRecord>(&text).map_err(RoastLoggerError::from));
            match parsed {
                Ok(record) => records.push(record),
                Err(e) => warn!("Skipping unreadable record {}: {}", path.display(), e),
            }
        }

        records.sort_by(|a, b| b.roast_start_time.cmp(&a.roast_start_time));
        records.truncate(limit);
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{persist_session, ACTIVE_KEY};
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use tempfile::TempDir;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    fn finalized(batch: u32, start_offset_hours: i64) -> SessionRecord {
        let start = t0() + Duration::hours(start_offset_hours);
        SessionRecord {
            roast_start_time: Some(start),
            roast_end_time: Some(start + Duration::minutes(11)),
            coffee_batch_num: batch,
            coffee_name: format!("Batch {}", batch),
            coffee_amount: 150.0,
            coffee_post_amount: Some(128.0),
            log_data: Vec::new(),
        }
    }

    fn open_store() -> (TempDir, JsonFileStore) {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::open(dir.path(), "roast_logs").unwrap();
        (dir, store)
    }

    #[test]
    fn test_open_creates_collection_dir() {
        let (dir, store) = open_store();
        assert!(store.dir().is_dir());
        assert_eq!(store.dir(), dir.path().join("roast_logs"));
    }

    #[test]
    fn test_save_then_load() {
        let (_dir, mut store) = open_store();
        let record = finalized(4, 0);

        store.save(&record.key(), &record).unwrap();
        assert_eq!(store.load(&record.key()).unwrap(), Some(record));
    }

    #[test]
    fn test_save_replaces_and_leaves_no_temp_file() {
        let (_dir, mut store) = open_store();
        let mut record = finalized(4, 0);
        store.save("active", &record).unwrap();

        record.coffee_name = "Renamed".to_string();
        store.save("active", &record).unwrap();

        assert_eq!(store.load("active").unwrap().unwrap().coffee_name, "Renamed");
        let files: Vec<_> = fs::read_dir(store.dir()).unwrap().collect();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_load_missing_is_none() {
        let (_dir, store) = open_store();
        assert!(store.load("roast_nothing").unwrap().is_none());
    }

    #[test]
    fn test_delete_missing_is_ok() {
        let (_dir, mut store) = open_store();
        store.delete(ACTIVE_KEY).unwrap();
    }

    #[test]
    fn test_rejects_path_like_keys() {
        let (_dir, store) = open_store();
        assert!(matches!(store.load("../escape"), Err(RoastLoggerError::Store(_))));
        assert!(matches!(store.load(""), Err(RoastLoggerError::Store(_))));
    }

    #[test]
    fn test_list_finalized_newest_first_with_limit() {
        let (_dir, mut store) = open_store();
        for (batch, hours) in [(1, 0), (3, 48), (2, 24)] {
            let record = finalized(batch, hours);
            store.save(&record.key(), &record).unwrap();
        }
        let mut active = finalized(9, 72);
        active.roast_end_time = None;
        store.save(ACTIVE_KEY, &active).unwrap();

        let all = store.list_finalized(20).unwrap();
        let batches: Vec<u32> = all.iter().map(|r| r.coffee_batch_num).collect();
        assert_eq!(batches, vec![3, 2, 1]);

        assert_eq!(store.list_finalized(2).unwrap().len(), 2);
    }

    #[test]
    fn test_list_skips_unreadable_records() {
        let (_dir, mut store) = open_store();
        let record = finalized(1, 0);
        store.save(&record.key(), &record).unwrap();
        fs::write(store.dir().join("roast_broken.json"), "{ not json").unwrap();

        assert_eq!(store.list_finalized(20).unwrap().len(), 1);
    }

    #[test]
    fn test_persist_session_moves_active_to_finalized() {
        let (_dir, mut store) = open_store();
        let mut record = finalized(6, 0);
        record.roast_end_time = None;
        let session = record.clone().into_session().unwrap();

        assert_eq!(persist_session(&mut store, &session).unwrap(), ACTIVE_KEY);
        assert!(store.load(ACTIVE_KEY).unwrap().is_some());

        record.roast_end_time = Some(t0() + Duration::minutes(12));
        let finalized = record.into_session().unwrap();
        let key = persist_session(&mut store, &finalized).unwrap();

        assert!(store.load(ACTIVE_KEY).unwrap().is_none());
        assert_eq!(store.load(&key).unwrap().unwrap().coffee_batch_num, 6);
    }
}
