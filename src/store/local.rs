//! Local JSON cache of the working record set

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use super::StoreError;
use crate::core::merge::merge_records;
use crate::entities::rnc::RncRecord;

/// Per-user copy of the last known record set
#[derive(Debug, Clone)]
pub struct LocalCache {
    path: PathBuf,
}

impl LocalCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read the cached set. A missing or corrupt file yields an empty set.
    pub fn load(&self) -> Result<Vec<RncRecord>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let contents = fs::read_to_string(&self.path).map_err(|e| StoreError::Io(e.to_string()))?;
        match serde_json::from_str(&contents) {
            Ok(records) => Ok(records),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "local cache is unreadable, starting empty"
                );
                Ok(Vec::new())
            }
        }
    }

    /// Persist the set. Saving an empty set is a no-op so a transient empty
    /// state never wipes the cache. Returns whether anything was written.
    pub fn save(&self, records: &[RncRecord]) -> Result<bool, StoreError> {
        if records.is_empty() {
            return Ok(false);
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::Io(e.to_string()))?;
        }

        let json = serde_json::to_string_pretty(records)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| StoreError::Io(e.to_string()))?;
        fs::rename(&tmp, &self.path).map_err(|e| StoreError::Io(e.to_string()))?;

        tracing::debug!(path = %self.path.display(), records = records.len(), "saved local cache");
        Ok(true)
    }

    /// Make the cache mirror `records` exactly, clearing it when empty
    pub fn replace(&self, records: &[RncRecord]) -> Result<(), StoreError> {
        if records.is_empty() {
            self.clear()
        } else {
            self.save(records).map(|_| ())
        }
    }

    /// Remove the cache file
    pub fn clear(&self) -> Result<(), StoreError> {
        if self.path.exists() {
            fs::remove_file(&self.path).map_err(|e| StoreError::Io(e.to_string()))?;
        }
        Ok(())
    }

    fn pending_path(&self) -> PathBuf {
        self.path.with_extension("pending.json")
    }

    /// Numbers saved locally that the document store has not received yet
    pub fn pending(&self) -> Result<BTreeSet<String>, StoreError> {
        let path = self.pending_path();
        if !path.exists() {
            return Ok(BTreeSet::new());
        }

        let contents = fs::read_to_string(&path).map_err(|e| StoreError::Io(e.to_string()))?;
        match serde_json::from_str(&contents) {
            Ok(numbers) => Ok(numbers),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "pending list is unreadable");
                Ok(BTreeSet::new())
            }
        }
    }

    pub fn mark_pending<'a>(
        &self,
        numbers: impl IntoIterator<Item = &'a str>,
    ) -> Result<(), StoreError> {
        let mut pending = self.pending()?;
        let before = pending.len();
        pending.extend(numbers.into_iter().map(|n| n.trim().to_string()));
        if pending.len() == before {
            return Ok(());
        }
        self.write_pending(&pending)
    }

    pub fn unmark_pending<'a>(
        &self,
        numbers: impl IntoIterator<Item = &'a str>,
    ) -> Result<(), StoreError> {
        let mut pending = self.pending()?;
        let before = pending.len();
        for number in numbers {
            pending.remove(number.trim());
        }
        if pending.len() == before {
            return Ok(());
        }
        self.write_pending(&pending)
    }

    pub fn clear_pending(&self) -> Result<(), StoreError> {
        let path = self.pending_path();
        if path.exists() {
            fs::remove_file(&path).map_err(|e| StoreError::Io(e.to_string()))?;
        }
        Ok(())
    }

    fn write_pending(&self, pending: &BTreeSet<String>) -> Result<(), StoreError> {
        if pending.is_empty() {
            return self.clear_pending();
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::Io(e.to_string()))?;
        }
        let json = serde_json::to_string(pending)?;
        fs::write(self.pending_path(), json).map_err(|e| StoreError::Io(e.to_string()))
    }

    /// `snapshot` with every pending cached record laid over it
    pub fn overlay_pending(&self, mut snapshot: Vec<RncRecord>) -> Result<Vec<RncRecord>, StoreError> {
        let pending = self.pending()?;
        if pending.is_empty() {
            return Ok(snapshot);
        }

        let local: Vec<RncRecord> = self
            .load()?
            .into_iter()
            .filter(|r| pending.contains(r.number.trim()))
            .collect();
        if !local.is_empty() {
            tracing::debug!(pending = local.len(), "keeping records not yet in the document store");
            merge_records(&mut snapshot, local);
        }
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_is_empty() {
        let tmp = tempdir().unwrap();
        let cache = LocalCache::new(tmp.path().join("cache.json"));
        assert!(cache.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let tmp = tempdir().unwrap();
        let cache = LocalCache::new(tmp.path().join(".sgq/cache.json"));
        let records = vec![RncRecord::new("1", "a"), RncRecord::new("2", "b")];

        assert!(cache.save(&records).unwrap());
        assert_eq!(cache.load().unwrap(), records);
    }

    #[test]
    fn test_empty_save_is_noop() {
        let tmp = tempdir().unwrap();
        let cache = LocalCache::new(tmp.path().join("cache.json"));
        cache.save(&[RncRecord::new("1", "a")]).unwrap();

        assert!(!cache.save(&[]).unwrap());
        assert_eq!(cache.load().unwrap().len(), 1);
    }

    #[test]
    fn test_corrupt_file_is_empty() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("cache.json");
        fs::write(&path, "{not json").unwrap();
        assert!(LocalCache::new(&path).load().unwrap().is_empty());
    }

    #[test]
    fn test_replace_and_clear() {
        let tmp = tempdir().unwrap();
        let cache = LocalCache::new(tmp.path().join("cache.json"));
        cache.replace(&[RncRecord::new("1", "a")]).unwrap();
        assert!(cache.exists());

        cache.replace(&[]).unwrap();
        assert!(!cache.exists());
        cache.clear().unwrap();
    }

    #[test]
    fn test_pending_numbers() {
        let tmp = tempdir().unwrap();
        let cache = LocalCache::new(tmp.path().join("cache.json"));
        assert!(cache.pending().unwrap().is_empty());

        cache.mark_pending(["1", " 2 "]).unwrap();
        let pending: Vec<String> = cache.pending().unwrap().into_iter().collect();
        assert_eq!(pending, vec!["1", "2"]);

        cache.unmark_pending(["1"]).unwrap();
        assert_eq!(cache.pending().unwrap().len(), 1);

        cache.clear_pending().unwrap();
        assert!(cache.pending().unwrap().is_empty());
    }

    #[test]
    fn test_overlay_pending_keeps_local_only_records() {
        let tmp = tempdir().unwrap();
        let cache = LocalCache::new(tmp.path().join("cache.json"));
        cache
            .save(&[RncRecord::new("1", "local"), RncRecord::new("2", "new")])
            .unwrap();
        cache.mark_pending(["2"]).unwrap();

        let merged = cache
            .overlay_pending(vec![RncRecord::new("1", "remote")])
            .unwrap();
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].description, "remote");
        assert_eq!(merged[1].number, "2");
    }
}
