//! Repository combining the document store and the local cache

use std::time::Duration;

use super::{DocumentStore, LocalCache, StoreError, Subscription};
use crate::core::merge::{clean_batch, merge_records, MergeStats};
use crate::entities::rnc::RncRecord;

/// Where a loaded record set came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    Remote,
    Cache,
}

impl std::fmt::Display for LoadSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadSource::Remote => write!(f, "document store"),
            LoadSource::Cache => write!(f, "local cache"),
        }
    }
}

/// Result of [`RncRepository::load`]
#[derive(Debug)]
pub struct Loaded {
    pub records: Vec<RncRecord>,
    pub source: LoadSource,
}

/// Outcome of the remote half of a write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteWrite {
    /// Documents written to the store
    Written(usize),
    /// The store failed; the cache holds the data until the next push
    Pending(String),
    /// No store configured
    Disabled,
}

/// Result of [`RncRepository::import`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOutcome {
    /// Records kept after cleaning the batch
    pub accepted: usize,
    /// Records dropped for missing numbers or duplicated in the batch
    pub dropped: usize,
    pub merge: MergeStats,
    /// Size of the working set after the import
    pub total: usize,
    pub remote: RemoteWrite,
}

/// Access to the working record set
pub struct RncRepository {
    remote: Option<Box<dyn DocumentStore>>,
    cache: LocalCache,
}

impl RncRepository {
    pub fn new(remote: Option<Box<dyn DocumentStore>>, cache: LocalCache) -> Self {
        Self { remote, cache }
    }

    /// Repository without a document store
    pub fn local_only(cache: LocalCache) -> Self {
        Self::new(None, cache)
    }

    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    pub fn cache(&self) -> &LocalCache {
        &self.cache
    }

    fn remote_mut(&mut self) -> Result<&mut Box<dyn DocumentStore>, StoreError> {
        self.remote
            .as_mut()
            .ok_or_else(|| StoreError::Unavailable("no document store configured".to_string()))
    }

    /// Load the working set: the store when reachable, else the cache.
    ///
    /// An empty store never shadows a non-empty cache, and records still
    /// waiting for a push are laid over the store snapshot.
    pub fn load(&self) -> Result<Loaded, StoreError> {
        if let Some(remote) = &self.remote {
            match remote.list() {
                Ok(records) if !records.is_empty() => {
                    let records = self.cache.overlay_pending(records)?;
                    self.cache.save(&records)?;
                    return Ok(Loaded {
                        records,
                        source: LoadSource::Remote,
                    });
                }
                Ok(_) => {
                    let cached = self.cache.load()?;
                    if cached.is_empty() {
                        return Ok(Loaded {
                            records: cached,
                            source: LoadSource::Remote,
                        });
                    }
                    tracing::info!(
                        cached = cached.len(),
                        "document store is empty, using local cache"
                    );
                    return Ok(Loaded {
                        records: cached,
                        source: LoadSource::Cache,
                    });
                }
                Err(e) => {
                    tracing::warn!(error = %e, "document store unreachable, using local cache");
                }
            }
        }

        Ok(Loaded {
            records: self.cache.load()?,
            source: LoadSource::Cache,
        })
    }

    /// Merge a parsed batch into the working set and persist it
    pub fn import(&mut self, records: Vec<RncRecord>) -> Result<ImportOutcome, StoreError> {
        let received = records.len();
        let batch = clean_batch(records);
        let accepted = batch.len();

        let mut working = self.load()?.records;
        let merge = merge_records(&mut working, batch.clone());

        // Cache first, so the data survives a store failure
        self.cache.save(&working)?;

        let remote = match self.remote.as_mut() {
            None => RemoteWrite::Disabled,
            Some(_) if batch.is_empty() => RemoteWrite::Written(0),
            Some(store) => match store.upsert_many(&batch) {
                Ok(n) => RemoteWrite::Written(n),
                Err(e) => {
                    tracing::warn!(error = %e, "remote write failed, kept in local cache");
                    RemoteWrite::Pending(e.to_string())
                }
            },
        };

        let numbers = batch.iter().map(|r| r.number.as_str());
        match remote {
            RemoteWrite::Written(_) => self.cache.unmark_pending(numbers)?,
            RemoteWrite::Pending(_) | RemoteWrite::Disabled => self.cache.mark_pending(numbers)?,
        }

        tracing::info!(
            received,
            accepted,
            inserted = merge.inserted,
            updated = merge.updated,
            "imported records"
        );

        Ok(ImportOutcome {
            accepted,
            dropped: received - accepted,
            merge,
            total: working.len(),
            remote,
        })
    }

    /// Upload the whole cached set to the store
    pub fn push(&mut self) -> Result<usize, StoreError> {
        let records = clean_batch(self.cache.load()?);
        let store = self.remote_mut()?;
        let written = store.upsert_many(&records)?;
        self.cache.clear_pending()?;
        tracing::info!(written, "pushed local cache to document store");
        Ok(written)
    }

    /// Replace the cache with the store snapshot, discarding anything not
    /// pushed yet
    pub fn pull(&mut self) -> Result<usize, StoreError> {
        let store = self.remote_mut()?;
        let records = store.list()?;
        self.cache.replace(&records)?;
        self.cache.clear_pending()?;
        tracing::info!(records = records.len(), "pulled document store into local cache");
        Ok(records.len())
    }

    /// Delete every record from the store and the cache. Returns the number
    /// of remote documents deleted.
    pub fn clear(&mut self) -> Result<usize, StoreError> {
        let deleted = match self.remote.as_mut() {
            Some(store) => store.delete_all()?,
            None => 0,
        };
        self.cache.clear()?;
        self.cache.clear_pending()?;
        tracing::info!(deleted, "cleared records");
        Ok(deleted)
    }

    /// Follow store changes: every snapshot, with pending records laid over
    /// it, replaces the cache and is then handed to `on_snapshot`
    pub fn watch<F>(&self, interval: Duration, mut on_snapshot: F) -> Result<Subscription, StoreError>
    where
        F: FnMut(Vec<RncRecord>) + Send + 'static,
    {
        let store = self
            .remote
            .as_ref()
            .ok_or_else(|| StoreError::Unavailable("no document store configured".to_string()))?;

        let cache = self.cache.clone();
        store.subscribe(
            interval,
            Box::new(move |snapshot| {
                let records = match cache.overlay_pending(snapshot.clone()) {
                    Ok(records) => records,
                    Err(e) => {
                        tracing::error!(error = %e, "failed to read pending records");
                        snapshot
                    }
                };
                if let Err(e) = cache.replace(&records) {
                    tracing::error!(error = %e, "failed to update local cache");
                }
                on_snapshot(records);
            }),
        )
    }
}
