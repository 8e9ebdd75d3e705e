//! Record persistence
//!
//! The working set lives in two places: a keyed document collection behind
//! [`DocumentStore`] (shared, authoritative when reachable) and a per-user
//! JSON cache ([`LocalCache`]) that keeps the dashboard usable offline.
//! [`RncRepository`] ties the two together.

pub mod local;
pub mod repository;
pub mod sqlite;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use thiserror::Error;

use crate::entities::rnc::RncRecord;

pub use local::LocalCache;
pub use repository::{ImportOutcome, LoadSource, Loaded, RemoteWrite, RncRepository};
pub use sqlite::SqliteStore;

/// Callback receiving full collection snapshots
pub type SnapshotCallback = Box<dyn FnMut(Vec<RncRecord>) + Send + 'static>;

/// A keyed collection of RNC documents
pub trait DocumentStore: Send {
    /// All documents, most recently updated first
    fn list(&self) -> Result<Vec<RncRecord>, StoreError>;

    /// Insert or update documents by id. Returns the number written.
    fn upsert_many(&mut self, records: &[RncRecord]) -> Result<usize, StoreError>;

    /// Delete every document in the collection. Returns the number deleted.
    fn delete_all(&mut self) -> Result<usize, StoreError>;

    /// Change counter, bumped by every write
    fn revision(&self) -> Result<u64, StoreError>;

    /// Deliver an initial snapshot and then one per change until the
    /// returned [`Subscription`] is dropped
    fn subscribe(
        &self,
        interval: Duration,
        callback: SnapshotCallback,
    ) -> Result<Subscription, StoreError>;
}

/// Handle to a background snapshot listener. Dropping it stops the listener.
pub struct Subscription {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Subscription {
    pub(crate) fn new(stop: Arc<AtomicBool>, handle: JoinHandle<()>) -> Self {
        Self {
            stop,
            handle: Some(handle),
        }
    }

    pub fn is_active(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop listening and wait for the listener thread to exit
    pub fn cancel(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("snapshot listener panicked");
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Errors raised by the stores
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("invalid document data: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(String),

    #[error("document store unavailable: {0}")]
    Unavailable(String),
}
