//! SQLite-backed document store
//!
//! Documents are stored as JSON blobs keyed by `(collection, id)`, with
//! store-managed `created_at`/`updated_at` columns. Each collection carries a
//! revision counter that every write transaction bumps, which is what
//! [`SqliteStore::subscribe`] polls.
//!
//! The database file may be shared by several users (e.g., on a network
//! drive); WAL mode keeps readers from blocking the writer.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::{DocumentStore, SnapshotCallback, StoreError, Subscription};
use crate::core::config::{DEFAULT_BATCH_SIZE, MAX_BATCH_SIZE};
use crate::entities::rnc::RncRecord;

/// Current schema version - tables are rebuilt on version mismatch
const SCHEMA_VERSION: i32 = 1;

/// Granularity of the stop-flag check inside the polling loop
const STOP_CHECK: Duration = Duration::from_millis(50);

/// A document collection in a SQLite file
pub struct SqliteStore {
    conn: Connection,
    path: PathBuf,
    collection: String,
    batch_size: usize,
}

impl SqliteStore {
    /// Open or create the store at `path`
    pub fn open(path: &Path, collection: &str) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| StoreError::Io(e.to_string()))?;
            }
        }

        let conn = Connection::open(path)?;

        // WAL for concurrent readers; busy timeout for concurrent writers
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.busy_timeout(Duration::from_secs(5))?;

        let store = Self {
            conn,
            path: path.to_path_buf(),
            collection: collection.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
        };

        if store.needs_schema_rebuild()? {
            store.reinitialize_schema()?;
        }

        tracing::debug!(path = %path.display(), collection, "opened document store");
        Ok(store)
    }

    /// Set documents per transaction (clamped to 1..=500)
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.clamp(1, MAX_BATCH_SIZE);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Check if schema version matches current version
    fn needs_schema_rebuild(&self) -> Result<bool, StoreError> {
        let exists: bool = self.conn.query_row(
            "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type = 'table' AND name = 'schema_version'",
            [],
            |row| row.get(0),
        )?;
        if !exists {
            return Ok(true);
        }

        let current: Option<i32> = self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .optional()?;

        Ok(current != Some(SCHEMA_VERSION))
    }

    /// Drop all tables and create the current schema
    fn reinitialize_schema(&self) -> Result<(), StoreError> {
        tracing::debug!(version = SCHEMA_VERSION, "initializing store schema");
        self.conn.execute_batch(
            r#"
            DROP TABLE IF EXISTS schema_version;
            DROP TABLE IF EXISTS documents;
            DROP TABLE IF EXISTS collection_meta;

            CREATE TABLE schema_version (
                version INTEGER PRIMARY KEY
            );

            CREATE TABLE documents (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                data TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (collection, id)
            );
            CREATE INDEX idx_documents_updated ON documents(collection, updated_at);

            -- Per-collection change counter
            CREATE TABLE collection_meta (
                collection TEXT PRIMARY KEY,
                revision INTEGER NOT NULL DEFAULT 0
            );
            "#,
        )?;
        self.conn.execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            params![SCHEMA_VERSION],
        )?;
        Ok(())
    }

    fn bump_revision(tx: &rusqlite::Transaction<'_>, collection: &str) -> Result<(), StoreError> {
        tx.execute(
            "INSERT INTO collection_meta (collection, revision) VALUES (?1, 1)
             ON CONFLICT(collection) DO UPDATE SET revision = revision + 1",
            params![collection],
        )?;
        Ok(())
    }

    /// Number of documents in the collection
    pub fn count(&self) -> Result<usize, StoreError> {
        let n: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE collection = ?1",
            params![self.collection],
            |row| row.get(0),
        )?;
        Ok(n as usize)
    }

    /// Fetch one document by id
    pub fn get(&self, id: &str) -> Result<Option<RncRecord>, StoreError> {
        let row: Option<(String, String, String)> = self
            .conn
            .query_row(
                "SELECT data, created_at, updated_at FROM documents
                 WHERE collection = ?1 AND id = ?2",
                params![self.collection, id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        match row {
            Some((data, created, updated)) => Ok(Some(decode(&data, &created, &updated)?)),
            None => Ok(None),
        }
    }
}

impl DocumentStore for SqliteStore {
    fn list(&self) -> Result<Vec<RncRecord>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, data, created_at, updated_at FROM documents
             WHERE collection = ?1
             ORDER BY updated_at DESC, id ASC",
        )?;
        let rows = stmt.query_map(params![self.collection], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, data, created, updated) = row?;
            match decode(&data, &created, &updated) {
                Ok(record) => records.push(record),
                Err(e) => tracing::warn!(%id, error = %e, "skipping unreadable document"),
            }
        }
        Ok(records)
    }

    fn upsert_many(&mut self, records: &[RncRecord]) -> Result<usize, StoreError> {
        let mut written = 0;

        for chunk in records.chunks(self.batch_size) {
            let now = timestamp(Utc::now());
            let tx = self.conn.transaction()?;
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO documents (collection, id, data, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?4)
                     ON CONFLICT(collection, id) DO UPDATE SET
                         data = excluded.data,
                         updated_at = excluded.updated_at",
                )?;
                for record in chunk {
                    let data = serde_json::to_string(&record.without_timestamps())?;
                    stmt.execute(params![self.collection, record.id, data, now])?;
                }
            }
            Self::bump_revision(&tx, &self.collection)?;
            tx.commit()?;

            written += chunk.len();
            tracing::debug!(
                collection = %self.collection,
                chunk = chunk.len(),
                written,
                total = records.len(),
                "committed batch"
            );
        }

        Ok(written)
    }

    fn delete_all(&mut self) -> Result<usize, StoreError> {
        let mut deleted = 0;

        loop {
            let ids: Vec<String> = {
                let mut stmt = self
                    .conn
                    .prepare("SELECT id FROM documents WHERE collection = ?1 LIMIT ?2")?;
                let rows = stmt.query_map(params![self.collection, self.batch_size as i64], |row| {
                    row.get(0)
                })?;
                rows.collect::<Result<_, _>>()?
            };
            if ids.is_empty() {
                break;
            }

            let tx = self.conn.transaction()?;
            {
                let mut stmt =
                    tx.prepare("DELETE FROM documents WHERE collection = ?1 AND id = ?2")?;
                for id in &ids {
                    stmt.execute(params![self.collection, id])?;
                }
            }
            Self::bump_revision(&tx, &self.collection)?;
            tx.commit()?;

            deleted += ids.len();
            tracing::debug!(collection = %self.collection, deleted, "deleted batch");
        }

        Ok(deleted)
    }

    fn revision(&self) -> Result<u64, StoreError> {
        let rev: Option<i64> = self
            .conn
            .query_row(
                "SELECT revision FROM collection_meta WHERE collection = ?1",
                params![self.collection],
                |row| row.get(0),
            )
            .optional()?;
        Ok(rev.unwrap_or(0) as u64)
    }

    fn subscribe(
        &self,
        interval: Duration,
        mut callback: SnapshotCallback,
    ) -> Result<Subscription, StoreError> {
        // The listener needs its own connection; open it here so a bad path
        // surfaces as an error instead of a silent thread exit.
        let reader = SqliteStore::open(&self.path, &self.collection)?;
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);

        let handle = std::thread::spawn(move || {
            let mut last_revision: Option<u64> = None;

            while !flag.load(Ordering::SeqCst) {
                match reader.revision() {
                    Ok(rev) if Some(rev) != last_revision => match reader.list() {
                        Ok(records) => {
                            tracing::debug!(revision = rev, records = records.len(), "snapshot");
                            last_revision = Some(rev);
                            callback(records);
                        }
                        Err(e) => tracing::error!(error = %e, "failed to read snapshot"),
                    },
                    Ok(_) => {}
                    Err(e) => tracing::error!(error = %e, "failed to poll store revision"),
                }

                let deadline = Instant::now() + interval;
                while Instant::now() < deadline && !flag.load(Ordering::SeqCst) {
                    std::thread::sleep(STOP_CHECK.min(interval));
                }
            }
        });

        Ok(Subscription::new(stop, handle))
    }
}

fn timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn decode(data: &str, created: &str, updated: &str) -> Result<RncRecord, StoreError> {
    let mut record: RncRecord = serde_json::from_str(data)?;
    record.created_at = parse_timestamp(created);
    record.updated_at = parse_timestamp(updated);
    Ok(record)
}
