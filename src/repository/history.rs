//! SQLite-backed history store with a reactive live query.
//!
//! The store is the sole owner of all stored items. Every committed
//! mutation republishes a freshly computed, recency-ordered snapshot to
//! watch subscribers; consumers treat each emission as a full replacement.
//!
//! Rows keep the item's canonical JSON in the `record` column. Imported
//! records are stored verbatim, which is how unknown extra fields survive
//! an import/export round trip.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use tokio::sync::watch;
use tracing::warn;

use super::{connect, with_retry, Result, StoreError};
use crate::models::{AnalysisItem, ItemPatch};

/// Recency-ordered view of the full store, as delivered to subscribers.
pub type Snapshot = Arc<Vec<AnalysisItem>>;

/// A record prepared for import: validated identity plus the raw JSON
/// object to persist verbatim.
#[derive(Debug, Clone)]
pub struct ImportRecord {
    pub id: String,
    pub kind: String,
    pub created_at: DateTime<Utc>,
    pub record: Value,
}

/// RAII permit for a multi-step mutation of one item.
///
/// Held across read → external call → update flows so a second mutation of
/// the same item cannot start in between. Dropping it releases the id.
#[derive(Debug)]
pub struct MutationClaim {
    id: String,
    registry: Arc<Mutex<HashSet<String>>>,
}

impl Drop for MutationClaim {
    fn drop(&mut self) {
        if let Ok(mut ids) = self.registry.lock() {
            ids.remove(&self.id);
        }
    }
}

/// Durable table of analysis items, keyed by id, ordered by recency.
pub struct HistoryStore {
    db_path: PathBuf,
    snapshot_tx: watch::Sender<Snapshot>,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl HistoryStore {
    /// Open (or create) a store at the given database path.
    pub fn open(db_path: &Path) -> Result<Self> {
        let store = Self {
            db_path: db_path.to_path_buf(),
            snapshot_tx: watch::channel(Arc::new(Vec::new())).0,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        };
        store.init_schema()?;
        store.snapshot_tx
            .send_replace(Arc::new(store.all_by_recency()?));
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.connect()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS items (
                id TEXT PRIMARY KEY,
                kind TEXT NOT NULL,
                created_at TEXT NOT NULL,
                record TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_items_created_at
                ON items(created_at DESC);
            "#,
        )?;
        Ok(())
    }

    fn connect(&self) -> Result<Connection> {
        connect(&self.db_path)
    }

    /// Get the database path.
    pub fn database_path(&self) -> &Path {
        &self.db_path
    }

    /// Subscribe to the live query. The receiver holds the current snapshot
    /// immediately and is re-notified after every committed mutation.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Claim an item id for a multi-step mutation.
    ///
    /// Fails with [`StoreError::Busy`] while another claim for the same id
    /// is outstanding.
    pub fn claim(&self, id: &str) -> Result<MutationClaim> {
        let mut ids = self
            .in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if !ids.insert(id.to_string()) {
            return Err(StoreError::Busy(id.to_string()));
        }
        Ok(MutationClaim {
            id: id.to_string(),
            registry: Arc::clone(&self.in_flight),
        })
    }

    /// Insert a new item. Fails with [`StoreError::Conflict`] if the id is
    /// already present.
    pub fn insert(&self, item: &AnalysisItem) -> Result<()> {
        let record = serde_json::to_string(item)?;
        let created_at = sort_key(item.created_at());

        with_retry(|| {
            let conn = self.connect()?;
            let result = conn.execute(
                "INSERT INTO items (id, kind, created_at, record) VALUES (?1, ?2, ?3, ?4)",
                params![item.id(), item.kind(), created_at, record],
            );
            match result {
                Ok(_) => Ok(()),
                Err(rusqlite::Error::SqliteFailure(e, _))
                    if e.code == rusqlite::ErrorCode::ConstraintViolation =>
                {
                    Err(StoreError::Conflict(item.id().to_string()))
                }
                Err(e) => Err(e.into()),
            }
        })?;

        self.publish();
        Ok(())
    }

    /// Apply a field-level overwrite of an item's mutable fields.
    ///
    /// Fails with [`StoreError::NotFound`] if the id is absent and with
    /// [`StoreError::VariantMismatch`] when a summary patch targets an image
    /// item or a description patch targets a text item. Fields not named by
    /// the patch, including any extra fields an import brought along, are
    /// preserved.
    pub fn update(&self, id: &str, patch: &ItemPatch) -> Result<AnalysisItem> {
        let updated = with_retry(|| {
            let mut conn = self.connect()?;
            let tx = conn.transaction()?;

            let record: Option<String> = tx
                .query_row(
                    "SELECT record FROM items WHERE id = ?1",
                    params![id],
                    |row| row.get(0),
                )
                .optional()?;
            let record = record.ok_or_else(|| StoreError::NotFound(id.to_string()))?;

            let value: Value = serde_json::from_str(&record)?;
            let item: AnalysisItem = serde_json::from_value(value.clone())?;
            if patch.summary.is_some() && !matches!(item, AnalysisItem::Text(_)) {
                return Err(StoreError::VariantMismatch(id.to_string()));
            }
            if patch.description.is_some() && !matches!(item, AnalysisItem::Image(_)) {
                return Err(StoreError::VariantMismatch(id.to_string()));
            }

            let mut obj = match value {
                Value::Object(obj) => obj,
                _ => return Err(StoreError::Corrupt(id.to_string())),
            };
            if let Some(title) = &patch.title {
                obj.insert("title".to_string(), Value::String(title.clone()));
            }
            if let Some(tags) = &patch.tags {
                obj.insert("tags".to_string(), serde_json::to_value(tags)?);
            }
            if let Some(summary) = &patch.summary {
                obj.insert("summary".to_string(), Value::String(summary.clone()));
            }
            if let Some(description) = &patch.description {
                obj.insert("description".to_string(), Value::String(description.clone()));
            }

            let merged = Value::Object(obj);
            let updated: AnalysisItem = serde_json::from_value(merged.clone())?;
            tx.execute(
                "UPDATE items SET record = ?2 WHERE id = ?1",
                params![id, serde_json::to_string(&merged)?],
            )?;
            tx.commit()?;
            Ok(updated)
        })?;

        self.publish();
        Ok(updated)
    }

    /// Delete one item. Returns whether a row was removed.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let removed = with_retry(|| {
            let conn = self.connect()?;
            Ok(conn.execute("DELETE FROM items WHERE id = ?1", params![id])? > 0)
        })?;

        if removed {
            self.publish();
        }
        Ok(removed)
    }

    /// Remove every record. Unconditional; confirmation is the caller's
    /// concern. Returns the number of removed rows.
    pub fn delete_all(&self) -> Result<usize> {
        let removed = with_retry(|| {
            let conn = self.connect()?;
            Ok(conn.execute("DELETE FROM items", [])?)
        })?;

        self.publish();
        Ok(removed)
    }

    /// Get an item by id.
    pub fn get(&self, id: &str) -> Result<Option<AnalysisItem>> {
        let conn = self.connect()?;
        let record: Option<String> = conn
            .query_row(
                "SELECT record FROM items WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;

        match record {
            Some(record) => Ok(Some(serde_json::from_str(&record)?)),
            None => Ok(None),
        }
    }

    /// Check if an item exists.
    pub fn exists(&self, id: &str) -> Result<bool> {
        let conn = self.connect()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM items WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Count all items.
    pub fn count(&self) -> Result<u64> {
        let conn = self.connect()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM items", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Full item set ordered by creation time, newest first.
    pub fn all_by_recency(&self) -> Result<Vec<AnalysisItem>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare("SELECT record FROM items ORDER BY created_at DESC")?;
        let items = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?
            .iter()
            .map(|record| serde_json::from_str(record))
            .collect::<std::result::Result<Vec<AnalysisItem>, _>>()?;
        Ok(items)
    }

    /// Raw stored records ordered by recency, for export.
    pub fn export_records(&self) -> Result<Vec<Value>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare("SELECT record FROM items ORDER BY created_at DESC")?;
        let records = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?
            .iter()
            .map(|record| serde_json::from_str(record))
            .collect::<std::result::Result<Vec<Value>, _>>()?;
        Ok(records)
    }

    /// Upsert pre-validated records in a single transaction.
    ///
    /// Existing rows with the same id are fully replaced by the incoming
    /// record; new ids are inserted. Either every record commits or none
    /// does. One snapshot is published after the commit.
    pub fn import_records(&self, records: &[ImportRecord]) -> Result<usize> {
        let count = with_retry(|| {
            let mut conn = self.connect()?;
            let tx = conn.transaction()?;
            for record in records {
                tx.execute(
                    r#"
                    INSERT INTO items (id, kind, created_at, record)
                    VALUES (?1, ?2, ?3, ?4)
                    ON CONFLICT(id) DO UPDATE SET
                        kind = excluded.kind,
                        created_at = excluded.created_at,
                        record = excluded.record
                    "#,
                    params![
                        record.id,
                        record.kind,
                        sort_key(record.created_at),
                        serde_json::to_string(&record.record)?,
                    ],
                )?;
            }
            tx.commit()?;
            Ok(records.len())
        })?;

        self.publish();
        Ok(count)
    }

    /// Recompute and publish the ordered snapshot after a committed mutation.
    fn publish(&self) {
        match self.all_by_recency() {
            Ok(items) => {
                self.snapshot_tx.send_replace(Arc::new(items));
            }
            Err(e) => warn!("failed to refresh history snapshot: {}", e),
        }
    }
}

/// Fixed-width RFC 3339 so lexicographic column order equals chronological.
fn sort_key(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
