//! Repository layer for local history persistence.
//!
//! All persistence goes through [`HistoryStore`], a SQLite-backed table of
//! analysis items. Connections are opened per operation; writes retry on
//! transient lock contention.

mod history;

pub use history::{HistoryStore, ImportRecord, MutationClaim, Snapshot};

use std::path::Path;
use std::time::Duration;

use rusqlite::Connection;
use thiserror::Error;

/// Errors from the history store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("item already exists: {0}")]
    Conflict(String),

    #[error("item not found: {0}")]
    NotFound(String),

    #[error("update field does not apply to the stored item kind: {0}")]
    VariantMismatch(String),

    #[error("another mutation is in flight for item {0}")]
    Busy(String),

    #[error("stored record for {0} is not a JSON object")]
    Corrupt(String),

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Open a connection with the pragmas every operation relies on.
pub(crate) fn connect(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.busy_timeout(Duration::from_secs(5))?;
    conn.query_row("PRAGMA journal_mode=WAL", [], |_row| Ok(()))?;
    Ok(conn)
}

/// Retry an operation a few times when SQLite reports the database busy.
pub(crate) fn with_retry<T>(mut op: impl FnMut() -> Result<T>) -> Result<T> {
    const MAX_ATTEMPTS: u64 = 3;

    let mut attempt = 0;
    loop {
        match op() {
            Err(StoreError::Sqlite(ref e)) if is_busy(e) && attempt < MAX_ATTEMPTS => {
                attempt += 1;
                std::thread::sleep(Duration::from_millis(50 * attempt));
            }
            other => return other,
        }
    }
}

fn is_busy(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::DatabaseBusy
                || err.code == rusqlite::ErrorCode::DatabaseLocked
    )
}
