//! Whole-history export and import.
//!
//! Export serializes every stored record to a JSON array, newest first.
//! Import validates the entire document before a single write happens and
//! then upserts all records in one store transaction — a structurally
//! invalid document imports nothing, and a mid-import failure also writes
//! nothing.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;
use tracing::info;

use crate::models::AnalysisItem;
use crate::repository::{HistoryStore, ImportRecord, StoreError};

/// Default name for the exported history artifact.
pub const EXPORT_FILENAME: &str = "mediasage-history.json";

/// Errors from export/import.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("invalid history document: {0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Round-trips the entire history store to and from a portable document.
pub struct TransferEngine {
    store: Arc<HistoryStore>,
}

impl TransferEngine {
    pub fn new(store: Arc<HistoryStore>) -> Self {
        Self { store }
    }

    /// Serialize the full store. Does not mutate anything.
    ///
    /// Records are emitted verbatim as stored, so fields an import brought
    /// along that this version does not model are carried through.
    pub fn export(&self) -> Result<String, TransferError> {
        let records = self.store.export_records()?;
        Ok(serde_json::to_string_pretty(&records)?)
    }

    /// Validate and upsert a previously exported document.
    ///
    /// Returns the number of upserted records. Existing items with a
    /// matching id are fully replaced; unknown ids become new items.
    pub fn import(&self, document: &str) -> Result<usize, TransferError> {
        let value: Value = serde_json::from_str(document)
            .map_err(|e| TransferError::Validation(format!("not valid JSON: {}", e)))?;
        let entries = value
            .as_array()
            .ok_or_else(|| TransferError::Validation("top level is not an array".to_string()))?;

        let mut records = Vec::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            records.push(validate_record(index, entry)?);
        }

        let imported = self.store.import_records(&records)?;
        info!("Imported {} history records", imported);
        Ok(imported)
    }
}

/// Check one document entry and prepare it for upsert.
fn validate_record(index: usize, entry: &Value) -> Result<ImportRecord, TransferError> {
    let obj = entry
        .as_object()
        .ok_or_else(|| TransferError::Validation(format!("record {}: not an object", index)))?;

    let id = obj
        .get("id")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| TransferError::Validation(format!("record {}: missing id", index)))?;

    let created_raw = obj
        .get("createdAt")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            TransferError::Validation(format!("record {}: missing createdAt", index))
        })?;
    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(created_raw)
        .map_err(|e| {
            TransferError::Validation(format!("record {}: invalid createdAt: {}", index, e))
        })?
        .with_timezone(&Utc);

    // A full parse up front keeps import all-or-nothing: a structurally
    // broken record is caught before anything is written.
    let item: AnalysisItem = serde_json::from_value(entry.clone())
        .map_err(|e| TransferError::Validation(format!("record {} ({}): {}", index, id, e)))?;

    Ok(ImportRecord {
        id: id.to_string(),
        kind: item.kind().to_string(),
        created_at,
        record: entry.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SummarizeConfig, TextItem};
    use chrono::TimeZone;

    fn store_at(dir: &tempfile::TempDir, name: &str) -> Arc<HistoryStore> {
        Arc::new(HistoryStore::open(&dir.path().join(name)).unwrap())
    }

    fn text_item(id: &str, minute: u32, title: &str) -> AnalysisItem {
        AnalysisItem::Text(TextItem {
            id: id.to_string(),
            created_at: Utc.with_ymd_and_hms(2026, 3, 1, 9, minute, 0).unwrap(),
            title: title.to_string(),
            tags: vec!["texto".to_string(), "resumen".to_string()],
            source_filename: Some("notes.txt".to_string()),
            original_content: "Hello world".to_string(),
            summary: "Saludo.".to_string(),
            config: SummarizeConfig::default(),
        })
    }

    fn image_item(id: &str, minute: u32) -> AnalysisItem {
        AnalysisItem::new_image(
            "data:image/png;base64,aGk=".to_string(),
            "Una imagen.".to_string(),
            Some(format!("img {}", id)),
            None,
            None,
        )
        .tap_set_identity(id, minute)
    }

    // Test helper: fix id and timestamp for deterministic assertions.
    trait TapIdentity {
        fn tap_set_identity(self, id: &str, minute: u32) -> AnalysisItem;
    }

    impl TapIdentity for AnalysisItem {
        fn tap_set_identity(self, id: &str, minute: u32) -> AnalysisItem {
            let at = Utc.with_ymd_and_hms(2026, 3, 1, 9, minute, 0).unwrap();
            match self {
                AnalysisItem::Text(mut t) => {
                    t.id = id.to_string();
                    t.created_at = at;
                    AnalysisItem::Text(t)
                }
                AnalysisItem::Image(mut i) => {
                    i.id = id.to_string();
                    i.created_at = at;
                    AnalysisItem::Image(i)
                }
            }
        }
    }

    #[test]
    fn test_export_import_round_trip_is_identity() {
        let dir = tempfile::tempdir().unwrap();
        let source = store_at(&dir, "source.db");
        source.insert(&text_item("t1", 1, "First")).unwrap();
        source.insert(&image_item("i1", 2)).unwrap();

        let document = TransferEngine::new(Arc::clone(&source)).export().unwrap();

        let target = store_at(&dir, "target.db");
        let imported = TransferEngine::new(Arc::clone(&target))
            .import(&document)
            .unwrap();

        assert_eq!(imported, 2);
        assert_eq!(
            target.all_by_recency().unwrap(),
            source.all_by_recency().unwrap()
        );
    }

    #[test]
    fn test_import_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_at(&dir, "history.db");
        store.insert(&text_item("t1", 1, "First")).unwrap();

        let engine = TransferEngine::new(Arc::clone(&store));
        let document = engine.export().unwrap();

        engine.import(&document).unwrap();
        let once = store.all_by_recency().unwrap();
        engine.import(&document).unwrap();
        let twice = store.all_by_recency().unwrap();

        assert_eq!(once.len(), 1);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_import_replaces_record_with_same_id() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_at(&dir, "history.db");
        store.insert(&text_item("a1", 1, "Old")).unwrap();

        let incoming = serde_json::to_string(&vec![serde_json::to_value(
            text_item("a1", 1, "New"),
        )
        .unwrap()])
        .unwrap();

        TransferEngine::new(Arc::clone(&store)).import(&incoming).unwrap();

        let items = store.all_by_recency().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title(), "New");
    }

    #[test]
    fn test_import_rejects_non_array_document() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_at(&dir, "history.db");
        let engine = TransferEngine::new(Arc::clone(&store));

        for document in ["{}", "\"history\"", "not json at all"] {
            let err = engine.import(document).unwrap_err();
            assert!(matches!(err, TransferError::Validation(_)), "{}", document);
        }
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_import_writes_nothing_when_any_record_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_at(&dir, "history.db");
        let engine = TransferEngine::new(Arc::clone(&store));

        let good = serde_json::to_value(text_item("t1", 1, "Good")).unwrap();

        // missing id
        let mut no_id = good.clone();
        no_id.as_object_mut().unwrap().remove("id");
        // unparseable timestamp
        let mut bad_ts = good.clone();
        bad_ts["createdAt"] = Value::String("yesterday".to_string());
        // missing variant payload
        let mut no_kind = good.clone();
        no_kind.as_object_mut().unwrap().remove("kind");

        for invalid in [no_id, bad_ts, no_kind] {
            let document = serde_json::to_string(&vec![good.clone(), invalid]).unwrap();
            let err = engine.import(&document).unwrap_err();
            assert!(matches!(err, TransferError::Validation(_)));
            assert_eq!(store.count().unwrap(), 0, "a prefix was committed");
        }
    }

    #[test]
    fn test_unknown_extra_fields_survive_import_and_export() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_at(&dir, "history.db");
        let engine = TransferEngine::new(Arc::clone(&store));

        let mut record = serde_json::to_value(text_item("t1", 1, "Titled")).unwrap();
        record["futureField"] = Value::String("kept".to_string());
        let document = serde_json::to_string(&vec![record]).unwrap();

        engine.import(&document).unwrap();
        let exported = engine.export().unwrap();
        let round: Vec<Value> = serde_json::from_str(&exported).unwrap();

        assert_eq!(round.len(), 1);
        assert_eq!(round[0]["futureField"], "kept");
    }

    #[test]
    fn test_export_does_not_mutate_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_at(&dir, "history.db");
        store.insert(&text_item("t1", 1, "First")).unwrap();

        let mut rx = store.subscribe();
        rx.borrow_and_update();

        TransferEngine::new(Arc::clone(&store)).export().unwrap();
        assert!(!rx.has_changed().unwrap());
        assert_eq!(store.count().unwrap(), 1);
    }
}
