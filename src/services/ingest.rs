//! Ingestion pipeline: classify, extract, analyze, store.
//!
//! One invocation handles one upload. Any failure is terminal for that
//! attempt — nothing partial is stored and the caller simply retries.
//! Refinement and metadata edits also live here; both hold the store's
//! per-id claim for their whole span so a second mutation of the same item
//! cannot start mid-flight.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::ingest::{classify, extract, ExtractedContent, ExtractionError, FileKind};
use crate::llm::{AnalysisClient, AnalysisError};
use crate::models::{AnalysisItem, ItemPatch, SummarizeConfig};
use crate::repository::{HistoryStore, StoreError};

/// Errors that can occur during ingestion.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("{filename}: rejected ({reason})")]
    Rejected { filename: String, reason: String },

    #[error("{filename}: extraction failed: {source}")]
    Extraction {
        filename: String,
        #[source]
        source: ExtractionError,
    },

    #[error("analysis call failed: {0}")]
    Analysis(#[from] AnalysisError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// One upload to run through the pipeline.
#[derive(Debug)]
pub struct IngestRequest<'a> {
    pub filename: &'a str,
    pub mime_type: &'a str,
    pub bytes: &'a [u8],
    pub title: Option<String>,
    pub tags: Option<Vec<String>>,
    pub config: SummarizeConfig,
}

/// Service that turns uploads into stored analysis items.
pub struct IngestService {
    store: Arc<HistoryStore>,
    client: Arc<AnalysisClient>,
}

impl IngestService {
    pub fn new(store: Arc<HistoryStore>, client: Arc<AnalysisClient>) -> Self {
        Self { store, client }
    }

    /// Run a file through the full pipeline and store the result.
    pub async fn ingest(&self, request: IngestRequest<'_>) -> Result<AnalysisItem, IngestError> {
        let kind = classify(request.mime_type, request.filename);
        if let FileKind::Unsupported(reason) = &kind {
            return Err(IngestError::Rejected {
                filename: request.filename.to_string(),
                reason: reason.clone(),
            });
        }

        let content =
            extract(&kind, request.mime_type, request.bytes).map_err(|source| {
                IngestError::Extraction {
                    filename: request.filename.to_string(),
                    source,
                }
            })?;

        let item = match content {
            ExtractedContent::Text(text) => {
                let summary = self.client.summarize(&text, &request.config).await?;
                AnalysisItem::new_text(
                    text,
                    summary,
                    request.config,
                    request.title,
                    request.tags,
                    Some(request.filename.to_string()),
                )
            }
            ExtractedContent::ImageDataUri(data_uri) => {
                let description = self.client.describe_image(&data_uri).await?;
                AnalysisItem::new_image(
                    data_uri,
                    description,
                    request.title,
                    request.tags,
                    Some(request.filename.to_string()),
                )
            }
        };

        self.store.insert(&item)?;
        info!("Ingested {} as {} item {}", request.filename, item.kind(), item.id());
        Ok(item)
    }

    /// Summarize pasted text directly, skipping classification.
    pub async fn ingest_text(
        &self,
        text: String,
        config: SummarizeConfig,
        title: Option<String>,
        tags: Option<Vec<String>>,
    ) -> Result<AnalysisItem, IngestError> {
        let summary = self.client.summarize(&text, &config).await?;
        let item = AnalysisItem::new_text(text, summary, config, title, tags, None);
        self.store.insert(&item)?;
        info!("Ingested pasted text as item {}", item.id());
        Ok(item)
    }

    /// Rewrite an item's summary or description from user feedback.
    pub async fn refine(
        &self,
        id: &str,
        feedback: &str,
        instructions: &str,
    ) -> Result<AnalysisItem, IngestError> {
        let _claim = self.store.claim(id)?;

        let item = self
            .store
            .get(id)?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        let refined = match &item {
            AnalysisItem::Text(t) => {
                self.client
                    .refine(&t.original_content, &t.summary, feedback, instructions)
                    .await?
            }
            // Images have no extractable source text; the current
            // description is all the context the refinement gets.
            AnalysisItem::Image(i) => {
                self.client
                    .refine("", &i.description, feedback, instructions)
                    .await?
            }
        };

        let patch = match &item {
            AnalysisItem::Text(_) => ItemPatch {
                summary: Some(refined),
                ..Default::default()
            },
            AnalysisItem::Image(_) => ItemPatch {
                description: Some(refined),
                ..Default::default()
            },
        };

        Ok(self.store.update(id, &patch)?)
    }

    /// Edit an item's title and/or tags.
    pub fn edit(
        &self,
        id: &str,
        title: Option<String>,
        tags: Option<Vec<String>>,
    ) -> Result<AnalysisItem, IngestError> {
        let _claim = self.store.claim(id)?;
        Ok(self.store.update(
            id,
            &ItemPatch {
                title,
                tags,
                ..Default::default()
            },
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> (tempfile::TempDir, IngestService) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(HistoryStore::open(&dir.path().join("history.db")).unwrap());
        let client = Arc::new(AnalysisClient::new(crate::llm::LlmConfig::default()));
        (dir, IngestService::new(store, client))
    }

    #[tokio::test]
    async fn test_unsupported_upload_is_rejected_before_extraction() {
        let (_dir, service) = service();
        let err = service
            .ingest(IngestRequest {
                filename: "report.doc",
                mime_type: "application/msword",
                bytes: b"irrelevant",
                title: None,
                tags: None,
                config: SummarizeConfig::default(),
            })
            .await
            .unwrap_err();

        match err {
            IngestError::Rejected { filename, reason } => {
                assert_eq!(filename, "report.doc");
                assert!(reason.contains("legacy format"));
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_extraction_failure_names_the_file() {
        let (_dir, service) = service();
        let err = service
            .ingest(IngestRequest {
                filename: "broken.pdf",
                mime_type: "application/pdf",
                bytes: b"not a pdf",
                title: None,
                tags: None,
                config: SummarizeConfig::default(),
            })
            .await
            .unwrap_err();

        match err {
            IngestError::Extraction { filename, .. } => assert_eq!(filename, "broken.pdf"),
            other => panic!("expected extraction failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_refine_missing_item_is_not_found() {
        let (_dir, service) = service();
        let err = service.refine("ghost", "more detail", "").await.unwrap_err();
        assert!(matches!(err, IngestError::Store(StoreError::NotFound(_))));
    }
}
