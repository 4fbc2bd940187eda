//! Cleanup of everything a deleted dataset leaves behind.
//!
//! A run removes, in order:
//! 1. The dataset's index entries, through the processor for its document form
//!    (only when documents remain)
//! 2. The document and segment rows
//! 3. The processing rules, query log and app bindings of the dataset
//!
//! Steps 2 and 3 share one transaction. Index cleanup happens first, so a
//! failure there leaves every row in place.

use std::{sync::Arc, time::Instant};

use thiserror::Error;

use crate::{
    db::{DatasetCleanupRepo, DbError, DbPool},
    index::{IndexError, IndexProcessorFactory},
    models::CleanDatasetTask,
    observability::metrics,
};

/// Results from a single cleanup run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CleanupReport {
    /// Number of document rows deleted.
    pub documents_deleted: u64,
    /// Number of segment rows deleted.
    pub segments_deleted: u64,
    /// Number of processing rule rows deleted.
    pub process_rules_deleted: u64,
    /// Number of query log rows deleted.
    pub queries_deleted: u64,
    /// Number of app binding rows deleted.
    pub app_joins_deleted: u64,
    /// Whether the index processor was asked to clean up.
    pub index_cleaned: bool,
    /// Duration of the cleanup run in milliseconds.
    pub duration_ms: u64,
}

impl CleanupReport {
    /// Check if any records were deleted.
    pub fn has_deletions(&self) -> bool {
        self.documents_deleted > 0
            || self.segments_deleted > 0
            || self.process_rules_deleted > 0
            || self.queries_deleted > 0
            || self.app_joins_deleted > 0
    }
}

#[derive(Debug, Error)]
pub enum CleanupError {
    #[error("Index cleanup failed: {0}")]
    Index(#[from] IndexError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

impl CleanupError {
    /// Stable tag for logs and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            CleanupError::Index(IndexError::UnsupportedDocForm(_)) => "unsupported_doc_form",
            CleanupError::Index(IndexError::VectorBackendNotConfigured) => {
                "vector_backend_not_configured"
            }
            CleanupError::Index(IndexError::Vector(_) | IndexError::Keyword(_)) => {
                "index_backend"
            }
            CleanupError::Database(_) => "database",
        }
    }
}

/// Run one cleanup for the dataset described by `task`.
///
/// Safe to repeat: a dataset that was already cleaned has no documents, so the
/// second run skips the index and deletes nothing.
pub async fn clean_dataset(
    repo: &dyn DatasetCleanupRepo,
    processors: &IndexProcessorFactory,
    task: &CleanDatasetTask,
) -> Result<CleanupReport, CleanupError> {
    let start = Instant::now();
    let mut report = CleanupReport::default();
    let dataset = task.dataset();

    let documents = repo.list_documents(dataset.id).await?;
    let segments = repo.list_segments(dataset.id).await?;

    if documents.is_empty() {
        tracing::info!(dataset_id = %dataset.id, "No documents found for dataset");
    } else {
        let processor = processors.resolve(&task.doc_form)?;
        processor.clean(&dataset, None).await?;
        report.index_cleaned = true;
    }

    let mut tx = repo.begin().await?;

    if !documents.is_empty() {
        for document in &documents {
            report.documents_deleted += tx.delete_document(document.id).await?;
        }
        for segment in &segments {
            report.segments_deleted += tx.delete_segment(segment.id).await?;
        }
    }

    report.process_rules_deleted = tx.delete_process_rules(dataset.id).await?;
    report.queries_deleted = tx.delete_queries(dataset.id).await?;
    report.app_joins_deleted = tx.delete_app_joins(dataset.id).await?;

    tx.commit().await?;

    report.duration_ms = start.elapsed().as_millis() as u64;
    Ok(report)
}

/// Queue-invoked cleanup job with logging and metrics around [`clean_dataset`].
pub struct DatasetCleanupJob {
    repo: Arc<dyn DatasetCleanupRepo>,
    processors: Arc<IndexProcessorFactory>,
}

impl DatasetCleanupJob {
    pub fn new(db: &DbPool, processors: Arc<IndexProcessorFactory>) -> Self {
        Self {
            repo: db.dataset_cleanup(),
            processors,
        }
    }

    /// Run a cleanup task.
    ///
    /// Failures are logged and counted but never raised; the result is only
    /// returned for inspection.
    pub async fn execute(&self, task: &CleanDatasetTask) -> Result<CleanupReport, CleanupError> {
        let start = Instant::now();
        tracing::info!(
            dataset_id = %task.dataset_id,
            tenant_id = %task.tenant_id,
            doc_form = %task.doc_form,
            "Start clean dataset when dataset deleted"
        );

        let result = clean_dataset(self.repo.as_ref(), &self.processors, task).await;
        let duration = start.elapsed().as_secs_f64();

        match &result {
            Ok(report) if !report.has_deletions() => {
                metrics::record_cleanup_run("success", duration);
                tracing::info!(
                    dataset_id = %task.dataset_id,
                    index_cleaned = report.index_cleaned,
                    duration_ms = report.duration_ms,
                    "Cleaned dataset when dataset deleted: nothing left to delete"
                );
            }
            Ok(report) => {
                metrics::record_cleanup_run("success", duration);
                metrics::record_cleanup_deletions("documents", report.documents_deleted);
                metrics::record_cleanup_deletions("segments", report.segments_deleted);
                metrics::record_cleanup_deletions("process_rules", report.process_rules_deleted);
                metrics::record_cleanup_deletions("queries", report.queries_deleted);
                metrics::record_cleanup_deletions("app_joins", report.app_joins_deleted);
                tracing::info!(
                    dataset_id = %task.dataset_id,
                    documents = report.documents_deleted,
                    segments = report.segments_deleted,
                    process_rules = report.process_rules_deleted,
                    queries = report.queries_deleted,
                    app_joins = report.app_joins_deleted,
                    index_cleaned = report.index_cleaned,
                    duration_ms = report.duration_ms,
                    "Cleaned dataset when dataset deleted"
                );
            }
            Err(e) => {
                metrics::record_cleanup_run("error", duration);
                metrics::record_cleanup_error(e.kind());
                tracing::error!(
                    dataset_id = %task.dataset_id,
                    doc_form = %task.doc_form,
                    kind = e.kind(),
                    error = %e,
                    error_detail = ?e,
                    duration_ms = (duration * 1000.0) as u64,
                    "Cleaned dataset when dataset deleted failed"
                );
            }
        }

        result
    }
}
