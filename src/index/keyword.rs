//! Keyword index backend.

use std::{sync::Arc, time::Instant};

use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::{
    db::{DbResult, KeywordTableRepo},
    observability::metrics::record_index_operation,
};

/// A keyword index holding per-dataset keyword tables.
#[async_trait]
pub trait KeywordBackend: Send + Sync {
    fn name(&self) -> &'static str;

    /// Remove the whole keyword index of a dataset.
    async fn delete(&self, dataset_id: Uuid) -> DbResult<()>;

    /// Remove the given index nodes from a dataset's keyword index.
    async fn delete_by_ids(&self, dataset_id: Uuid, ids: &[String]) -> DbResult<()>;
}

/// Keyword index stored in the relational database, one table row per dataset.
pub struct DatabaseKeywordIndex {
    repo: Arc<dyn KeywordTableRepo>,
}

impl DatabaseKeywordIndex {
    pub fn new(repo: Arc<dyn KeywordTableRepo>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl KeywordBackend for DatabaseKeywordIndex {
    fn name(&self) -> &'static str {
        "database"
    }

    #[instrument(skip(self), fields(backend = "database", operation = "delete"))]
    async fn delete(&self, dataset_id: Uuid) -> DbResult<()> {
        let start = Instant::now();
        let result = self.repo.delete_by_dataset(dataset_id).await;
        let duration = start.elapsed().as_secs_f64();

        match result {
            Ok(removed) => {
                record_index_operation("keyword", "delete", "success", duration);
                info!(
                    stage = "keyword_operation_completed",
                    dataset_id = %dataset_id,
                    removed,
                    duration_ms = (duration * 1000.0) as u64,
                    "Keyword table deleted"
                );
                Ok(())
            }
            Err(e) => {
                record_index_operation("keyword", "delete", "error", duration);
                warn!(
                    stage = "keyword_operation_completed",
                    dataset_id = %dataset_id,
                    error = %e,
                    "Keyword table delete failed"
                );
                Err(e)
            }
        }
    }

    async fn delete_by_ids(&self, dataset_id: Uuid, ids: &[String]) -> DbResult<()> {
        // Keyword tables are rebuilt wholesale on re-index.
        debug!(
            dataset_id = %dataset_id,
            id_count = ids.len(),
            "Skipping keyword delete by node ids"
        );
        record_index_operation("keyword", "delete_by_ids", "skipped", 0.0);
        Ok(())
    }
}
