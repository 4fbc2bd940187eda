use async_trait::async_trait;
use uuid::Uuid;

use crate::db::error::DbResult;

/// Repository for the per-dataset keyword index table.
#[async_trait]
pub trait KeywordTableRepo: Send + Sync {
    /// Remove the dataset's keyword table. Returns the number of rows removed.
    async fn delete_by_dataset(&self, dataset_id: Uuid) -> DbResult<u64>;
}
