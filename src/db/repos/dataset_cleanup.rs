use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    db::error::DbResult,
    models::{Document, DocumentSegment},
};

/// Repository for removing a deleted dataset's rows.
///
/// Reads go straight to the pool. Deletes are staged on a [`CleanupTransaction`]
/// so that the document, segment and auxiliary deletes land in one commit.
#[async_trait]
pub trait DatasetCleanupRepo: Send + Sync {
    /// List every document belonging to the dataset.
    async fn list_documents(&self, dataset_id: Uuid) -> DbResult<Vec<Document>>;

    /// List every segment belonging to the dataset.
    async fn list_segments(&self, dataset_id: Uuid) -> DbResult<Vec<DocumentSegment>>;

    /// Open a transaction for staging deletes.
    async fn begin(&self) -> DbResult<Box<dyn CleanupTransaction>>;
}

/// An open transaction holding the deletes of a single cleanup run.
///
/// Dropping the transaction without calling [`CleanupTransaction::commit`]
/// rolls back everything staged on it.
#[async_trait]
pub trait CleanupTransaction: Send {
    /// Delete one document row. Returns the number of rows removed (0 if it was already gone).
    async fn delete_document(&mut self, id: Uuid) -> DbResult<u64>;

    /// Delete one segment row. Returns the number of rows removed (0 if it was already gone).
    async fn delete_segment(&mut self, id: Uuid) -> DbResult<u64>;

    /// Delete all processing rules of the dataset.
    async fn delete_process_rules(&mut self, dataset_id: Uuid) -> DbResult<u64>;

    /// Delete the dataset's query log.
    async fn delete_queries(&mut self, dataset_id: Uuid) -> DbResult<u64>;

    /// Delete all app bindings of the dataset.
    async fn delete_app_joins(&mut self, dataset_id: Uuid) -> DbResult<u64>;

    /// Commit all staged deletes.
    async fn commit(self: Box<Self>) -> DbResult<()>;
}
