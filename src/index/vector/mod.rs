//! Vector database backends holding high-quality dataset embeddings.
//!
//! Cleanup only ever deletes, so the trait is limited to removing a whole
//! dataset or a set of nodes from a collection.

#[cfg(feature = "database-postgres")]
mod pgvector;
mod qdrant;

use async_trait::async_trait;
#[cfg(feature = "database-postgres")]
pub use pgvector::PgvectorBackend;
pub use qdrant::QdrantBackend;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum VectorError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Invalid collection name '{0}': only ASCII letters, digits and '_' are allowed")]
    InvalidCollectionName(String),

    #[cfg(feature = "database-postgres")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type VectorResult<T> = Result<T, VectorError>;

/// A vector database that stores dataset embeddings in named collections.
#[async_trait]
pub trait VectorBackend: Send + Sync {
    /// Backend name used in logs and metric labels.
    fn name(&self) -> &'static str;

    /// Remove every entry belonging to `dataset_id` from `collection`.
    ///
    /// A collection that no longer exists counts as already clean.
    async fn delete_collection(&self, collection: &str, dataset_id: Uuid) -> VectorResult<()>;

    /// Remove only the given index nodes from `collection`.
    async fn delete_by_ids(&self, collection: &str, ids: &[String]) -> VectorResult<()>;
}

/// Reject collection names that cannot be safely interpolated into a path or identifier.
pub fn validate_collection_name(name: &str) -> VectorResult<()> {
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(VectorError::InvalidCollectionName(name.to_string()));
    }
    Ok(())
}
