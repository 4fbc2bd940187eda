//! Index processors that remove a dataset's entries from search backends.
//!
//! Each document form has its own processor. The [`IndexProcessorFactory`]
//! resolves the processor for a raw document form tag.

mod factory;
pub mod keyword;
mod paragraph;
mod parent_child;
mod qa;
pub mod vector;

use std::sync::Arc;

use async_trait::async_trait;
pub use factory::IndexProcessorFactory;
pub use paragraph::ParagraphIndexProcessor;
pub use parent_child::ParentChildIndexProcessor;
pub use qa::QaIndexProcessor;
use thiserror::Error;

use crate::{
    db::DbError,
    index::vector::{VectorBackend, VectorError},
    models::{Dataset, DocForm},
};

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("Unsupported document form: {0}")]
    UnsupportedDocForm(String),

    #[error("Dataset is high quality but no vector backend is configured")]
    VectorBackendNotConfigured,

    #[error("Vector backend error: {0}")]
    Vector(#[from] VectorError),

    #[error("Keyword index error: {0}")]
    Keyword(#[from] DbError),
}

pub type IndexResult<T> = Result<T, IndexError>;

/// Removes a dataset's entries from the index backends used by one document form.
#[async_trait]
pub trait IndexProcessor: Send + Sync {
    fn doc_form(&self) -> DocForm;

    /// Remove index entries for `dataset`.
    ///
    /// `node_ids` limits the cleanup to those index nodes; `None` removes
    /// everything belonging to the dataset. Must tolerate a dataset with
    /// nothing left to clean.
    async fn clean(&self, dataset: &Dataset, node_ids: Option<&[String]>) -> IndexResult<()>;
}

/// Vector cleanup shared by every processor. Only high-quality datasets have embeddings.
async fn clean_vectors(
    vector: Option<&Arc<dyn VectorBackend>>,
    dataset: &Dataset,
    node_ids: Option<&[String]>,
) -> IndexResult<()> {
    if !dataset.is_high_quality() {
        return Ok(());
    }
    let vector = vector.ok_or(IndexError::VectorBackendNotConfigured)?;
    let collection = dataset.collection_name();

    match node_ids {
        Some(ids) => vector.delete_by_ids(&collection, ids).await?,
        None => vector.delete_collection(&collection, dataset.id).await?,
    }
    Ok(())
}
