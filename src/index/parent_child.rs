use std::sync::Arc;

use async_trait::async_trait;
use tracing::instrument;

use super::{IndexProcessor, IndexResult, clean_vectors};
use crate::{
    index::vector::VectorBackend,
    models::{Dataset, DocForm},
};

/// Processor for parent chunks with nested child chunks (`hierarchical_model`).
///
/// Parent and child chunks share the dataset's collection, so a single vector
/// cleanup covers both.
pub struct ParentChildIndexProcessor {
    vector: Option<Arc<dyn VectorBackend>>,
}

impl ParentChildIndexProcessor {
    pub fn new(vector: Option<Arc<dyn VectorBackend>>) -> Self {
        Self { vector }
    }
}

#[async_trait]
impl IndexProcessor for ParentChildIndexProcessor {
    fn doc_form(&self) -> DocForm {
        DocForm::ParentChild
    }

    #[instrument(skip_all, fields(dataset_id = %dataset.id, doc_form = "hierarchical_model"))]
    async fn clean(&self, dataset: &Dataset, node_ids: Option<&[String]>) -> IndexResult<()> {
        clean_vectors(self.vector.as_ref(), dataset, node_ids).await
    }
}
