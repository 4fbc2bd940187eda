use std::sync::Arc;

use async_trait::async_trait;
use tracing::instrument;

use super::{IndexProcessor, IndexResult, clean_vectors};
use crate::{
    index::vector::VectorBackend,
    models::{Dataset, DocForm},
};

/// Processor for generated question/answer pairs (`qa_model`). Vector index only.
pub struct QaIndexProcessor {
    vector: Option<Arc<dyn VectorBackend>>,
}

impl QaIndexProcessor {
    pub fn new(vector: Option<Arc<dyn VectorBackend>>) -> Self {
        Self { vector }
    }
}

#[async_trait]
impl IndexProcessor for QaIndexProcessor {
    fn doc_form(&self) -> DocForm {
        DocForm::Qa
    }

    #[instrument(skip_all, fields(dataset_id = %dataset.id, doc_form = "qa_model"))]
    async fn clean(&self, dataset: &Dataset, node_ids: Option<&[String]>) -> IndexResult<()> {
        clean_vectors(self.vector.as_ref(), dataset, node_ids).await
    }
}
