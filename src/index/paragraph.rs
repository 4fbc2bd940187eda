use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument};

use super::{IndexProcessor, IndexResult, clean_vectors, keyword::KeywordBackend};
use crate::{
    index::vector::VectorBackend,
    models::{Dataset, DocForm},
};

/// Processor for plain paragraph chunks (`text_model`).
///
/// Paragraph datasets may be indexed in both the vector backend and the keyword index.
pub struct ParagraphIndexProcessor {
    vector: Option<Arc<dyn VectorBackend>>,
    /// `None` when keyword cleanup is disabled.
    keyword: Option<Arc<dyn KeywordBackend>>,
}

impl ParagraphIndexProcessor {
    pub fn new(
        vector: Option<Arc<dyn VectorBackend>>,
        keyword: Option<Arc<dyn KeywordBackend>>,
    ) -> Self {
        Self { vector, keyword }
    }
}

#[async_trait]
impl IndexProcessor for ParagraphIndexProcessor {
    fn doc_form(&self) -> DocForm {
        DocForm::Paragraph
    }

    #[instrument(skip_all, fields(dataset_id = %dataset.id, doc_form = "text_model"))]
    async fn clean(&self, dataset: &Dataset, node_ids: Option<&[String]>) -> IndexResult<()> {
        clean_vectors(self.vector.as_ref(), dataset, node_ids).await?;

        let Some(keyword) = &self.keyword else {
            debug!("Keyword cleanup disabled");
            return Ok(());
        };
        match node_ids {
            Some(ids) => keyword.delete_by_ids(dataset.id, ids).await?,
            None => keyword.delete(dataset.id).await?,
        }
        Ok(())
    }
}
