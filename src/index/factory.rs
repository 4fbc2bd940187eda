use std::{collections::HashMap, sync::Arc, time::Duration};

use super::{
    IndexError, IndexProcessor, IndexResult, ParagraphIndexProcessor, ParentChildIndexProcessor,
    QaIndexProcessor,
    keyword::{DatabaseKeywordIndex, KeywordBackend},
    vector::{QdrantBackend, VectorBackend},
};
use crate::{
    config::{IndexConfig, VectorBackendConfig},
    db::DbPool,
    models::DocForm,
};

/// Registry of index processors keyed by document form.
pub struct IndexProcessorFactory {
    processors: HashMap<DocForm, Arc<dyn IndexProcessor>>,
}

impl IndexProcessorFactory {
    /// Build one processor per document form over the given backends.
    ///
    /// `keyword` is `None` when keyword cleanup is disabled.
    pub fn new(
        vector: Option<Arc<dyn VectorBackend>>,
        keyword: Option<Arc<dyn KeywordBackend>>,
    ) -> Self {
        let processors: [Arc<dyn IndexProcessor>; 3] = [
            Arc::new(ParagraphIndexProcessor::new(vector.clone(), keyword)),
            Arc::new(QaIndexProcessor::new(vector.clone())),
            Arc::new(ParentChildIndexProcessor::new(vector)),
        ];
        Self {
            processors: processors
                .into_iter()
                .map(|p| (p.doc_form(), p))
                .collect(),
        }
    }

    /// Build the factory from configuration, connecting the configured vector backend.
    pub async fn from_config(config: &IndexConfig, db: &DbPool) -> IndexResult<Self> {
        let vector: Option<Arc<dyn VectorBackend>> = match &config.vector {
            VectorBackendConfig::None => None,
            VectorBackendConfig::Qdrant {
                url,
                api_key,
                timeout_secs,
            } => Some(Arc::new(QdrantBackend::new(
                url,
                api_key.clone(),
                Duration::from_secs(*timeout_secs),
            )?)),
            #[cfg(feature = "database-postgres")]
            VectorBackendConfig::Pgvector {
                url,
                max_connections,
            } => Some(Arc::new(
                super::vector::PgvectorBackend::connect(url, *max_connections).await?,
            )),
        };

        let keyword: Option<Arc<dyn KeywordBackend>> = config
            .keyword
            .enabled
            .then(|| Arc::new(DatabaseKeywordIndex::new(db.keyword_tables())) as _);

        if let Some(v) = &vector {
            tracing::info!(backend = v.name(), "Vector backend configured");
        } else {
            tracing::info!("No vector backend configured");
        }

        Ok(Self::new(vector, keyword))
    }

    /// Resolve the processor for a raw document form tag.
    pub fn resolve(&self, doc_form: &str) -> IndexResult<Arc<dyn IndexProcessor>> {
        let form: DocForm = doc_form
            .parse()
            .map_err(|_| IndexError::UnsupportedDocForm(doc_form.to_string()))?;
        self.processors
            .get(&form)
            .cloned()
            .ok_or_else(|| IndexError::UnsupportedDocForm(doc_form.to_string()))
    }
}
