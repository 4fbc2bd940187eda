use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Dataset, IndexingTechnique};

/// Payload queued when a dataset is deleted.
///
/// Carries the dataset's stored configuration because the dataset row itself is
/// already gone by the time the cleanup runs. Fields are taken as stored; only
/// `dataset_id` and `tenant_id` must be well formed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanDatasetTask {
    pub dataset_id: Uuid,
    pub tenant_id: Uuid,
    /// Raw indexing technique. Anything other than `high_quality` or `economy`
    /// is treated as "no vector index".
    #[serde(default)]
    pub indexing_technique: Option<String>,
    #[serde(default)]
    pub index_struct: Option<String>,
    #[serde(default)]
    pub collection_binding_id: Option<Uuid>,
    /// Raw document form tag. Resolved to a [`DocForm`](super::DocForm) only
    /// when the dataset still has documents to clean.
    pub doc_form: String,
}

impl CleanDatasetTask {
    /// Rebuild the transient dataset descriptor from the task fields.
    pub fn dataset(&self) -> Dataset {
        Dataset {
            id: self.dataset_id,
            tenant_id: self.tenant_id,
            indexing_technique: self.indexing_technique(),
            index_struct: self.index_struct.clone(),
            collection_binding_id: self.collection_binding_id,
        }
    }

    fn indexing_technique(&self) -> Option<IndexingTechnique> {
        let raw = self.indexing_technique.as_deref()?.trim();
        if raw.is_empty() {
            return None;
        }
        match raw.parse() {
            Ok(technique) => Some(technique),
            Err(_) => {
                tracing::warn!(
                    dataset_id = %self.dataset_id,
                    indexing_technique = raw,
                    "Unrecognized indexing technique, skipping vector cleanup"
                );
                None
            }
        }
    }
}
