use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Prefix and suffix of generated vector collection names.
const COLLECTION_PREFIX: &str = "Vector_index_";
const COLLECTION_SUFFIX: &str = "_Node";

/// How a dataset's content was embedded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexingTechnique {
    /// Embedded into a vector backend.
    HighQuality,
    /// Keyword index only.
    Economy,
}

impl std::str::FromStr for IndexingTechnique {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high_quality" => Ok(IndexingTechnique::HighQuality),
            "economy" => Ok(IndexingTechnique::Economy),
            _ => Err(format!("Invalid indexing technique: {}", s)),
        }
    }
}

/// How a dataset's documents were chunked, which selects the index processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocForm {
    /// Plain paragraph chunks.
    #[serde(rename = "text_model")]
    Paragraph,
    /// Generated question/answer pairs.
    #[serde(rename = "qa_model")]
    Qa,
    /// Parent chunks with nested child chunks.
    #[serde(rename = "hierarchical_model")]
    ParentChild,
}

impl DocForm {
    pub const ALL: [DocForm; 3] = [DocForm::Paragraph, DocForm::Qa, DocForm::ParentChild];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocForm::Paragraph => "text_model",
            DocForm::Qa => "qa_model",
            DocForm::ParentChild => "hierarchical_model",
        }
    }
}

impl std::fmt::Display for DocForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DocForm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DocForm::ALL
            .into_iter()
            .find(|form| form.as_str() == s)
            .ok_or_else(|| format!("Invalid document form: {}", s))
    }
}

/// Vector store section of a serialized index structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStructVectorStore {
    #[serde(default)]
    pub class_prefix: Option<String>,
}

/// Parsed form of the `index_struct` column.
///
/// Example: `{"type": "qdrant", "vector_store": {"class_prefix": "Vector_index_abc_Node"}}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStruct {
    #[serde(rename = "type", default)]
    pub backend: Option<String>,
    #[serde(default)]
    pub vector_store: Option<IndexStructVectorStore>,
}

/// In-memory descriptor of a dataset, rebuilt from the fields captured when it was deleted.
///
/// Never read from or written to the database. It only carries enough
/// configuration for the index processors to find the dataset's index entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub indexing_technique: Option<IndexingTechnique>,
    /// Serialized [`IndexStruct`] JSON, as stored on the dataset row.
    pub index_struct: Option<String>,
    pub collection_binding_id: Option<Uuid>,
}

impl Dataset {
    pub fn is_high_quality(&self) -> bool {
        self.indexing_technique == Some(IndexingTechnique::HighQuality)
    }

    /// Parse the serialized index structure.
    ///
    /// Returns `None` when absent or not valid JSON; callers fall back to the
    /// generated collection name in that case.
    pub fn index_struct(&self) -> Option<IndexStruct> {
        let raw = self.index_struct.as_deref()?;
        match serde_json::from_str(raw) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::warn!(
                    dataset_id = %self.id,
                    error = %e,
                    "Ignoring unparseable index struct"
                );
                None
            }
        }
    }

    /// Name of the vector collection holding this dataset's embeddings.
    pub fn collection_name(&self) -> String {
        self.index_struct()
            .and_then(|s| s.vector_store)
            .and_then(|v| v.class_prefix)
            .filter(|prefix| !prefix.is_empty())
            .unwrap_or_else(|| Self::gen_collection_name_by_id(self.id))
    }

    /// Generated collection name for a dataset without an explicit class prefix.
    pub fn gen_collection_name_by_id(id: Uuid) -> String {
        let normalized = id.to_string().replace('-', "_");
        format!("{COLLECTION_PREFIX}{normalized}{COLLECTION_SUFFIX}")
    }
}
