use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Index backends the cleanup job removes dataset entries from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndexConfig {
    /// Vector backend holding high-quality embeddings.
    #[serde(default)]
    pub vector: VectorBackendConfig,

    /// Keyword index settings.
    #[serde(default)]
    pub keyword: KeywordIndexConfig,
}

impl IndexConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.vector.validate()
    }
}

/// Vector database backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[serde(deny_unknown_fields)]
pub enum VectorBackendConfig {
    /// No vector backend. Cleaning a high-quality dataset fails.
    #[default]
    None,

    /// Qdrant vector database.
    Qdrant {
        url: String,
        #[serde(default)]
        api_key: Option<String>,
        /// Request timeout in seconds.
        #[serde(default = "default_vector_timeout_secs")]
        timeout_secs: u64,
    },

    /// PostgreSQL with the pgvector extension.
    #[cfg(feature = "database-postgres")]
    Pgvector {
        url: String,
        #[serde(default = "default_pgvector_max_connections")]
        max_connections: u32,
    },
}

impl VectorBackendConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        match self {
            VectorBackendConfig::None => Ok(()),
            VectorBackendConfig::Qdrant { url, .. } => {
                if url.is_empty() {
                    return Err(ConfigError::Validation(
                        "Qdrant URL cannot be empty".into(),
                    ));
                }
                Ok(())
            }
            #[cfg(feature = "database-postgres")]
            VectorBackendConfig::Pgvector { url, .. } => {
                if url.is_empty() {
                    return Err(ConfigError::Validation(
                        "pgvector URL cannot be empty".into(),
                    ));
                }
                Ok(())
            }
        }
    }
}

fn default_vector_timeout_secs() -> u64 {
    30
}

#[cfg(feature = "database-postgres")]
fn default_pgvector_max_connections() -> u32 {
    5
}

/// Keyword index configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeywordIndexConfig {
    /// Clean the keyword index alongside the vector index for paragraph datasets.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for KeywordIndexConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

fn default_true() -> bool {
    true
}
