//! Qdrant implementation of [`VectorBackend`] over its HTTP API.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::{VectorBackend, VectorError, VectorResult, validate_collection_name};
use crate::observability::metrics::record_index_operation;

/// Payload key holding the owning dataset id on every point.
const GROUP_ID_KEY: &str = "group_id";
/// Payload key holding the index node id of a point.
const DOC_ID_KEY: &str = "metadata.doc_id";

/// Qdrant HTTP API implementation of VectorBackend.
pub struct QdrantBackend {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Debug, Serialize)]
struct DeleteByFilterRequest {
    filter: Filter,
}

#[derive(Debug, Serialize)]
struct Filter {
    must: Vec<FieldCondition>,
}

#[derive(Debug, Serialize)]
struct FieldCondition {
    key: &'static str,
    #[serde(rename = "match")]
    matcher: Match,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Match {
    Value { value: String },
    Any { any: Vec<String> },
}

impl QdrantBackend {
    /// Create a new Qdrant backend.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Qdrant server URL (e.g., "http://localhost:6333")
    /// * `api_key` - Optional API key for authentication
    /// * `timeout` - Per-request timeout
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> VectorResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| VectorError::Http(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Build a request with optional API key header.
    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.client.request(method, &url);
        if let Some(key) = &self.api_key {
            req = req.header("api-key", key);
        }
        req.header("Content-Type", "application/json")
    }

    /// Delete points in `collection` matching `filter`, waiting for the write to apply.
    async fn delete_points(
        &self,
        operation: &'static str,
        collection: &str,
        filter: DeleteByFilterRequest,
    ) -> VectorResult<()> {
        validate_collection_name(collection)?;

        let start = Instant::now();
        debug!(
            stage = "vector_operation_started",
            backend = "qdrant",
            operation,
            collection,
            "Starting vector delete operation"
        );

        let resp = self
            .request(
                reqwest::Method::POST,
                &format!("/collections/{}/points/delete", collection),
            )
            .query(&[("wait", "true")])
            .json(&filter)
            .send()
            .await;

        let duration = start.elapsed().as_secs_f64();
        let duration_ms = (duration * 1000.0) as u64;
        let resp = match resp {
            Ok(r) => r,
            Err(e) => {
                record_index_operation("qdrant", operation, "error", duration);
                warn!(
                    stage = "vector_operation_completed",
                    backend = "qdrant",
                    operation,
                    status = "error",
                    duration_ms,
                    error = %e,
                    collection,
                    "Vector delete operation failed (HTTP error)"
                );
                return Err(VectorError::Http(e.to_string()));
            }
        };

        if resp.status() == StatusCode::NOT_FOUND {
            record_index_operation("qdrant", operation, "success", duration);
            info!(
                stage = "vector_operation_completed",
                backend = "qdrant",
                operation,
                status = "success",
                duration_ms,
                collection,
                "Collection not found, nothing to delete"
            );
            return Ok(());
        }

        if !resp.status().is_success() {
            let status = resp.status();
            let error_text = resp.text().await.unwrap_or_default();
            record_index_operation("qdrant", operation, "error", duration);
            warn!(
                stage = "vector_operation_completed",
                backend = "qdrant",
                operation,
                status = "error",
                duration_ms,
                http_status = status.as_u16(),
                error = %error_text,
                collection,
                "Vector delete operation failed"
            );
            return Err(VectorError::Backend(format!(
                "Failed to delete points from {} ({}): {}",
                collection, status, error_text
            )));
        }

        record_index_operation("qdrant", operation, "success", duration);
        info!(
            stage = "vector_operation_completed",
            backend = "qdrant",
            operation,
            status = "success",
            duration_ms,
            collection,
            "Vector delete operation completed"
        );
        Ok(())
    }
}

#[async_trait]
impl VectorBackend for QdrantBackend {
    fn name(&self) -> &'static str {
        "qdrant"
    }

    #[instrument(skip(self), fields(backend = "qdrant", operation = "delete_collection"))]
    async fn delete_collection(&self, collection: &str, dataset_id: Uuid) -> VectorResult<()> {
        let filter = DeleteByFilterRequest {
            filter: Filter {
                must: vec![FieldCondition {
                    key: GROUP_ID_KEY,
                    matcher: Match::Value {
                        value: dataset_id.to_string(),
                    },
                }],
            },
        };
        self.delete_points("delete_collection", collection, filter)
            .await
    }

    #[instrument(skip(self, ids), fields(backend = "qdrant", operation = "delete_by_ids", id_count = ids.len()))]
    async fn delete_by_ids(&self, collection: &str, ids: &[String]) -> VectorResult<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let filter = DeleteByFilterRequest {
            filter: Filter {
                must: vec![FieldCondition {
                    key: DOC_ID_KEY,
                    matcher: Match::Any { any: ids.to_vec() },
                }],
            },
        };
        self.delete_points("delete_by_ids", collection, filter).await
    }
}
