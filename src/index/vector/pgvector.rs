//! PostgreSQL pgvector implementation of [`VectorBackend`].
//!
//! Each collection lives in its own `embedding_<collection>` table, so removing
//! a dataset drops the table outright.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::{VectorBackend, VectorResult, validate_collection_name};
use crate::observability::metrics::record_index_operation;

/// PostgreSQL pgvector implementation of VectorBackend.
pub struct PgvectorBackend {
    pool: PgPool,
}

impl PgvectorBackend {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to the pgvector database.
    pub async fn connect(url: &str, max_connections: u32) -> VectorResult<Self> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .connect(url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Table holding a collection's embeddings. Postgres folds unquoted identifiers to lowercase.
    fn table_name(collection: &str) -> VectorResult<String> {
        validate_collection_name(collection)?;
        Ok(format!("embedding_{}", collection.to_ascii_lowercase()))
    }

    fn record(&self, operation: &str, start: Instant, result: &Result<u64, sqlx::Error>, table: &str) {
        let duration = start.elapsed().as_secs_f64();
        let duration_ms = (duration * 1000.0) as u64;
        match result {
            Ok(count) => {
                record_index_operation("pgvector", operation, "success", duration);
                info!(
                    stage = "vector_operation_completed",
                    backend = "pgvector",
                    operation,
                    status = "success",
                    duration_ms,
                    item_count = count,
                    table,
                    "Vector delete operation completed"
                );
            }
            Err(e) => {
                record_index_operation("pgvector", operation, "error", duration);
                warn!(
                    stage = "vector_operation_completed",
                    backend = "pgvector",
                    operation,
                    status = "error",
                    duration_ms,
                    error = %e,
                    table,
                    "Vector delete operation failed"
                );
            }
        }
    }
}

#[async_trait]
impl VectorBackend for PgvectorBackend {
    fn name(&self) -> &'static str {
        "pgvector"
    }

    #[instrument(skip(self), fields(backend = "pgvector", operation = "delete_collection"))]
    async fn delete_collection(&self, collection: &str, dataset_id: Uuid) -> VectorResult<()> {
        let table = Self::table_name(collection)?;
        let start = Instant::now();
        debug!(
            stage = "vector_operation_started",
            backend = "pgvector",
            operation = "delete_collection",
            table = %table,
            dataset_id = %dataset_id,
            "Dropping embedding table"
        );

        let result = sqlx::query(&format!("DROP TABLE IF EXISTS {}", table))
            .execute(&self.pool)
            .await
            .map(|r| r.rows_affected());
        self.record("delete_collection", start, &result, &table);
        result?;
        Ok(())
    }

    #[instrument(skip(self, ids), fields(backend = "pgvector", operation = "delete_by_ids", id_count = ids.len()))]
    async fn delete_by_ids(&self, collection: &str, ids: &[String]) -> VectorResult<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let table = Self::table_name(collection)?;
        let start = Instant::now();

        // A missing table has nothing left to delete.
        let exists: bool = sqlx::query_scalar("SELECT to_regclass($1) IS NOT NULL")
            .bind(&table)
            .fetch_one(&self.pool)
            .await?;
        if !exists {
            debug!(table = %table, "Embedding table not found, nothing to delete");
            return Ok(());
        }

        let result = sqlx::query(&format!("DELETE FROM {} WHERE id::text = ANY($1)", table))
            .bind(ids)
            .execute(&self.pool)
            .await
            .map(|r| r.rows_affected());
        self.record("delete_by_ids", start, &result, &table);
        result?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::vector::VectorError;

    #[test]
    fn test_table_name_is_lowercased() {
        assert_eq!(
            PgvectorBackend::table_name("Vector_index_AB_12_Node").unwrap(),
            "embedding_vector_index_ab_12_node"
        );
    }

    #[test]
    fn test_table_name_rejects_injection() {
        assert!(matches!(
            PgvectorBackend::table_name("x; DROP TABLE documents"),
            Err(VectorError::InvalidCollectionName(_))
        ));
    }

    // ========================================================================
    // Tests against a live pgvector database
    // ========================================================================

    mod container {
        use std::sync::OnceLock;

        use testcontainers_modules::testcontainers::{
            ContainerAsync, GenericImage, ImageExt,
            core::{ContainerPort, WaitFor},
            runners::AsyncRunner,
        };
        use tokio::sync::OnceCell;

        use super::*;
        use crate::models::Dataset;

        /// Shared container state - initialized once per test run
        struct SharedPgvectorContainer {
            #[allow(dead_code)] // Test infrastructure: keeps container alive
            container: ContainerAsync<GenericImage>,
            connection_string: String,
        }

        static SHARED_CONTAINER: OnceLock<OnceCell<SharedPgvectorContainer>> = OnceLock::new();

        async fn get_shared_container() -> &'static SharedPgvectorContainer {
            let cell = SHARED_CONTAINER.get_or_init(OnceCell::new);
            cell.get_or_init(|| async {
                let container = GenericImage::new("pgvector/pgvector", "pg17")
                    .with_exposed_port(ContainerPort::Tcp(5432))
                    .with_wait_for(WaitFor::message_on_stderr(
                        "database system is ready to accept connections",
                    ))
                    .with_env_var("POSTGRES_USER", "postgres")
                    .with_env_var("POSTGRES_PASSWORD", "postgres")
                    .with_env_var("POSTGRES_DB", "postgres")
                    .start()
                    .await
                    .expect("Failed to start pgvector container");

                let host = container.get_host().await.expect("Failed to get host");
                let port = container
                    .get_host_port_ipv4(5432)
                    .await
                    .expect("Failed to get port");

                let connection_string =
                    format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

                let admin_pool = sqlx::postgres::PgPoolOptions::new()
                    .max_connections(1)
                    .connect(&connection_string)
                    .await
                    .expect("Failed to connect to PostgreSQL for extension setup");

                sqlx::query("CREATE EXTENSION IF NOT EXISTS vector")
                    .execute(&admin_pool)
                    .await
                    .expect("Failed to create vector extension");

                SharedPgvectorContainer {
                    container,
                    connection_string,
                }
            })
            .await
        }

        /// Pool bound to a fresh schema; `public` stays on the path for the `vector` type.
        async fn create_isolated_pgvector_pool() -> PgPool {
            let shared = get_shared_container().await;

            let admin_pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(1)
                .connect(&shared.connection_string)
                .await
                .expect("Failed to connect to PostgreSQL");

            let schema_name = format!("test_{}", Uuid::new_v4().simple());
            sqlx::query(&format!("CREATE SCHEMA \"{}\"", schema_name))
                .execute(&admin_pool)
                .await
                .expect("Failed to create test schema");

            let isolated_url = format!(
                "{}?options=-c search_path={},public",
                shared.connection_string, schema_name
            );

            sqlx::postgres::PgPoolOptions::new()
                .max_connections(5)
                .connect(&isolated_url)
                .await
                .expect("Failed to connect to isolated schema")
        }

        /// Create a collection's embedding table holding `rows` nodes and return their ids.
        async fn create_collection(pool: &PgPool, collection: &str, rows: usize) -> Vec<String> {
            let table = PgvectorBackend::table_name(collection).unwrap();
            sqlx::query(&format!(
                "CREATE TABLE {table} (id UUID PRIMARY KEY, text TEXT NOT NULL, embedding vector(3) NOT NULL)"
            ))
            .execute(pool)
            .await
            .expect("Failed to create embedding table");

            let mut ids = Vec::with_capacity(rows);
            for i in 0..rows {
                let id = Uuid::new_v4();
                sqlx::query(&format!(
                    "INSERT INTO {table} (id, text, embedding) VALUES ($1, $2, '[1, 0, 0]')"
                ))
                .bind(id)
                .bind(format!("chunk {i}"))
                .execute(pool)
                .await
                .expect("Failed to insert embedding");
                ids.push(id.to_string());
            }
            ids
        }

        async fn table_exists(pool: &PgPool, collection: &str) -> bool {
            let table = PgvectorBackend::table_name(collection).unwrap();
            sqlx::query_scalar("SELECT to_regclass($1) IS NOT NULL")
                .bind(table)
                .fetch_one(pool)
                .await
                .expect("Failed to look up table")
        }

        async fn remaining_ids(pool: &PgPool, collection: &str) -> Vec<String> {
            let table = PgvectorBackend::table_name(collection).unwrap();
            sqlx::query_scalar(&format!("SELECT id::text FROM {table} ORDER BY id::text"))
                .fetch_all(pool)
                .await
                .expect("Failed to read embedding ids")
        }

        #[tokio::test]
        #[ignore = "requires Docker"]
        async fn test_delete_collection_drops_table() {
            let pool = create_isolated_pgvector_pool().await;
            let dataset_id = Uuid::new_v4();
            let collection = Dataset::gen_collection_name_by_id(dataset_id);
            let sibling = Dataset::gen_collection_name_by_id(Uuid::new_v4());
            create_collection(&pool, &collection, 3).await;
            create_collection(&pool, &sibling, 2).await;
            let backend = PgvectorBackend::new(pool.clone());

            backend
                .delete_collection(&collection, dataset_id)
                .await
                .unwrap();

            assert!(!table_exists(&pool, &collection).await);
            assert_eq!(remaining_ids(&pool, &sibling).await.len(), 2);

            // Already gone
            backend
                .delete_collection(&collection, dataset_id)
                .await
                .unwrap();
        }

        #[tokio::test]
        #[ignore = "requires Docker"]
        async fn test_delete_by_ids_removes_only_listed_nodes() {
            let pool = create_isolated_pgvector_pool().await;
            let collection = Dataset::gen_collection_name_by_id(Uuid::new_v4());
            let ids = create_collection(&pool, &collection, 4).await;
            let backend = PgvectorBackend::new(pool.clone());

            backend
                .delete_by_ids(&collection, &ids[..2])
                .await
                .unwrap();

            let mut expected = ids[2..].to_vec();
            expected.sort();
            assert_eq!(remaining_ids(&pool, &collection).await, expected);
            assert!(table_exists(&pool, &collection).await);
        }

        #[tokio::test]
        #[ignore = "requires Docker"]
        async fn test_delete_by_ids_on_missing_table_is_ok() {
            let pool = create_isolated_pgvector_pool().await;
            let collection = Dataset::gen_collection_name_by_id(Uuid::new_v4());
            let backend = PgvectorBackend::new(pool.clone());

            backend
                .delete_by_ids(&collection, &[Uuid::new_v4().to_string()])
                .await
                .unwrap();

            assert!(!table_exists(&pool, &collection).await);
        }
    }
}
