use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

use crate::{
    db::{
        error::DbResult,
        repos::{CleanupTransaction, DatasetCleanupRepo},
    },
    models::{Document, DocumentSegment},
};

/// Cleanup repository for PostgreSQL.
///
/// Listing runs on the primary rather than a read replica: rows a lagging
/// replica has not seen yet would otherwise survive the cleanup.
pub struct PostgresDatasetCleanupRepo {
    write_pool: PgPool,
}

impl PostgresDatasetCleanupRepo {
    pub fn new(write_pool: PgPool) -> Self {
        Self { write_pool }
    }

    fn document_from_row(row: &sqlx::postgres::PgRow) -> Document {
        Document {
            id: row.get("id"),
            tenant_id: row.get("tenant_id"),
            dataset_id: row.get("dataset_id"),
            name: row.get("name"),
            created_at: row.get("created_at"),
        }
    }

    fn segment_from_row(row: &sqlx::postgres::PgRow) -> DocumentSegment {
        DocumentSegment {
            id: row.get("id"),
            tenant_id: row.get("tenant_id"),
            dataset_id: row.get("dataset_id"),
            document_id: row.get("document_id"),
            index_node_id: row.get("index_node_id"),
            created_at: row.get("created_at"),
        }
    }
}

#[async_trait]
impl DatasetCleanupRepo for PostgresDatasetCleanupRepo {
    async fn list_documents(&self, dataset_id: Uuid) -> DbResult<Vec<Document>> {
        let rows = sqlx::query(
            r#"
            SELECT id, tenant_id, dataset_id, name, created_at
            FROM documents
            WHERE dataset_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(dataset_id)
        .fetch_all(&self.write_pool)
        .await?;

        Ok(rows.iter().map(Self::document_from_row).collect())
    }

    async fn list_segments(&self, dataset_id: Uuid) -> DbResult<Vec<DocumentSegment>> {
        let rows = sqlx::query(
            r#"
            SELECT id, tenant_id, dataset_id, document_id, index_node_id, created_at
            FROM document_segments
            WHERE dataset_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(dataset_id)
        .fetch_all(&self.write_pool)
        .await?;

        Ok(rows.iter().map(Self::segment_from_row).collect())
    }

    async fn begin(&self) -> DbResult<Box<dyn CleanupTransaction>> {
        let tx = self.write_pool.begin().await?;
        Ok(Box::new(PostgresCleanupTransaction { tx }))
    }
}

pub struct PostgresCleanupTransaction {
    tx: Transaction<'static, Postgres>,
}

impl PostgresCleanupTransaction {
    async fn delete_where(&mut self, sql: &'static str, id: Uuid) -> DbResult<u64> {
        let result = sqlx::query(sql).bind(id).execute(&mut *self.tx).await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl CleanupTransaction for PostgresCleanupTransaction {
    async fn delete_document(&mut self, id: Uuid) -> DbResult<u64> {
        self.delete_where("DELETE FROM documents WHERE id = $1", id)
            .await
    }

    async fn delete_segment(&mut self, id: Uuid) -> DbResult<u64> {
        self.delete_where("DELETE FROM document_segments WHERE id = $1", id)
            .await
    }

    async fn delete_process_rules(&mut self, dataset_id: Uuid) -> DbResult<u64> {
        self.delete_where(
            "DELETE FROM dataset_process_rules WHERE dataset_id = $1",
            dataset_id,
        )
        .await
    }

    async fn delete_queries(&mut self, dataset_id: Uuid) -> DbResult<u64> {
        self.delete_where("DELETE FROM dataset_queries WHERE dataset_id = $1", dataset_id)
            .await
    }

    async fn delete_app_joins(&mut self, dataset_id: Uuid) -> DbResult<u64> {
        self.delete_where(
            "DELETE FROM app_dataset_joins WHERE dataset_id = $1",
            dataset_id,
        )
        .await
    }

    async fn commit(self: Box<Self>) -> DbResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
