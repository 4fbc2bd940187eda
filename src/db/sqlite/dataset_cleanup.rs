use async_trait::async_trait;
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

use super::common::parse_uuid;
use crate::{
    db::{
        error::DbResult,
        repos::{CleanupTransaction, DatasetCleanupRepo},
    },
    models::{Document, DocumentSegment},
};

pub struct SqliteDatasetCleanupRepo {
    pool: SqlitePool,
}

impl SqliteDatasetCleanupRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn document_from_row(row: &sqlx::sqlite::SqliteRow) -> DbResult<Document> {
        Ok(Document {
            id: parse_uuid(&row.get::<String, _>("id"))?,
            tenant_id: parse_uuid(&row.get::<String, _>("tenant_id"))?,
            dataset_id: parse_uuid(&row.get::<String, _>("dataset_id"))?,
            name: row.get("name"),
            created_at: row.get("created_at"),
        })
    }

    fn segment_from_row(row: &sqlx::sqlite::SqliteRow) -> DbResult<DocumentSegment> {
        Ok(DocumentSegment {
            id: parse_uuid(&row.get::<String, _>("id"))?,
            tenant_id: parse_uuid(&row.get::<String, _>("tenant_id"))?,
            dataset_id: parse_uuid(&row.get::<String, _>("dataset_id"))?,
            document_id: parse_uuid(&row.get::<String, _>("document_id"))?,
            index_node_id: row.get("index_node_id"),
            created_at: row.get("created_at"),
        })
    }
}

#[async_trait]
impl DatasetCleanupRepo for SqliteDatasetCleanupRepo {
    async fn list_documents(&self, dataset_id: Uuid) -> DbResult<Vec<Document>> {
        let rows = sqlx::query(
            r#"
            SELECT id, tenant_id, dataset_id, name, created_at
            FROM documents
            WHERE dataset_id = ?
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(dataset_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::document_from_row).collect()
    }

    async fn list_segments(&self, dataset_id: Uuid) -> DbResult<Vec<DocumentSegment>> {
        let rows = sqlx::query(
            r#"
            SELECT id, tenant_id, dataset_id, document_id, index_node_id, created_at
            FROM document_segments
            WHERE dataset_id = ?
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(dataset_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::segment_from_row).collect()
    }

    async fn begin(&self) -> DbResult<Box<dyn CleanupTransaction>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(SqliteCleanupTransaction { tx }))
    }
}

pub struct SqliteCleanupTransaction {
    tx: Transaction<'static, Sqlite>,
}

impl SqliteCleanupTransaction {
    async fn delete_where(&mut self, sql: &'static str, id: Uuid) -> DbResult<u64> {
        let result = sqlx::query(sql)
            .bind(id.to_string())
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl CleanupTransaction for SqliteCleanupTransaction {
    async fn delete_document(&mut self, id: Uuid) -> DbResult<u64> {
        self.delete_where("DELETE FROM documents WHERE id = ?", id)
            .await
    }

    async fn delete_segment(&mut self, id: Uuid) -> DbResult<u64> {
        self.delete_where("DELETE FROM document_segments WHERE id = ?", id)
            .await
    }

    async fn delete_process_rules(&mut self, dataset_id: Uuid) -> DbResult<u64> {
        self.delete_where(
            "DELETE FROM dataset_process_rules WHERE dataset_id = ?",
            dataset_id,
        )
        .await
    }

    async fn delete_queries(&mut self, dataset_id: Uuid) -> DbResult<u64> {
        self.delete_where("DELETE FROM dataset_queries WHERE dataset_id = ?", dataset_id)
            .await
    }

    async fn delete_app_joins(&mut self, dataset_id: Uuid) -> DbResult<u64> {
        self.delete_where(
            "DELETE FROM app_dataset_joins WHERE dataset_id = ?",
            dataset_id,
        )
        .await
    }

    async fn commit(self: Box<Self>) -> DbResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
