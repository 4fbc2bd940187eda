use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::{error::DbResult, repos::KeywordTableRepo};

pub struct SqliteKeywordTableRepo {
    pool: SqlitePool,
}

impl SqliteKeywordTableRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl KeywordTableRepo for SqliteKeywordTableRepo {
    async fn delete_by_dataset(&self, dataset_id: Uuid) -> DbResult<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM dataset_keyword_tables
            WHERE dataset_id = ?
            "#,
        )
        .bind(dataset_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
