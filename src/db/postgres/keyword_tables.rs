use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::{error::DbResult, repos::KeywordTableRepo};

pub struct PostgresKeywordTableRepo {
    write_pool: PgPool,
}

impl PostgresKeywordTableRepo {
    pub fn new(write_pool: PgPool) -> Self {
        Self { write_pool }
    }
}

#[async_trait]
impl KeywordTableRepo for PostgresKeywordTableRepo {
    async fn delete_by_dataset(&self, dataset_id: Uuid) -> DbResult<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM dataset_keyword_tables
            WHERE dataset_id = $1
            "#,
        )
        .bind(dataset_id)
        .execute(&self.write_pool)
        .await?;

        Ok(result.rows_affected())
    }
}
