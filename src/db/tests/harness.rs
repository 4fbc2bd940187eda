//! Test harness for database repository testing
//!
//! Provides an in-memory SQLite database and a containerized PostgreSQL
//! database with the real migrations applied, plus helpers for seeding the rows
//! a cleanup run operates on. [`TestDatabase`] lets one test body run against
//! either backend.

use async_trait::async_trait;
#[cfg(feature = "database-sqlite")]
use chrono::Utc;
#[cfg(feature = "database-sqlite")]
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::DbPool;

/// Create an in-memory SQLite pool for testing
#[cfg(feature = "database-sqlite")]
pub async fn create_sqlite_pool() -> SqlitePool {
    sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory SQLite pool")
}

/// Run SQLite migrations on the pool
///
/// Uses the actual migration files to ensure tests match production schema
#[cfg(feature = "database-sqlite")]
pub async fn run_sqlite_migrations(pool: &SqlitePool) {
    sqlx::migrate!("./migrations_sqlx/sqlite")
        .run(pool)
        .await
        .expect("Failed to run SQLite migrations");
}

/// Create a migrated in-memory pool.
#[cfg(feature = "database-sqlite")]
pub async fn migrated_sqlite_pool() -> SqlitePool {
    let pool = create_sqlite_pool().await;
    run_sqlite_migrations(&pool).await;
    pool
}

/// IDs of the rows created by [`seed_dataset`].
#[derive(Debug, Clone)]
pub struct SeededDataset {
    pub dataset_id: Uuid,
    pub tenant_id: Uuid,
    pub document_ids: Vec<Uuid>,
    pub segment_ids: Vec<Uuid>,
}

impl SeededDataset {
    fn new() -> Self {
        Self {
            dataset_id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            document_ids: Vec::new(),
            segment_ids: Vec::new(),
        }
    }
}

/// Shape of the rows to seed for one dataset.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeedCounts {
    pub documents: usize,
    /// Segments per document.
    pub segments_per_document: usize,
    pub process_rules: usize,
    pub queries: usize,
    pub app_joins: usize,
    pub keyword_table: bool,
}

/// Row counts for one dataset across every table the cleanup touches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowCounts {
    pub documents: i64,
    pub segments: i64,
    pub process_rules: i64,
    pub queries: i64,
    pub app_joins: i64,
    pub keyword_tables: i64,
}

impl RowCounts {
    pub fn is_empty(&self) -> bool {
        *self == RowCounts::default()
    }
}

const COUNTED_TABLES: [&str; 6] = [
    "documents",
    "document_segments",
    "dataset_process_rules",
    "dataset_queries",
    "app_dataset_joins",
    "dataset_keyword_tables",
];

impl From<[i64; 6]> for RowCounts {
    fn from(counts: [i64; 6]) -> Self {
        let [documents, segments, process_rules, queries, app_joins, keyword_tables] = counts;
        Self {
            documents,
            segments,
            process_rules,
            queries,
            app_joins,
            keyword_tables,
        }
    }
}

/// A migrated database that shared test bodies seed and inspect without
/// knowing which backend they run on.
#[async_trait]
pub trait TestDatabase: Send + Sync {
    /// Pool wrapper handed to the code under test.
    fn db_pool(&self) -> DbPool;

    async fn seed_dataset(&self, counts: SeedCounts) -> SeededDataset;

    async fn insert_segment(&self, seeded: &mut SeededDataset, document_id: Uuid) -> Uuid;

    async fn count_rows(&self, dataset_id: Uuid) -> RowCounts;
}

#[cfg(feature = "database-sqlite")]
#[async_trait]
impl TestDatabase for SqlitePool {
    fn db_pool(&self) -> DbPool {
        DbPool::from_sqlite(self.clone())
    }

    async fn seed_dataset(&self, counts: SeedCounts) -> SeededDataset {
        seed_dataset(self, counts).await
    }

    async fn insert_segment(&self, seeded: &mut SeededDataset, document_id: Uuid) -> Uuid {
        insert_segment(self, seeded, document_id).await
    }

    async fn count_rows(&self, dataset_id: Uuid) -> RowCounts {
        count_rows(self, dataset_id).await
    }
}

/// Seed documents, segments and auxiliary rows for a fresh dataset.
#[cfg(feature = "database-sqlite")]
pub async fn seed_dataset(pool: &SqlitePool, counts: SeedCounts) -> SeededDataset {
    let mut seeded = SeededDataset::new();
    let dataset_id = seeded.dataset_id;

    for i in 0..counts.documents {
        let document_id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO documents (id, tenant_id, dataset_id, name, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(document_id.to_string())
        .bind(seeded.tenant_id.to_string())
        .bind(dataset_id.to_string())
        .bind(format!("doc-{i}.md"))
        .bind(Utc::now())
        .execute(pool)
        .await
        .expect("Failed to insert document");
        seeded.document_ids.push(document_id);

        for _ in 0..counts.segments_per_document {
            insert_segment(pool, &mut seeded, document_id).await;
        }
    }

    for _ in 0..counts.process_rules {
        sqlx::query("INSERT INTO dataset_process_rules (id, dataset_id, mode) VALUES (?, ?, 'custom')")
            .bind(Uuid::new_v4().to_string())
            .bind(dataset_id.to_string())
            .execute(pool)
            .await
            .expect("Failed to insert process rule");
    }

    for i in 0..counts.queries {
        sqlx::query("INSERT INTO dataset_queries (id, dataset_id, content) VALUES (?, ?, ?)")
            .bind(Uuid::new_v4().to_string())
            .bind(dataset_id.to_string())
            .bind(format!("query {i}"))
            .execute(pool)
            .await
            .expect("Failed to insert query");
    }

    for _ in 0..counts.app_joins {
        sqlx::query("INSERT INTO app_dataset_joins (id, app_id, dataset_id) VALUES (?, ?, ?)")
            .bind(Uuid::new_v4().to_string())
            .bind(Uuid::new_v4().to_string())
            .bind(dataset_id.to_string())
            .execute(pool)
            .await
            .expect("Failed to insert app join");
    }

    if counts.keyword_table {
        sqlx::query(
            "INSERT INTO dataset_keyword_tables (id, dataset_id, keyword_table) VALUES (?, ?, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(dataset_id.to_string())
        .bind(r#"{"hello": ["node-1"]}"#)
        .execute(pool)
        .await
        .expect("Failed to insert keyword table");
    }

    seeded
}

/// Add one segment under `document_id` to an already seeded dataset.
#[cfg(feature = "database-sqlite")]
pub async fn insert_segment(pool: &SqlitePool, seeded: &mut SeededDataset, document_id: Uuid) -> Uuid {
    let segment_id = Uuid::new_v4();
    let position = seeded.segment_ids.len();
    sqlx::query(
        r#"
        INSERT INTO document_segments
            (id, tenant_id, dataset_id, document_id, index_node_id, content, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(segment_id.to_string())
    .bind(seeded.tenant_id.to_string())
    .bind(seeded.dataset_id.to_string())
    .bind(document_id.to_string())
    .bind(Uuid::new_v4().to_string())
    .bind(format!("chunk {position}"))
    .bind(Utc::now())
    .execute(pool)
    .await
    .expect("Failed to insert segment");
    seeded.segment_ids.push(segment_id);
    segment_id
}

/// Count the rows referencing a dataset.
#[cfg(feature = "database-sqlite")]
pub async fn count_rows(pool: &SqlitePool, dataset_id: Uuid) -> RowCounts {
    let mut counts = [0; 6];
    for (count, table) in counts.iter_mut().zip(COUNTED_TABLES) {
        *count = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM {table} WHERE dataset_id = ?"
        ))
        .bind(dataset_id.to_string())
        .fetch_one(pool)
        .await
        .expect("Failed to count rows");
    }
    counts.into()
}

/// PostgreSQL test harness using testcontainers
#[cfg(feature = "database-postgres")]
pub mod postgres {
    use std::sync::OnceLock;

    use async_trait::async_trait;
    use sqlx::PgPool;
    use testcontainers_modules::{
        postgres::Postgres,
        testcontainers::{ContainerAsync, ImageExt, runners::AsyncRunner},
    };
    use tokio::sync::OnceCell;
    use uuid::Uuid;

    use super::{COUNTED_TABLES, RowCounts, SeedCounts, SeededDataset, TestDatabase};
    use crate::db::DbPool;

    /// Shared container state - initialized once per test run
    struct SharedContainer {
        #[allow(dead_code)] // Test infrastructure: keeps container alive
        container: ContainerAsync<Postgres>,
        connection_string: String,
    }

    /// Global shared container - lazily initialized on first use
    static SHARED_CONTAINER: OnceLock<OnceCell<SharedContainer>> = OnceLock::new();

    /// Get or initialize the shared PostgreSQL container
    async fn get_shared_container() -> &'static SharedContainer {
        let cell = SHARED_CONTAINER.get_or_init(OnceCell::new);
        cell.get_or_init(|| async {
            let container = Postgres::default()
                .with_tag("18-alpine")
                .start()
                .await
                .expect("Failed to start PostgreSQL container");

            let host = container.get_host().await.expect("Failed to get host");
            let port = container
                .get_host_port_ipv4(5432)
                .await
                .expect("Failed to get port");

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            SharedContainer {
                container,
                connection_string,
            }
        })
        .await
    }

    /// Create an isolated database schema for a single test
    ///
    /// Every test shares one container but gets its own schema, so tables
    /// created by one test (embedding tables included) never leak into another.
    pub async fn create_isolated_postgres_pool() -> PgPool {
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
            "{}?options=-c search_path={}",
            shared.connection_string, schema_name
        );

        sqlx::postgres::PgPoolOptions::new()
            .max_connections(5)
            .connect(&isolated_url)
            .await
            .expect("Failed to connect to isolated schema")
    }

    /// Run PostgreSQL migrations on the pool
    pub async fn run_postgres_migrations(pool: &PgPool) {
        sqlx::migrate!("./migrations_sqlx/postgres")
            .run(pool)
            .await
            .expect("Failed to run PostgreSQL migrations");
    }

    /// Create an isolated, migrated schema.
    pub async fn migrated_postgres_pool() -> PgPool {
        let pool = create_isolated_postgres_pool().await;
        run_postgres_migrations(&pool).await;
        pool
    }

    /// Seed documents, segments and auxiliary rows for a fresh dataset.
    pub async fn seed_dataset(pool: &PgPool, counts: SeedCounts) -> SeededDataset {
        let mut seeded = SeededDataset::new();
        let dataset_id = seeded.dataset_id;

        for i in 0..counts.documents {
            let document_id = Uuid::new_v4();
            sqlx::query(
                "INSERT INTO documents (id, tenant_id, dataset_id, name) VALUES ($1, $2, $3, $4)",
            )
            .bind(document_id)
            .bind(seeded.tenant_id)
            .bind(dataset_id)
            .bind(format!("doc-{i}.md"))
            .execute(pool)
            .await
            .expect("Failed to insert document");
            seeded.document_ids.push(document_id);

            for _ in 0..counts.segments_per_document {
                insert_segment(pool, &mut seeded, document_id).await;
            }
        }

        for _ in 0..counts.process_rules {
            sqlx::query(
                "INSERT INTO dataset_process_rules (id, dataset_id, mode) VALUES ($1, $2, 'custom')",
            )
            .bind(Uuid::new_v4())
            .bind(dataset_id)
            .execute(pool)
            .await
            .expect("Failed to insert process rule");
        }

        for i in 0..counts.queries {
            sqlx::query("INSERT INTO dataset_queries (id, dataset_id, content) VALUES ($1, $2, $3)")
                .bind(Uuid::new_v4())
                .bind(dataset_id)
                .bind(format!("query {i}"))
                .execute(pool)
                .await
                .expect("Failed to insert query");
        }

        for _ in 0..counts.app_joins {
            sqlx::query("INSERT INTO app_dataset_joins (id, app_id, dataset_id) VALUES ($1, $2, $3)")
                .bind(Uuid::new_v4())
                .bind(Uuid::new_v4())
                .bind(dataset_id)
                .execute(pool)
                .await
                .expect("Failed to insert app join");
        }

        if counts.keyword_table {
            sqlx::query(
                "INSERT INTO dataset_keyword_tables (id, dataset_id, keyword_table) VALUES ($1, $2, $3)",
            )
            .bind(Uuid::new_v4())
            .bind(dataset_id)
            .bind(r#"{"hello": ["node-1"]}"#)
            .execute(pool)
            .await
            .expect("Failed to insert keyword table");
        }

        seeded
    }

    /// Add one segment under `document_id` to an already seeded dataset.
    pub async fn insert_segment(
        pool: &PgPool,
        seeded: &mut SeededDataset,
        document_id: Uuid,
    ) -> Uuid {
        let segment_id = Uuid::new_v4();
        let position = seeded.segment_ids.len();
        sqlx::query(
            r#"
            INSERT INTO document_segments
                (id, tenant_id, dataset_id, document_id, index_node_id, content)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(segment_id)
        .bind(seeded.tenant_id)
        .bind(seeded.dataset_id)
        .bind(document_id)
        .bind(Uuid::new_v4().to_string())
        .bind(format!("chunk {position}"))
        .execute(pool)
        .await
        .expect("Failed to insert segment");
        seeded.segment_ids.push(segment_id);
        segment_id
    }

    /// Count the rows referencing a dataset.
    pub async fn count_rows(pool: &PgPool, dataset_id: Uuid) -> RowCounts {
        let mut counts = [0; 6];
        for (count, table) in counts.iter_mut().zip(COUNTED_TABLES) {
            *count = sqlx::query_scalar(&format!(
                "SELECT COUNT(*) FROM {table} WHERE dataset_id = $1"
            ))
            .bind(dataset_id)
            .fetch_one(pool)
            .await
            .expect("Failed to count rows");
        }
        counts.into()
    }

    #[async_trait]
    impl TestDatabase for PgPool {
        fn db_pool(&self) -> DbPool {
            DbPool::from_postgres(self.clone())
        }

        async fn seed_dataset(&self, counts: SeedCounts) -> SeededDataset {
            seed_dataset(self, counts).await
        }

        async fn insert_segment(&self, seeded: &mut SeededDataset, document_id: Uuid) -> Uuid {
            insert_segment(self, seeded, document_id).await
        }

        async fn count_rows(&self, dataset_id: Uuid) -> RowCounts {
            count_rows(self, dataset_id).await
        }
    }
}
