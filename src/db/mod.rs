mod error;
#[cfg(feature = "database-postgres")]
pub mod postgres;
pub mod repos;
#[cfg(feature = "database-sqlite")]
pub mod sqlite;

#[cfg(all(test, any(feature = "database-sqlite", feature = "database-postgres")))]
pub mod tests;

use std::sync::Arc;

pub use error::{DbError, DbResult};
pub use repos::*;

use crate::config::DatabaseConfig;
#[cfg(feature = "database-postgres")]
use crate::config::PostgresConfig;
#[cfg(feature = "database-sqlite")]
use crate::config::SqliteConfig;

/// Repositories built once per pool and handed out as shared trait objects.
struct CachedRepos {
    dataset_cleanup: Arc<dyn DatasetCleanupRepo>,
    keyword_tables: Arc<dyn KeywordTableRepo>,
}

enum PoolStorage {
    #[cfg(feature = "database-sqlite")]
    Sqlite(sqlx::SqlitePool),
    #[cfg(feature = "database-postgres")]
    Postgres(sqlx::PgPool),
    #[cfg(not(any(feature = "database-sqlite", feature = "database-postgres")))]
    _None(std::convert::Infallible),
}

/// Connection pool plus the repositories the cleanup job and keyword index use.
pub struct DbPool {
    inner: PoolStorage,
    repos: CachedRepos,
}

impl DbPool {
    /// Wrap an already-open SQLite pool. Tests use this with an in-memory database.
    #[cfg(feature = "database-sqlite")]
    pub fn from_sqlite(pool: sqlx::SqlitePool) -> Self {
        let repos = CachedRepos {
            dataset_cleanup: Arc::new(sqlite::SqliteDatasetCleanupRepo::new(pool.clone())),
            keyword_tables: Arc::new(sqlite::SqliteKeywordTableRepo::new(pool.clone())),
        };
        DbPool {
            inner: PoolStorage::Sqlite(pool),
            repos,
        }
    }

    /// Wrap an already-open PostgreSQL pool.
    #[cfg(feature = "database-postgres")]
    pub fn from_postgres(pool: sqlx::PgPool) -> Self {
        let repos = CachedRepos {
            dataset_cleanup: Arc::new(postgres::PostgresDatasetCleanupRepo::new(pool.clone())),
            keyword_tables: Arc::new(postgres::PostgresKeywordTableRepo::new(pool.clone())),
        };
        DbPool {
            inner: PoolStorage::Postgres(pool),
            repos,
        }
    }

    /// Open a pool for the configured database.
    pub async fn from_config(config: &DatabaseConfig) -> DbResult<Self> {
        match config {
            DatabaseConfig::None => Err(DbError::NotConfigured),
            #[cfg(feature = "database-sqlite")]
            DatabaseConfig::Sqlite(cfg) => Ok(Self::from_sqlite(connect_sqlite(cfg).await?)),
            #[cfg(feature = "database-postgres")]
            DatabaseConfig::Postgres(cfg) => Ok(Self::from_postgres(connect_postgres(cfg).await?)),
        }
    }

    /// Apply pending migrations for the dataset and keyword index tables.
    pub async fn run_migrations(&self) -> DbResult<()> {
        match &self.inner {
            #[cfg(feature = "database-sqlite")]
            PoolStorage::Sqlite(pool) => {
                tracing::info!("Running SQLite migrations");
                sqlx::migrate!("./migrations_sqlx/sqlite").run(pool).await?;
                tracing::info!("SQLite migrations completed successfully");
                Ok(())
            }
            #[cfg(feature = "database-postgres")]
            PoolStorage::Postgres(pool) => {
                tracing::info!("Running PostgreSQL migrations");
                sqlx::migrate!("./migrations_sqlx/postgres").run(pool).await?;
                tracing::info!("PostgreSQL migrations completed successfully");
                Ok(())
            }
            #[cfg(not(any(feature = "database-sqlite", feature = "database-postgres")))]
            PoolStorage::_None(infallible) => match *infallible {},
        }
    }

    /// Reads and deletes for a dataset's documents, segments and auxiliary rows.
    pub fn dataset_cleanup(&self) -> Arc<dyn DatasetCleanupRepo> {
        Arc::clone(&self.repos.dataset_cleanup)
    }

    /// Storage backing the keyword index.
    pub fn keyword_tables(&self) -> Arc<dyn KeywordTableRepo> {
        Arc::clone(&self.repos.keyword_tables)
    }

    /// Round-trip a trivial query to confirm the pool can reach the database.
    pub async fn health_check(&self) -> DbResult<()> {
        match &self.inner {
            #[cfg(feature = "database-sqlite")]
            PoolStorage::Sqlite(pool) => {
                sqlx::query("SELECT 1").execute(pool).await?;
                Ok(())
            }
            #[cfg(feature = "database-postgres")]
            PoolStorage::Postgres(pool) => {
                sqlx::query("SELECT 1").execute(pool).await?;
                Ok(())
            }
            #[cfg(not(any(feature = "database-sqlite", feature = "database-postgres")))]
            PoolStorage::_None(infallible) => match *infallible {},
        }
    }
}

#[cfg(feature = "database-sqlite")]
async fn connect_sqlite(cfg: &SqliteConfig) -> DbResult<sqlx::SqlitePool> {
    use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};

    let journal_mode = if cfg.wal_mode {
        SqliteJournalMode::Wal
    } else {
        SqliteJournalMode::Delete
    };
    let options = SqliteConnectOptions::new()
        .filename(&cfg.path)
        .create_if_missing(cfg.create_if_missing)
        .journal_mode(journal_mode)
        .busy_timeout(cfg.busy_timeout());

    tracing::debug!(path = %cfg.path, max_connections = cfg.max_connections, "Opening SQLite pool");
    Ok(SqlitePoolOptions::new()
        .max_connections(cfg.max_connections)
        .connect_with(options)
        .await?)
}

#[cfg(feature = "database-postgres")]
async fn connect_postgres(cfg: &PostgresConfig) -> DbResult<sqlx::PgPool> {
    tracing::debug!(
        min_connections = cfg.min_connections,
        max_connections = cfg.max_connections,
        "Opening PostgreSQL pool"
    );
    Ok(sqlx::postgres::PgPoolOptions::new()
        .min_connections(cfg.min_connections)
        .max_connections(cfg.max_connections)
        .acquire_timeout(cfg.connect_timeout())
        .idle_timeout(cfg.idle_timeout())
        .connect(&cfg.url)
        .await?)
}
