mod dataset_cleanup;
mod keyword_tables;

pub use dataset_cleanup::PostgresDatasetCleanupRepo;
pub use keyword_tables::PostgresKeywordTableRepo;
