mod common;
mod dataset_cleanup;
mod keyword_tables;

pub use dataset_cleanup::SqliteDatasetCleanupRepo;
pub use keyword_tables::SqliteKeywordTableRepo;
