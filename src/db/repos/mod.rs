mod dataset_cleanup;
mod keyword_tables;

pub use dataset_cleanup::*;
pub use keyword_tables::*;
