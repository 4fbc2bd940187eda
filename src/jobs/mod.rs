//! Background job infrastructure for dataset cleanup.
//!
//! - **Dataset Cleanup**: removes a deleted dataset's index entries, documents,
//!   segments and auxiliary rows.
//! - **Cleanup Queue**: bounded in-process queue feeding tasks to a single
//!   sequential worker.
//!
//! # Example
//!
//! ```toml
//! [worker]
//! queue_capacity = 1000
//! ```

mod dataset_cleanup;
mod queue;

pub use dataset_cleanup::{CleanupError, CleanupReport, DatasetCleanupJob, clean_dataset};
pub use queue::{CleanupQueue, CleanupReceiver, QueueError, start_worker};
