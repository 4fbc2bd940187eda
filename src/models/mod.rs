mod cleanup_task;
mod dataset;
mod document;

pub use cleanup_task::*;
pub use dataset::*;
pub use document::*;
