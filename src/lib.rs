//! Background cleanup for deleted knowledge-base datasets.
//!
//! When a dataset is deleted, a [`models::CleanDatasetTask`] is queued with the
//! dataset's stored configuration. [`jobs::DatasetCleanupJob`] then removes the
//! dataset's index entries, documents, segments, processing rules, query log
//! and app bindings.

pub mod config;
pub mod db;
pub mod index;
pub mod jobs;
pub mod models;
pub mod observability;
