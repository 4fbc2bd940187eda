//! Shared database repository test infrastructure
//!
//! Repository tests run against an in-memory SQLite database and, with Docker
//! available, a PostgreSQL container, both migrated with the real migration
//! files. `harness` also holds the seeding helpers used by the job tests.

pub mod harness;
