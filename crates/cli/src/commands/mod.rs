//! Subcommand implementations.

pub mod browse;
pub mod cache;
pub mod ingest;
pub mod query;
