//! Core types and shared functionality for forkmap.
//!
//! This crate provides:
//! - Unified error types
//! - Layered configuration
//! - Validated City and Business value types
//! - The response cache (fingerprints, JSON-file and in-memory stores)
//! - The SQLite relational store

pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod model;

pub use cache::{CacheStore, JsonFileCache, MemoryCache, Namespace, fingerprint, get_or_fetch};
pub use config::{AppConfig, ConfigError};
pub use db::{Column, Database, InsertOutcome, RankedRestaurant, RestaurantRow, SqlValue};
pub use error::Error;
pub use model::{Business, BusinessDraft, City, SkipReason};
