//! Response cache for upstream fetches.
//!
//! This module provides a persistent, fingerprint-keyed cache that sits in
//! front of every network call. It supports:
//!
//! - Order-independent request fingerprints, namespaced by source kind
//! - A JSON-file store loaded wholesale at startup and rewritten on each miss
//! - An in-memory store for tests and dry runs
//! - No expiry: entries live until the cache is cleared

pub mod file;
pub mod fingerprint;
pub mod store;

pub use crate::Error;

pub use file::JsonFileCache;
pub use fingerprint::{Namespace, fingerprint};
pub use store::{CacheStore, MemoryCache, get_or_fetch};
