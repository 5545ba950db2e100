//! Cache store abstraction and the `get_or_fetch` read-through helper.

use std::collections::BTreeMap;
use std::future::Future;

use async_trait::async_trait;
use serde_json::Value;

use super::fingerprint::Namespace;
use crate::Error;

/// Key/value persistence for raw upstream responses.
///
/// Writers take `&mut self`, so a store has a single writer at any time.
/// A store that is shared across tasks must be wrapped in a lock.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Look up a stored value.
    fn get(&self, fingerprint: &str) -> Option<Value>;

    /// Store a value and persist it.
    ///
    /// The in-memory entry is kept even when persisting fails.
    async fn put(&mut self, fingerprint: String, value: Value) -> Result<(), Error>;

    /// All stored fingerprints.
    fn fingerprints(&self) -> Vec<String>;

    /// Drop every entry and persist the empty store.
    async fn clear(&mut self) -> Result<(), Error>;

    /// Number of stored entries.
    fn len(&self) -> usize {
        self.fingerprints().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entry count for one namespace.
    fn count(&self, namespace: Namespace) -> usize {
        self.fingerprints()
            .iter()
            .filter(|fp| Namespace::of(fp) == Some(namespace))
            .count()
    }
}

/// Return the cached value for `fingerprint`, or run `fetch` and cache its result.
///
/// A hit performs no I/O. A miss calls `fetch` once; a successful result is
/// stored before being returned, while a failed fetch is returned as-is and
/// nothing is cached. Failing to persist the store is logged and does not
/// fail the call.
pub async fn get_or_fetch<S, F, Fut>(store: &mut S, fingerprint: &str, fetch: F) -> Result<Value, Error>
where
    S: CacheStore + ?Sized,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Value, Error>>,
{
    if let Some(hit) = store.get(fingerprint) {
        tracing::debug!(fingerprint, "cache hit");
        return Ok(hit);
    }

    tracing::debug!(fingerprint, "cache miss");
    let value = fetch().await?;

    if let Err(e) = store.put(fingerprint.to_string(), value.clone()).await {
        tracing::warn!(fingerprint, error = %e, "failed to persist cache entry");
    }

    Ok(value)
}

/// Cache store that lives only in memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryCache {
    entries: BTreeMap<String, Value>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    fn get(&self, fingerprint: &str) -> Option<Value> {
        self.entries.get(fingerprint).cloned()
    }

    async fn put(&mut self, fingerprint: String, value: Value) -> Result<(), Error> {
        self.entries.insert(fingerprint, value);
        Ok(())
    }

    fn fingerprints(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    async fn clear(&mut self) -> Result<(), Error> {
        self.entries.clear();
        Ok(())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
