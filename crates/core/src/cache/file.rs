//! JSON-file cache store.
//!
//! The whole map is loaded once at startup and rewritten in full after every
//! insert. Writes go to a sibling temp file that is then renamed over the
//! cache file, so a crash mid-write leaves the previous snapshot intact.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tokio::fs;

use super::store::CacheStore;
use crate::Error;

/// Cache store persisted as a single JSON object on disk.
#[derive(Debug, Clone)]
pub struct JsonFileCache {
    path: PathBuf,
    entries: BTreeMap<String, Value>,
}

impl JsonFileCache {
    /// Load the cache file at `path`.
    ///
    /// A missing, unreadable or malformed file yields an empty cache. The
    /// cache only holds re-fetchable data, so this never fails.
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();

        let entries = match fs::read_to_string(&path).await {
            Ok(contents) => match serde_json::from_str::<BTreeMap<String, Value>>(&contents) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "cache file is corrupt, starting empty");
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no cache file yet, starting empty");
                BTreeMap::new()
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "cache file unreadable, starting empty");
                BTreeMap::new()
            }
        };

        tracing::debug!(path = %path.display(), entries = entries.len(), "cache loaded");

        Self { path, entries }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rewrite the whole cache file from the in-memory map.
    pub async fn save(&self) -> Result<(), Error> {
        let bytes = serde_json::to_vec(&self.entries).map_err(|e| Error::Cache(e.to_string()))?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::Cache(format!("creating {}: {e}", parent.display())))?;
        }

        let temp_path = self.temp_path();
        fs::write(&temp_path, &bytes)
            .await
            .map_err(|e| Error::Cache(format!("writing {}: {e}", temp_path.display())))?;

        if let Err(e) = fs::rename(&temp_path, &self.path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(Error::Cache(format!("replacing {}: {e}", self.path.display())));
        }

        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".tmp");
        PathBuf::from(name)
    }
}

#[async_trait]
impl CacheStore for JsonFileCache {
    fn get(&self, fingerprint: &str) -> Option<Value> {
        self.entries.get(fingerprint).cloned()
    }

    async fn put(&mut self, fingerprint: String, value: Value) -> Result<(), Error> {
        self.entries.insert(fingerprint, value);
        self.save().await
    }

    fn fingerprints(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    async fn clear(&mut self) -> Result<(), Error> {
        self.entries.clear();
        self.save().await
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
