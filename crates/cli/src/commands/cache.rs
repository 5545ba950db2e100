//! `forkmap cache stats|clear`.

use anyhow::Result;

use forkmap_core::{AppConfig, CacheStore, JsonFileCache, Namespace};

pub async fn stats(config: &AppConfig) {
    let cache = JsonFileCache::load(&config.cache_path).await;

    println!("cache file: {}", cache.path().display());
    for namespace in Namespace::ALL {
        println!("{:>6}: {}", namespace.prefix(), cache.count(namespace));
    }
    println!("{:>6}: {}", "total", cache.len());
}

pub async fn clear(config: &AppConfig) -> Result<()> {
    let mut cache = JsonFileCache::load(&config.cache_path).await;
    let removed = cache.len();
    cache.clear().await?;

    tracing::info!(path = %cache.path().display(), removed, "cache cleared");
    println!("removed {removed} entries from {}", cache.path().display());

    Ok(())
}
