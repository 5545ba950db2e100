//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (FORKMAP_*)
//! 2. TOML config file (if FORKMAP_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Ranked list of U.S. cities by population.
pub const DEFAULT_WIKI_URL: &str = "https://en.wikipedia.org/wiki/List_of_United_States_cities_by_population";

/// Yelp Fusion business search endpoint.
pub const DEFAULT_SEARCH_URL: &str = "https://api.yelp.com/v3/businesses/search";

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (FORKMAP_*)
/// 2. TOML config file (if FORKMAP_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Bearer token for the business search API.
    ///
    /// Set via FORKMAP_YELP_API_KEY environment variable.
    /// Required only when a search response is not already cached.
    #[serde(default)]
    pub yelp_api_key: Option<String>,

    /// Path to the SQLite database holding `cities` and `restaurants`.
    ///
    /// Set via FORKMAP_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Path to the JSON response cache.
    ///
    /// Set via FORKMAP_CACHE_PATH environment variable.
    #[serde(default = "default_cache_path")]
    pub cache_path: PathBuf,

    /// Page listing cities by population.
    #[serde(default = "default_wiki_url")]
    pub wiki_url: String,

    /// Business search endpoint.
    #[serde(default = "default_search_url")]
    pub search_url: String,

    /// Search term sent with every business query.
    #[serde(default = "default_search_term")]
    pub search_term: String,

    /// Page size for the business search. Only the first page is fetched.
    #[serde(default = "default_search_limit")]
    pub search_limit: u32,

    /// Number of ranked cities to ingest.
    #[serde(default = "default_city_count")]
    pub city_count: usize,

    /// Pause between parsed wiki rows, in milliseconds.
    #[serde(default = "default_scrape_row_delay_ms")]
    pub scrape_row_delay_ms: u64,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via FORKMAP_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via FORKMAP_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./forkmap.sqlite")
}

fn default_cache_path() -> PathBuf {
    PathBuf::from("./forkmap-cache.json")
}

fn default_wiki_url() -> String {
    DEFAULT_WIKI_URL.into()
}

fn default_search_url() -> String {
    DEFAULT_SEARCH_URL.into()
}

fn default_search_term() -> String {
    "food".into()
}

fn default_search_limit() -> u32 {
    50
}

fn default_city_count() -> usize {
    100
}

fn default_scrape_row_delay_ms() -> u64 {
    500
}

fn default_user_agent() -> String {
    "forkmap/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            yelp_api_key: None,
            db_path: default_db_path(),
            cache_path: default_cache_path(),
            wiki_url: default_wiki_url(),
            search_url: default_search_url(),
            search_term: default_search_term(),
            search_limit: default_search_limit(),
            city_count: default_city_count(),
            scrape_row_delay_ms: default_scrape_row_delay_ms(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Row pacing delay as Duration.
    pub fn scrape_row_delay(&self) -> Duration {
        Duration::from_millis(self.scrape_row_delay_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `FORKMAP_`
    /// 2. TOML file from `FORKMAP_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("FORKMAP_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("FORKMAP_")
                .ignore(&["config_file"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Check if the search API key is available (for deferred validation).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if the API key is not set.
    pub fn require_yelp_api_key(&self) -> Result<&str, ConfigError> {
        self.yelp_api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ConfigError::Missing {
                field: "yelp_api_key".into(),
                hint: "Set FORKMAP_YELP_API_KEY environment variable".into(),
            })
    }
}
