//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Upper bound the business search API accepts for `limit`.
const MAX_SEARCH_LIMIT: u32 = 50;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `search_limit` is 0 or exceeds 50
    /// - `city_count` is 0 or exceeds 500
    /// - `scrape_row_delay_ms` exceeds 10 seconds
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - any URL, the search term or the user agent is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.search_limit == 0 || self.search_limit > MAX_SEARCH_LIMIT {
            return Err(invalid("search_limit", "must be between 1 and 50"));
        }

        if self.city_count == 0 {
            return Err(invalid("city_count", "must be greater than 0"));
        }
        if self.city_count > 500 {
            return Err(invalid("city_count", "must not exceed 500"));
        }

        if self.scrape_row_delay_ms > 10_000 {
            return Err(invalid("scrape_row_delay_ms", "must not exceed 10000ms"));
        }

        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        for (field, value) in [
            ("wiki_url", &self.wiki_url),
            ("search_url", &self.search_url),
            ("search_term", &self.search_term),
            ("user_agent", &self.user_agent),
        ] {
            if value.trim().is_empty() {
                return Err(invalid(field, "must not be empty"));
            }
        }

        Ok(())
    }
}
