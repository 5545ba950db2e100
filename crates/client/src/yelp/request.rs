//! Business search request parameters and validation.

use serde::Serialize;

use forkmap_core::Error;

/// Largest page the search endpoint returns.
pub const MAX_LIMIT: u8 = 50;

/// Query for one city's business search.
///
/// Only the first page is ever requested; see [`super::Extraction::is_truncated`].
#[derive(Debug, Clone, Serialize)]
pub struct SearchRequest {
    /// City display name sent as `location`.
    pub location: String,

    /// Search term (default "food").
    pub term: String,

    /// Page size (1-50, default 50).
    pub limit: u8,
}

impl SearchRequest {
    pub fn new(location: impl Into<String>) -> Self {
        Self { location: location.into(), term: "food".to_string(), limit: MAX_LIMIT }
    }

    /// Validate the search request parameters.
    pub fn validate(&self) -> Result<(), Error> {
        if self.location.trim().is_empty() {
            return Err(Error::InvalidInput("location cannot be empty".to_string()));
        }

        if self.term.trim().is_empty() {
            return Err(Error::InvalidInput("search term cannot be empty".to_string()));
        }

        if !(1..=MAX_LIMIT).contains(&self.limit) {
            return Err(Error::InvalidInput(format!("invalid limit {}: must be 1-{MAX_LIMIT}", self.limit)));
        }

        Ok(())
    }

    /// Query parameters in a fixed order.
    pub fn params(&self) -> Vec<(String, String)> {
        vec![
            ("location".to_string(), self.location.trim().to_string()),
            ("term".to_string(), self.term.trim().to_string()),
            ("limit".to_string(), self.limit.to_string()),
        ]
    }
}
