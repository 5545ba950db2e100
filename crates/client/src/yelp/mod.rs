//! Business search against the Yelp Fusion API.
//!
//! ### Request
//! - **Endpoint**: `https://api.yelp.com/v3/businesses/search`
//! - **Authentication**: bearer token, only needed on a cache miss.
//! - **Parameters**: `location` (city display name), `term` (default
//!   "food"), `limit` (default 50, the API maximum).
//!
//! ### Pagination
//! Only the first page is requested. The reported `total` is kept so callers
//! can tell when a city's results were cut off.

pub mod request;
pub mod response;

pub use request::{MAX_LIMIT, SearchRequest};
pub use response::{Extraction, Skipped, extract_businesses};

use forkmap_core::config::DEFAULT_SEARCH_URL;
use forkmap_core::{AppConfig, City, Error};

use crate::fetch::Fetcher;

/// Search settings shared by every city in a run.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub base_url: String,
    pub term: String,
    pub limit: u8,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { base_url: DEFAULT_SEARCH_URL.to_string(), term: "food".to_string(), limit: MAX_LIMIT }
    }
}

impl SearchConfig {
    pub fn from_app(config: &AppConfig) -> Self {
        Self {
            base_url: config.search_url.clone(),
            term: config.search_term.clone(),
            limit: u8::try_from(config.search_limit).unwrap_or(MAX_LIMIT).min(MAX_LIMIT),
        }
    }

    /// Request for one city.
    pub fn request_for(&self, city: &City) -> SearchRequest {
        SearchRequest { term: self.term.clone(), limit: self.limit, ..SearchRequest::new(city.name()) }
    }
}

/// Search businesses for one city and extract the first page.
pub async fn search_businesses(fetcher: &mut Fetcher, config: &SearchConfig, city: &City) -> Result<Extraction, Error> {
    let request = config.request_for(city);
    request.validate()?;

    tracing::debug!(rank = city.rank(), city = city.name(), "searching businesses");

    let response = fetcher.fetch_api(&config.base_url, &request.params()).await?;
    let extraction = extract_businesses(city.rank(), &response)?;

    tracing::debug!(
        rank = city.rank(),
        businesses = extraction.businesses.len(),
        skipped = extraction.skipped.len(),
        total = ?extraction.total,
        "extracted businesses"
    );

    Ok(extraction)
}
