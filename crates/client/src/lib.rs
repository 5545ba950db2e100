//! Client code for forkmap.
//!
//! This crate provides the cache-routed HTTP fetcher and the two extractors
//! that turn upstream responses into value types: the ranked city table and
//! the per-city business search.

pub mod fetch;
pub mod wiki;
pub mod yelp;

pub use fetch::{FetchConfig, Fetcher, HttpRequest, ReqwestTransport, Transport};
pub use wiki::extract_cities;
pub use yelp::{Extraction, SearchConfig, SearchRequest, Skipped, extract_businesses, search_businesses};
