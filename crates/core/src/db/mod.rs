//! Relational store for ingested cities and restaurants.
//!
//! SQLite through `tokio-rusqlite`, with two tables:
//!
//! - `cities`: one row per ranked city, keyed by rank
//! - `restaurants`: one row per business id, owned by a city through `cityid`
//!
//! Both tables are rebuilt by every ingestion run. Foreign keys are enforced.

pub mod cities;
pub mod connection;
pub mod query;
pub mod restaurants;
pub mod schema;

pub use crate::Error;

pub use connection::Database;
pub use query::{Column, SqlValue, display_value};
pub use restaurants::{InsertOutcome, RankedRestaurant, RestaurantRow, render_zip};
