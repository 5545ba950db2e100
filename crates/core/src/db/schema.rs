//! Table definitions and recreation.
//!
//! Both tables are rebuilt from scratch on every ingestion run, so there is no
//! migration history: `ensure` creates what is missing and the `recreate_*`
//! paths drop and create.

use super::Error;
use tokio_rusqlite::Connection;

pub(crate) const CREATE_CITIES: &str = include_str!("../../sql/cities.sql");
pub(crate) const CREATE_RESTAURANTS: &str = include_str!("../../sql/restaurants.sql");

/// `restaurants` references `cities`, so it has to go first or the parent
/// drop trips the foreign key check.
pub(crate) const DROP_ALL: &str = "DROP TABLE IF EXISTS restaurants;
     DROP TABLE IF EXISTS cities;";

pub(crate) const DROP_RESTAURANTS: &str = "DROP TABLE IF EXISTS restaurants;";

/// Create any missing table. Idempotent.
pub async fn ensure(conn: &Connection) -> Result<(), Error> {
    conn.call(|conn| -> Result<(), Error> {
        conn.execute_batch(CREATE_CITIES)?;
        conn.execute_batch(CREATE_RESTAURANTS)?;
        Ok(())
    })
    .await
    .map_err(Error::from)
}
