//! City table operations.

use super::connection::Database;
use super::schema;
use crate::{City, Error};
use tokio_rusqlite::params;

impl Database {
    /// Drop and recreate the city table, then insert every city in rank order.
    ///
    /// The restaurant table is dropped along with it; callers recreate it
    /// before inserting businesses. Runs in one transaction, so a failure
    /// leaves the previous tables untouched.
    pub async fn replace_cities(&self, cities: Vec<City>) -> Result<usize, Error> {
        self.conn
            .call(move |conn| -> Result<usize, Error> {
                let tx = conn.transaction()?;
                tx.execute_batch(schema::DROP_ALL)?;
                tx.execute_batch(schema::CREATE_CITIES)?;

                {
                    let mut stmt = tx.prepare(
                        "INSERT INTO cities (id, CityName, StateName, Latitude, Longitude)
                         VALUES (?1, ?2, ?3, ?4, ?5)",
                    )?;
                    for city in &cities {
                        stmt.execute(params![
                            city.rank(),
                            city.name(),
                            city.state(),
                            city.latitude(),
                            city.longitude(),
                        ])?;
                    }
                }

                tx.commit()?;
                Ok(cities.len())
            })
            .await
            .map_err(Error::from)
    }

    /// All stored cities in rank order.
    pub async fn list_cities(&self) -> Result<Vec<City>, Error> {
        let rows = self
            .conn
            .call(|conn| -> Result<Vec<(u32, String, String, f64, f64)>, Error> {
                let mut stmt =
                    conn.prepare("SELECT id, CityName, StateName, Latitude, Longitude FROM cities ORDER BY id")?;
                let rows = stmt
                    .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?)))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(Error::from)?;

        rows.into_iter()
            .map(|(rank, name, state, lat, lon)| City::new(rank, name, state, lat, lon))
            .collect()
    }

    /// Look up a stored city by its display name.
    pub async fn find_city(&self, name: &str) -> Result<Option<City>, Error> {
        let name = name.trim().to_string();
        let cities = self.list_cities().await?;
        Ok(cities.into_iter().find(|c| c.name().eq_ignore_ascii_case(&name)))
    }
}
