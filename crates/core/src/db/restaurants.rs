//! Restaurant table operations.

use serde::Serialize;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::{self, types::Value};

use super::connection::Database;
use super::schema;
use crate::{Business, Error};

const SELECT_ROW: &str = "SELECT r.id, r.cityid, r.name, r.categories, r.rating, r.Phone, r.Latitude, r.Longitude,
            r.review_count, r.CityName, r.StateName, r.zipcode
     FROM restaurants r
     JOIN cities c ON c.id = r.cityid";

/// Result of one upsert-ignore batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InsertOutcome {
    pub inserted: usize,
    /// Rows skipped because their id was already stored.
    pub ignored: usize,
}

/// A stored restaurant row as read back from the table.
///
/// Every column except the key, owner and name is nullable in the schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RestaurantRow {
    pub id: String,
    pub city_id: u32,
    pub name: String,
    pub category: Option<String>,
    pub rating: Option<f64>,
    pub phone: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub review_count: Option<i64>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
}

/// One entry of a per-city ranking, 1-based.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedRestaurant {
    pub position: usize,
    #[serde(flatten)]
    pub row: RestaurantRow,
}

impl Database {
    /// Drop and recreate the restaurant table.
    pub async fn recreate_restaurants(&self) -> Result<(), Error> {
        self.conn
            .call(|conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute_batch(schema::DROP_RESTAURANTS)?;
                tx.execute_batch(schema::CREATE_RESTAURANTS)?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Insert businesses, skipping any whose id is already stored.
    ///
    /// The batch commits as one transaction. An id already owned by another
    /// city keeps its first owner; each such collision is logged. A row whose
    /// city does not exist fails the whole batch.
    pub async fn insert_restaurants(&self, businesses: Vec<Business>) -> Result<InsertOutcome, Error> {
        let (outcome, collisions) = self
            .conn
            .call(move |conn| -> Result<(InsertOutcome, Vec<(String, u32, u32)>), Error> {
                let tx = conn.transaction()?;
                let mut outcome = InsertOutcome::default();
                let mut collisions = Vec::new();

                {
                    let mut insert = tx.prepare(
                        "INSERT OR IGNORE INTO restaurants
                            (id, cityid, name, categories, rating, Phone, Latitude, Longitude,
                             review_count, CityName, StateName, zipcode)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                    )?;
                    let mut owner = tx.prepare("SELECT cityid FROM restaurants WHERE id = ?1")?;

                    for b in &businesses {
                        let zip = Some(b.zip_code()).filter(|z| !z.trim().is_empty());
                        let changed = insert.execute(params![
                            b.id(),
                            b.city_id(),
                            b.name(),
                            b.category(),
                            b.rating(),
                            b.phone(),
                            b.latitude(),
                            b.longitude(),
                            b.review_count(),
                            b.city(),
                            b.state(),
                            zip,
                        ])?;

                        if changed == 0 {
                            outcome.ignored += 1;
                            let existing: u32 = owner.query_row(params![b.id()], |row| row.get(0))?;
                            if existing != b.city_id() {
                                collisions.push((b.id().to_string(), existing, b.city_id()));
                            }
                        } else {
                            outcome.inserted += 1;
                        }
                    }
                }

                tx.commit()?;
                Ok((outcome, collisions))
            })
            .await
            .map_err(Error::from)?;

        for (id, kept, dropped) in collisions {
            tracing::warn!(id = %id, kept_city = kept, dropped_city = dropped, "restaurant id already stored for another city");
        }

        Ok(outcome)
    }

    /// Total stored restaurants.
    pub async fn count_restaurants(&self) -> Result<usize, Error> {
        self.conn
            .call(|conn| -> Result<usize, Error> {
                let count: i64 = conn.query_row("SELECT COUNT(*) FROM restaurants", [], |row| row.get(0))?;
                Ok(count as usize)
            })
            .await
            .map_err(Error::from)
    }

    /// Restaurants of one city, best rated first.
    ///
    /// Ties are broken by review count, then name. The city is matched by its
    /// stored name, ignoring ASCII case.
    pub async fn ranked_for_city(&self, city: &str, limit: Option<usize>) -> Result<Vec<RankedRestaurant>, Error> {
        let city = city.trim().to_string();
        // SQLite treats a negative LIMIT as unbounded
        let limit = limit.map_or(-1, |n| n as i64);

        let rows = self
            .conn
            .call(move |conn| -> Result<Vec<RestaurantRow>, Error> {
                let sql = format!(
                    "{SELECT_ROW}
                     WHERE c.CityName = ?1 COLLATE NOCASE
                     ORDER BY r.rating DESC, r.review_count DESC, r.name
                     LIMIT ?2"
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map(params![city, limit], read_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(Error::from)?;

        Ok(rows
            .into_iter()
            .enumerate()
            .map(|(i, row)| RankedRestaurant { position: i + 1, row })
            .collect())
    }

    /// Every stored restaurant with this name in the given city.
    ///
    /// An empty result means no match.
    pub async fn restaurant_detail(&self, city: &str, name: &str) -> Result<Vec<RestaurantRow>, Error> {
        let city = city.trim().to_string();
        let name = name.trim().to_string();

        self.conn
            .call(move |conn| -> Result<Vec<RestaurantRow>, Error> {
                let sql = format!(
                    "{SELECT_ROW}
                     WHERE c.CityName = ?1 COLLATE NOCASE AND r.name = ?2 COLLATE NOCASE
                     ORDER BY r.id"
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map(params![city, name], read_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(Error::from)
    }
}

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RestaurantRow> {
    Ok(RestaurantRow {
        id: row.get(0)?,
        city_id: row.get(1)?,
        name: row.get(2)?,
        category: row.get(3)?,
        rating: row.get(4)?,
        phone: row.get(5)?,
        latitude: row.get(6)?,
        longitude: row.get(7)?,
        review_count: row.get(8)?,
        city: row.get(9)?,
        state: row.get(10)?,
        zip_code: render_zip(row.get(11)?),
    })
}

/// Render a stored zip code.
///
/// The column has REAL affinity, so numeric codes come back as floats and
/// lose their leading zeros. Whole numbers are padded back to five digits;
/// anything SQLite kept as text is returned unchanged.
pub fn render_zip(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Integer(n) if n >= 0 => Some(format!("{n:05}")),
        Value::Integer(n) => Some(n.to_string()),
        Value::Real(f) if f.fract() == 0.0 && (0.0..1e15).contains(&f) => Some(format!("{:05}", f as i64)),
        Value::Real(f) => Some(f.to_string()),
        Value::Text(s) => Some(s),
        Value::Blob(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BusinessDraft, City};

    async fn seeded() -> Database {
        let db = Database::open_in_memory().await.unwrap();
        db.replace_cities(vec![
            City::new(1, "Springfield", "Illinois", 39.0, 39.0).unwrap(),
            City::new(2, "Columbus", "Ohio", 39.0, 39.0).unwrap(),
        ])
        .await
        .unwrap();
        db.recreate_restaurants().await.unwrap();
        db
    }

    fn business(id: &str, city_id: u32, name: &str, rating: f64, reviews: i64) -> Business {
        BusinessDraft {
            id: id.into(),
            city_id,
            name: name.into(),
            category: "Pizza".into(),
            rating,
            phone: "+15555550100".into(),
            latitude: 39.8,
            longitude: -89.6,
            review_count: reviews,
            city: "Springfield".into(),
            state: "IL".into(),
            zip_code: "02134".into(),
        }
        .validate()
        .unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_count() {
        let db = seeded().await;
        let outcome = db
            .insert_restaurants(vec![business("a", 1, "A", 4.0, 10), business("b", 1, "B", 3.0, 5)])
            .await
            .unwrap();

        assert_eq!(outcome, InsertOutcome { inserted: 2, ignored: 0 });
        assert_eq!(db.count_restaurants().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_insert_ignores_existing_id_first_city_wins() {
        let db = seeded().await;
        db.insert_restaurants(vec![business("shared", 1, "Shared", 4.0, 10)])
            .await
            .unwrap();

        let outcome = db
            .insert_restaurants(vec![business("shared", 2, "Shared", 4.0, 10), business("c", 2, "C", 2.0, 1)])
            .await
            .unwrap();

        assert_eq!(outcome, InsertOutcome { inserted: 1, ignored: 1 });
        let rows = db.restaurant_detail("Springfield", "shared").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].city_id, 1);
    }

    #[tokio::test]
    async fn test_insert_unknown_city_is_database_error() {
        let db = seeded().await;
        let result = db.insert_restaurants(vec![business("x", 9, "Nowhere", 4.0, 1)]).await;

        let err = result.unwrap_err();
        assert!(matches!(err, Error::Database(_)));
        assert!(err.is_fatal());
        assert_eq!(db.count_restaurants().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_recreate_empties_table() {
        let db = seeded().await;
        db.insert_restaurants(vec![business("a", 1, "A", 4.0, 10)]).await.unwrap();
        db.recreate_restaurants().await.unwrap();
        assert_eq!(db.count_restaurants().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_ranked_for_city_order() {
        let db = seeded().await;
        db.insert_restaurants(vec![
            business("low", 1, "Low", 2.5, 100),
            business("tie-few", 1, "Tie Few", 4.5, 10),
            business("tie-many", 1, "Tie Many", 4.5, 90),
            business("tie-b", 1, "Bravo", 4.0, 20),
            business("tie-a", 1, "Alpha", 4.0, 20),
            business("other", 2, "Elsewhere", 5.0, 500),
        ])
        .await
        .unwrap();

        let ranked = db.ranked_for_city("springfield", None).await.unwrap();
        let names: Vec<_> = ranked.iter().map(|r| r.row.name.as_str()).collect();
        assert_eq!(names, ["Tie Many", "Tie Few", "Alpha", "Bravo", "Low"]);
        assert_eq!(ranked[0].position, 1);
        assert_eq!(ranked[4].position, 5);

        let top2 = db.ranked_for_city("Springfield", Some(2)).await.unwrap();
        assert_eq!(top2.len(), 2);
    }

    #[tokio::test]
    async fn test_detail_not_found_is_empty() {
        let db = seeded().await;
        db.insert_restaurants(vec![business("a", 1, "A", 4.0, 10)]).await.unwrap();

        assert!(db.restaurant_detail("Springfield", "Missing").await.unwrap().is_empty());
        assert!(db.restaurant_detail("Columbus", "A").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_detail_restores_zip_leading_zero() {
        let db = seeded().await;
        db.insert_restaurants(vec![business("a", 1, "A", 4.0, 10)]).await.unwrap();

        let rows = db.restaurant_detail("Springfield", "a").await.unwrap();
        assert_eq!(rows[0].zip_code.as_deref(), Some("02134"));
        assert_eq!(rows[0].category.as_deref(), Some("Pizza"));
        assert_eq!(rows[0].rating, Some(4.0));
    }

    #[test]
    fn test_render_zip() {
        assert_eq!(render_zip(Value::Real(2134.0)), Some("02134".into()));
        assert_eq!(render_zip(Value::Integer(90210)), Some("90210".into()));
        assert_eq!(render_zip(Value::Text("K1A 0B1".into())), Some("K1A 0B1".into()));
        assert_eq!(render_zip(Value::Null), None);
    }
}
