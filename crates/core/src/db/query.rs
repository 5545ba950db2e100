//! Column-selection query over stored restaurants.
//!
//! Columns come from a closed set and are mapped to fixed SQL expressions, so
//! caller text never reaches the statement. Filter values are always bound.

use std::fmt;
use std::str::FromStr;

use tokio_rusqlite::rusqlite;

pub use tokio_rusqlite::rusqlite::types::Value as SqlValue;

use super::connection::Database;
use crate::Error;

/// A selectable or filterable restaurant column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Id,
    CityId,
    Name,
    Category,
    Rating,
    Phone,
    Latitude,
    Longitude,
    ReviewCount,
    CityName,
    StateName,
    ZipCode,
    /// Name of the ranked city whose search produced the row.
    SourceCity,
    SourceState,
}

impl Column {
    pub const ALL: [Column; 14] = [
        Column::Id,
        Column::CityId,
        Column::Name,
        Column::Category,
        Column::Rating,
        Column::Phone,
        Column::Latitude,
        Column::Longitude,
        Column::ReviewCount,
        Column::CityName,
        Column::StateName,
        Column::ZipCode,
        Column::SourceCity,
        Column::SourceState,
    ];

    /// Name accepted on input and used in output headers.
    pub fn as_str(&self) -> &'static str {
        match self {
            Column::Id => "id",
            Column::CityId => "cityid",
            Column::Name => "name",
            Column::Category => "categories",
            Column::Rating => "rating",
            Column::Phone => "phone",
            Column::Latitude => "latitude",
            Column::Longitude => "longitude",
            Column::ReviewCount => "review_count",
            Column::CityName => "cityname",
            Column::StateName => "statename",
            Column::ZipCode => "zipcode",
            Column::SourceCity => "source_city",
            Column::SourceState => "source_state",
        }
    }

    fn as_sql(&self) -> &'static str {
        match self {
            Column::Id => "r.id",
            Column::CityId => "r.cityid",
            Column::Name => "r.name",
            Column::Category => "r.categories",
            Column::Rating => "r.rating",
            Column::Phone => "r.Phone",
            Column::Latitude => "r.Latitude",
            Column::Longitude => "r.Longitude",
            Column::ReviewCount => "r.review_count",
            Column::CityName => "r.CityName",
            Column::StateName => "r.StateName",
            Column::ZipCode => "r.zipcode",
            Column::SourceCity => "c.CityName",
            Column::SourceState => "c.StateName",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Column {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Column::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                let known: Vec<_> = Column::ALL.iter().map(Column::as_str).collect();
                Error::InvalidInput(format!("unknown column '{wanted}' (expected one of: {})", known.join(", ")))
            })
    }
}

/// Render one result cell for display.
pub fn display_value(value: &SqlValue) -> String {
    match value {
        SqlValue::Null => String::new(),
        SqlValue::Integer(n) => n.to_string(),
        SqlValue::Real(f) => f.to_string(),
        SqlValue::Text(s) => s.clone(),
        SqlValue::Blob(b) => format!("<{} bytes>", b.len()),
    }
}

impl Database {
    /// Select `columns` from restaurants matching every equality filter.
    ///
    /// Rows come back ordered by restaurant id, each tuple in the order of
    /// `columns`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if no column is requested.
    pub async fn query_restaurants(
        &self, columns: &[Column], filters: &[(Column, String)],
    ) -> Result<Vec<Vec<SqlValue>>, Error> {
        if columns.is_empty() {
            return Err(Error::InvalidInput("select at least one column".into()));
        }

        let select = columns.iter().map(Column::as_sql).collect::<Vec<_>>().join(", ");
        let mut sql = format!("SELECT {select} FROM restaurants r JOIN cities c ON c.id = r.cityid");
        if !filters.is_empty() {
            let clauses: Vec<_> = filters
                .iter()
                .enumerate()
                .map(|(i, (column, _))| format!("{} = ?{}", column.as_sql(), i + 1))
                .collect();
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY r.id");

        let width = columns.len();
        let values: Vec<String> = filters.iter().map(|(_, v)| v.clone()).collect();

        tracing::debug!(sql = %sql, filters = values.len(), "running restaurant query");

        self.conn
            .call(move |conn| -> Result<Vec<Vec<SqlValue>>, Error> {
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map(rusqlite::params_from_iter(values.iter()), |row| {
                        (0..width)
                            .map(|i| row.get::<_, SqlValue>(i))
                            .collect::<rusqlite::Result<Vec<_>>>()
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(Error::from)
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
            City::new(2, "Troy", "New York", 42.0, 42.0).unwrap(),
        ])
        .await
        .unwrap();
        db.recreate_restaurants().await.unwrap();

        let rows = [("b", 1, "Bistro", 4.5), ("a", 1, "Alehouse", 3.5), ("c", 2, "Cafe", 4.5)]
            .into_iter()
            .map(|(id, city_id, name, rating)| {
                BusinessDraft {
                    id: id.into(),
                    city_id,
                    name: name.into(),
                    category: "Food".into(),
                    rating,
                    latitude: 40.0,
                    longitude: -80.0,
                    review_count: 3,
                    ..Default::default()
                }
                .validate()
                .unwrap()
            })
            .collect();
        db.insert_restaurants(rows).await.unwrap();
        db
    }

    #[test]
    fn test_column_from_str() {
        assert_eq!("Rating".parse::<Column>().unwrap(), Column::Rating);
        assert_eq!(" review_count ".parse::<Column>().unwrap(), Column::ReviewCount);
        assert!(matches!("rating; DROP TABLE cities".parse::<Column>(), Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_query_ordered_by_id() {
        let db = seeded().await;
        let rows = db.query_restaurants(&[Column::Id, Column::Name], &[]).await.unwrap();

        assert_eq!(
            rows,
            vec![
                vec![SqlValue::Text("a".into()), SqlValue::Text("Alehouse".into())],
                vec![SqlValue::Text("b".into()), SqlValue::Text("Bistro".into())],
                vec![SqlValue::Text("c".into()), SqlValue::Text("Cafe".into())],
            ]
        );
    }

    #[tokio::test]
    async fn test_query_filters_combine_with_and() {
        let db = seeded().await;
        let rows = db
            .query_restaurants(
                &[Column::Name, Column::SourceCity],
                &[(Column::Rating, "4.5".into()), (Column::SourceCity, "Springfield".into())],
            )
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(display_value(&rows[0][0]), "Bistro");
        assert_eq!(display_value(&rows[0][1]), "Springfield");
    }

    #[tokio::test]
    async fn test_query_filter_value_is_bound() {
        let db = seeded().await;
        let rows = db
            .query_restaurants(&[Column::Id], &[(Column::Name, "x' OR '1'='1".into())])
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_query_requires_columns() {
        let db = seeded().await;
        assert!(matches!(db.query_restaurants(&[], &[]).await, Err(Error::InvalidInput(_))));
    }
}
