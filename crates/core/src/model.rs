//! Validated value types for the two ingested entities.
//!
//! Both types keep their fields private: the only way to obtain one is
//! through a constructor that checks every field, so anything handed to the
//! relational store is already well-formed.

use serde::Serialize;

use crate::Error;

/// One ranked city from the population list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct City {
    rank: u32,
    name: String,
    state: String,
    latitude: f64,
    longitude: f64,
}

impl City {
    /// Build a city record.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if the rank is 0, the name or state is
    /// blank, or a coordinate is not finite.
    pub fn new(
        rank: u32, name: impl Into<String>, state: impl Into<String>, latitude: f64, longitude: f64,
    ) -> Result<Self, Error> {
        let name = name.into().trim().to_string();
        let state = state.into().trim().to_string();

        if rank == 0 {
            return Err(Error::InvalidInput("city rank starts at 1".into()));
        }
        if name.is_empty() {
            return Err(Error::InvalidInput(format!("city #{rank} has an empty name")));
        }
        if state.is_empty() {
            return Err(Error::InvalidInput(format!("city #{rank} ({name}) has an empty state")));
        }
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(Error::InvalidInput(format!("city #{rank} ({name}) has non-finite coordinates")));
        }

        Ok(Self { rank, name, state, latitude, longitude })
    }

    pub fn rank(&self) -> u32 {
        self.rank
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

/// Why a single business record was left out of an extraction pass.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SkipReason {
    /// The id already appeared earlier in the same response.
    #[error("duplicate id {0}")]
    DuplicateId(String),

    /// A required field is absent or null.
    #[error("missing field `{0}`")]
    MissingField(&'static str),

    /// The record carries an empty categories list.
    #[error("no categories")]
    NoCategories,

    /// A field is present but unusable.
    #[error("invalid `{field}`: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Unvalidated business fields as read from the search response.
#[derive(Debug, Clone, Default)]
pub struct BusinessDraft {
    pub id: String,
    pub city_id: u32,
    pub name: String,
    pub category: String,
    pub rating: f64,
    pub phone: String,
    pub latitude: f64,
    pub longitude: f64,
    pub review_count: i64,
    pub city: String,
    pub state: String,
    pub zip_code: String,
}

impl BusinessDraft {
    /// Check every field and freeze the draft into a [`Business`].
    pub fn validate(self) -> Result<Business, SkipReason> {
        fn non_blank(field: &'static str, value: &str) -> Result<(), SkipReason> {
            if value.trim().is_empty() {
                return Err(SkipReason::InvalidValue { field, reason: "blank".into() });
            }
            Ok(())
        }

        non_blank("id", &self.id)?;
        non_blank("name", &self.name)?;
        non_blank("categories[0].title", &self.category)?;

        if self.city_id == 0 {
            return Err(SkipReason::InvalidValue { field: "cityid", reason: "city ranks start at 1".into() });
        }
        if !(0.0..=5.0).contains(&self.rating) {
            return Err(SkipReason::InvalidValue { field: "rating", reason: format!("{} outside 0..=5", self.rating) });
        }
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(SkipReason::InvalidValue {
                field: "coordinates.latitude",
                reason: format!("{} outside -90..=90", self.latitude),
            });
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(SkipReason::InvalidValue {
                field: "coordinates.longitude",
                reason: format!("{} outside -180..=180", self.longitude),
            });
        }
        if self.review_count < 0 {
            return Err(SkipReason::InvalidValue { field: "review_count", reason: "negative".into() });
        }

        Ok(Business {
            id: self.id,
            city_id: self.city_id,
            name: self.name.trim().to_string(),
            category: self.category,
            rating: self.rating,
            phone: self.phone,
            latitude: self.latitude,
            longitude: self.longitude,
            review_count: self.review_count,
            city: self.city,
            state: self.state,
            zip_code: self.zip_code,
        })
    }
}

/// One business returned by the search API, bound to the city it was found for.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Business {
    id: String,
    city_id: u32,
    name: String,
    category: String,
    rating: f64,
    phone: String,
    latitude: f64,
    longitude: f64,
    review_count: i64,
    city: String,
    state: String,
    zip_code: String,
}

impl Business {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Rank of the city whose search produced this business.
    pub fn city_id(&self) -> u32 {
        self.city_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Title of the first listed category.
    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn rating(&self) -> f64 {
        self.rating
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn review_count(&self) -> i64 {
        self.review_count
    }

    /// City from the upstream location block (may differ from the searched city).
    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn zip_code(&self) -> &str {
        &self.zip_code
    }
}
