//! Business search response extraction.
//!
//! The response is walked as raw JSON rather than deserialized into a fixed
//! struct: one malformed record must only cost that record, so every field is
//! checked on its own and a failure becomes a [`SkipReason`].

use std::collections::HashSet;

use serde::Serialize;
use serde_json::{Map, Value};

use forkmap_core::{Business, BusinessDraft, Error, SkipReason};

/// A record left out of an extraction pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Skipped {
    /// Position in the upstream `businesses` array.
    pub index: usize,
    pub id: Option<String>,
    #[serde(serialize_with = "display")]
    pub reason: SkipReason,
}

fn display<S: serde::Serializer>(reason: &SkipReason, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(reason)
}

/// Outcome of one extraction pass over a city's search response.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Extraction {
    /// Valid businesses in upstream order.
    pub businesses: Vec<Business>,
    pub skipped: Vec<Skipped>,
    /// Match count reported upstream, across all pages.
    pub total: Option<u64>,
    /// Records present in this page, valid or not.
    pub returned: usize,
}

impl Extraction {
    /// Whether upstream reported more matches than this page holds.
    pub fn is_truncated(&self) -> bool {
        self.total.is_some_and(|total| total > self.returned as u64)
    }
}

/// Extract the businesses of one search response for the city ranked `city_id`.
///
/// Ids are deduplicated within this response only: the first record carrying
/// an id claims it, even when that record is then skipped as malformed.
///
/// Every extracted key must be present on the record. `phone` and the
/// `location` sub-fields may be empty or null, which is stored as blank.
///
/// # Errors
///
/// Returns `Error::Parse` if the response has no `businesses` array.
pub fn extract_businesses(city_id: u32, response: &Value) -> Result<Extraction, Error> {
    let records = response
        .get("businesses")
        .and_then(Value::as_array)
        .ok_or_else(|| match upstream_error(response) {
            Some(message) => Error::Parse(format!("search returned an error: {message}")),
            None => Error::Parse("search response has no `businesses` array".into()),
        })?;

    let mut extraction = Extraction {
        total: response.get("total").and_then(Value::as_u64),
        returned: records.len(),
        ..Default::default()
    };
    let mut seen = HashSet::new();

    for (index, record) in records.iter().enumerate() {
        let id = record.get("id").and_then(Value::as_str).map(str::to_string);

        if let Some(id) = &id
            && !seen.insert(id.clone())
        {
            extraction.skipped.push(Skipped { index, id: Some(id.clone()), reason: SkipReason::DuplicateId(id.clone()) });
            continue;
        }

        match read_record(city_id, record).and_then(BusinessDraft::validate) {
            Ok(business) => extraction.businesses.push(business),
            Err(reason) => {
                tracing::debug!(city_id, index, id = ?id, %reason, "skipping business record");
                extraction.skipped.push(Skipped { index, id, reason });
            }
        }
    }

    Ok(extraction)
}

fn read_record(city_id: u32, record: &Value) -> Result<BusinessDraft, SkipReason> {
    let record = record
        .as_object()
        .ok_or_else(|| SkipReason::InvalidValue { field: "business", reason: "not an object".into() })?;

    let category = match record.get("categories") {
        None | Some(Value::Null) => return Err(SkipReason::MissingField("categories")),
        Some(Value::Array(categories)) => {
            let first = categories.first().ok_or(SkipReason::NoCategories)?;
            required_str(first.as_object(), "title", "categories[0].title")?
        }
        Some(_) => {
            return Err(SkipReason::InvalidValue { field: "categories", reason: "not an array".into() });
        }
    };

    let coordinates = record.get("coordinates").and_then(Value::as_object);
    let location = match record.get("location") {
        Some(Value::Object(location)) => location,
        None | Some(Value::Null) => return Err(SkipReason::MissingField("location")),
        Some(_) => return Err(SkipReason::InvalidValue { field: "location", reason: "not an object".into() }),
    };

    Ok(BusinessDraft {
        id: required_str(Some(record), "id", "id")?,
        city_id,
        name: required_str(Some(record), "name", "name")?,
        category,
        rating: required_f64(Some(record), "rating", "rating")?,
        phone: blankable_str(record, "phone", "phone")?,
        latitude: required_f64(coordinates, "latitude", "coordinates.latitude")?,
        longitude: required_f64(coordinates, "longitude", "coordinates.longitude")?,
        review_count: required_i64(Some(record), "review_count", "review_count")?,
        city: blankable_str(location, "city", "location.city")?,
        state: blankable_str(location, "state", "location.state")?,
        zip_code: blankable_str(location, "zip_code", "location.zip_code")?,
    })
}

fn present<'a>(
    object: Option<&'a Map<String, Value>>, key: &str, field: &'static str,
) -> Result<&'a Value, SkipReason> {
    match object.and_then(|o| o.get(key)) {
        None | Some(Value::Null) => Err(SkipReason::MissingField(field)),
        Some(value) => Ok(value),
    }
}

fn required_str(object: Option<&Map<String, Value>>, key: &str, field: &'static str) -> Result<String, SkipReason> {
    present(object, key, field)?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| SkipReason::InvalidValue { field, reason: "not a string".into() })
}

fn required_f64(object: Option<&Map<String, Value>>, key: &str, field: &'static str) -> Result<f64, SkipReason> {
    present(object, key, field)?
        .as_f64()
        .ok_or_else(|| SkipReason::InvalidValue { field, reason: "not a number".into() })
}

fn required_i64(object: Option<&Map<String, Value>>, key: &str, field: &'static str) -> Result<i64, SkipReason> {
    present(object, key, field)?
        .as_i64()
        .ok_or_else(|| SkipReason::InvalidValue { field, reason: "not an integer".into() })
}

/// A key that must exist but may hold null.
fn blankable_str(object: &Map<String, Value>, key: &str, field: &'static str) -> Result<String, SkipReason> {
    match object.get(key) {
        None => Err(SkipReason::MissingField(field)),
        Some(Value::Null) => Ok(String::new()),
        Some(Value::String(value)) => Ok(value.clone()),
        Some(_) => Err(SkipReason::InvalidValue { field, reason: "not a string".into() }),
    }
}

fn upstream_error(response: &Value) -> Option<String> {
    let error = response.get("error")?;
    let code = error.get("code").and_then(Value::as_str).unwrap_or("UNKNOWN");
    let description = error.get("description").and_then(Value::as_str).unwrap_or("");
    Some(format!("{code} {description}").trim().to_string())
}
