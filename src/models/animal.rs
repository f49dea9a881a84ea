//! Animal data structures as published by the shelter feed.

use serde::{Deserialize, Deserializer, Serialize};

/// One element of the feed's top-level array.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedEntry {
    #[serde(rename = "AdoptableSearch")]
    pub adoptable_search: Animal,
}

/// An adoptable animal observed in the feed.
///
/// Only `id`, `name` and `age` drive reconciliation. The remaining attributes
/// are carried for display and filtering.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Animal {
    /// Identifier assigned by the shelter
    #[serde(rename = "ID", deserialize_with = "lenient_string")]
    pub id: String,

    /// Display name (may be empty)
    #[serde(rename = "Name", deserialize_with = "lenient_string")]
    pub name: String,

    /// Free-text age, e.g. "2 years 3 months"
    #[serde(rename = "Age", deserialize_with = "lenient_string")]
    pub age: String,

    #[serde(rename = "AgeGroup", deserialize_with = "lenient_string")]
    pub age_group: String,

    #[serde(rename = "AnimalType", deserialize_with = "lenient_string")]
    pub animal_type: String,

    #[serde(rename = "Species", deserialize_with = "lenient_string")]
    pub species: String,

    #[serde(rename = "PrimaryBreed", deserialize_with = "lenient_string")]
    pub primary_breed: String,

    #[serde(rename = "SecondaryBreed", deserialize_with = "lenient_string")]
    pub secondary_breed: String,

    #[serde(rename = "Sex", deserialize_with = "lenient_string")]
    pub sex: String,

    #[serde(rename = "Location", deserialize_with = "lenient_string")]
    pub location: String,

    #[serde(rename = "Sublocation", deserialize_with = "lenient_string")]
    pub sublocation: String,

    #[serde(rename = "Photo", deserialize_with = "lenient_string")]
    pub photo: String,

    #[serde(rename = "OnHold", deserialize_with = "lenient_string")]
    pub on_hold: String,
}

impl Animal {
    /// Create an animal with only the fields reconciliation depends on.
    pub fn new(id: impl Into<String>, name: impl Into<String>, age: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            age: age.into(),
            ..Self::default()
        }
    }

    /// Whether the identifier can be used as a store key.
    pub fn has_id(&self) -> bool {
        !self.id.trim().is_empty()
    }
}

/// Accept strings, numbers, booleans and null for a text field.
///
/// The feed is not strict about scalar types; anything else is rejected so
/// the enclosing entry gets skipped.
fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    use serde_json::Value;

    match Value::deserialize(deserializer)? {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(D::Error::custom(format!(
            "expected a scalar value, found {other}"
        ))),
    }
}
