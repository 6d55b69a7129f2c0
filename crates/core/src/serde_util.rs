//! Defaulting decoders for loosely-shaped API payloads

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

/// Deserialize a field, falling back to `T::default()` when the value is
/// `null` or has an unexpected shape.
///
/// Pair with `#[serde(default)]` so that a missing key resolves the same way.
/// Only a syntactically invalid document can make this fail.
pub fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).unwrap_or_default())
}

/// Deserialize a string-keyed map, decoding each entry on its own.
///
/// An entry with an unexpected shape becomes `T::default()` without dropping
/// its siblings. A value that is not an object at all yields an empty map.
pub fn lenient_map<'de, D, T>(deserializer: D) -> Result<IndexMap<String, T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let entries: IndexMap<String, serde_json::Value> = lenient(deserializer)?;

    Ok(entries
        .into_iter()
        .map(|(key, value)| (key, T::deserialize(value).unwrap_or_default()))
        .collect())
}

/// Decode every element of a JSON array independently.
///
/// Elements that are not objects of the expected shape (`null`, numbers,
/// strings) become `T::default()`, so one bad element never discards a page.
pub fn lenient_items<T>(values: Vec<serde_json::Value>) -> Vec<T>
where
    T: DeserializeOwned + Default,
{
    values
        .into_iter()
        .map(|value| T::deserialize(value).unwrap_or_default())
        .collect()
}
