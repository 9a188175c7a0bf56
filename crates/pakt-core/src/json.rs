//! Serde helpers for the loosely-typed corners of Composer JSON.
//!
//! PHP encodes an empty associative array as `[]`, so any object-valued
//! field may arrive as a list. Packagist also uses the `"__unset"` marker
//! in minified metadata.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::BTreeMap;

/// Marker Packagist uses to delete an inherited key in minified metadata.
pub const UNSET: &str = "__unset";

/// Deserialize a `name => constraint` map that may also be `[]`, `null` or
/// `"__unset"`. Non-string values are skipped.
pub fn flexible_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(string_map(&value))
}

/// Convert a JSON value into a string map, treating anything that is not an
/// object as empty.
pub fn string_map(value: &Value) -> BTreeMap<String, String> {
    match value {
        Value::Object(obj) => obj
            .iter()
            .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
            .collect(),
        _ => BTreeMap::new(),
    }
}

/// Deserialize an optional object that may be `[]`, `null` or `"__unset"`,
/// mapping all of those to `None`.
pub fn optional_object<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    if is_absent(&value) {
        return Ok(None);
    }
    serde_json::from_value(value)
        .map(Some)
        .map_err(serde::de::Error::custom)
}

/// True for values Composer uses to mean "no value here".
pub fn is_absent(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s == UNSET,
        Value::Array(a) => a.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn string_map_accepts_empty_list() {
        assert!(string_map(&json!([])).is_empty());
        assert!(string_map(&Value::Null).is_empty());
    }

    #[test]
    fn string_map_keeps_string_values_only() {
        let map = string_map(&json!({"php": ">=8.1", "weird": 3}));
        assert_eq!(map.len(), 1);
        assert_eq!(map["php"], ">=8.1");
    }

    #[test]
    fn absent_markers() {
        assert!(is_absent(&json!("__unset")));
        assert!(is_absent(&json!(null)));
        assert!(is_absent(&json!([])));
        assert!(!is_absent(&json!({"url": "x"})));
    }
}
