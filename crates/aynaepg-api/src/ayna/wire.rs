//! Lenient JSON field deserializers for upstream payloads.
//!
//! The upstream APIs are loosely typed: identifiers and epoch values arrive
//! as either JSON strings or JSON numbers, and optional fields are sometimes
//! `null`, empty, or missing entirely.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Deserializes a JSON string or number into its textual form.
///
/// `null`, booleans, arrays and objects become `None`.
pub fn deserialize_scalar_as_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<Value> = Option::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Like [`deserialize_scalar_as_string`], but empty or whitespace-only text
/// is treated as absent.
pub fn deserialize_scalar_as_non_empty_string<'de, D>(
    deserializer: D,
) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = deserialize_scalar_as_string(deserializer)?;
    Ok(s.filter(|s| !s.trim().is_empty()))
}

/// Deserializes `null` as an empty list.
pub fn deserialize_null_as_empty_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let items: Option<Vec<T>> = Option::deserialize(deserializer)?;
    Ok(items.unwrap_or_default())
}
