//! Scalar and list row models.
//!
//! # Responsibility
//! - Mirror `kv_store` and `list_store` rows as typed values.
//! - Convert caller values to and from stored JSON text.
//!
//! # Invariants
//! - `ListItem::item_index` values of one list form `0..len` without gaps.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::finite::ensure_finite;

/// One row of the scalar table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarRecord {
    /// Unique key; primary identity of the record.
    pub key: String,
    /// Decoded JSON value.
    pub value: Value,
}

/// One row of the list table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListItem {
    pub list_name: String,
    /// Zero-based position inside `list_name`.
    pub item_index: usize,
    pub item_value: Value,
}

/// Encodes any serializable value as canonical JSON text.
///
/// # Errors
/// - Fails when `value` has no JSON representation (for example a map with
///   non-string keys, or a NaN/infinite float).
pub fn encode_value<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    ensure_finite(value)?;
    serde_json::to_string(value)
}

/// Converts any serializable value into a JSON tree.
pub fn to_json_value<T: Serialize + ?Sized>(value: &T) -> Result<Value, serde_json::Error> {
    ensure_finite(value)?;
    serde_json::to_value(value)
}

/// Decodes stored JSON text. A SQL `NULL` cell decodes as JSON `null`.
pub fn decode_value(text: Option<&str>) -> Result<Value, serde_json::Error> {
    match text {
        Some(text) => serde_json::from_str(text),
        None => Ok(Value::Null),
    }
}
