//! Storage engine over the scalar and list tables.
//!
//! # Responsibility
//! - Own every read and write against `kv_store` and `list_store`.
//! - Scope one connection (and, for writes, one transaction) per operation.
//!
//! # Invariants
//! - List indices stay contiguous (`0..len`) after every committed operation.
//! - A failed operation leaves no partial writes behind.
//! - Errors are semantic (`KeyNotFound`, `IndexOutOfRange`, ...) in addition
//!   to DB transport errors.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub(crate) mod engine;
mod list_view;
pub(crate) mod lists;

pub use engine::{EasyStore, StoreLocation};
pub use list_view::ListView;

pub type StoreResult<T> = Result<T, StoreError>;

/// Error taxonomy for store, list and attribute operations.
#[derive(Debug)]
pub enum StoreError {
    /// Explicit scalar get/delete on an absent key.
    KeyNotFound(String),
    /// Attribute-style read resolved to nothing.
    AttributeNotFound(String),
    /// Attribute-style access with a name that is not identifier-like.
    InvalidAttributeName(String),
    IndexOutOfRange {
        list: String,
        index: usize,
        len: usize,
    },
    /// Value has no JSON representation.
    Serialization(serde_json::Error),
    /// List row accounting diverged from the row count. Never swallowed.
    InternalConsistency {
        list: String,
        index: usize,
        len: usize,
    },
    /// Persisted text is not valid JSON or has an impossible shape.
    InvalidData(String),
    Db(DbError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::KeyNotFound(key) => write!(f, "key `{key}` not found"),
            Self::AttributeNotFound(name) => write!(f, "store has no attribute `{name}`"),
            Self::InvalidAttributeName(name) => {
                write!(f, "`{name}` is not a valid attribute name")
            }
            Self::IndexOutOfRange { list, index, len } => write!(
                f,
                "list index {index} out of range for `{list}` (len {len})"
            ),
            Self::Serialization(err) => write!(f, "value is not JSON-serializable: {err}"),
            Self::InternalConsistency { list, index, len } => write!(
                f,
                "list `{list}` has no row at index {index} although its length is {len}"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Serialization(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::KeyNotFound(_)
            | Self::AttributeNotFound(_)
            | Self::InvalidAttributeName(_)
            | Self::IndexOutOfRange { .. }
            | Self::InternalConsistency { .. }
            | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}
