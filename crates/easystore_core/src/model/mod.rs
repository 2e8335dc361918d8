//! Stored record shapes and their text encoding.
//!
//! # Responsibility
//! - Define the rows the store reads back from its two tables.
//! - Own the JSON text encoding used for every persisted value.
//!
//! # Invariants
//! - Persisted values are canonical compact JSON text.
//! - `decode(encode(v)) == v` for every JSON value `v`.
//! - Non-finite floats are rejected instead of being written as `null`.

pub mod finite;
pub mod record;
