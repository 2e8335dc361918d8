//! Table layout for scalar and list storage.
//!
//! # Responsibility
//! - Create `kv_store` and `list_store` when absent.
//! - Reject pre-existing tables whose shape the store cannot use.
//!
//! # Invariants
//! - Schema creation is idempotent; existing rows are never touched.
//! - Schema evolution is out of scope: there is no version tracking.

use crate::db::{DbError, DbResult};
use rusqlite::Connection;

/// Scalar key/value table name.
pub const KV_TABLE: &str = "kv_store";
/// List item table name.
pub const LIST_TABLE: &str = "list_store";

const SCHEMA_SQL: &str = include_str!("schema.sql");

const REQUIRED_COLUMNS: &[(&str, &[&str])] = &[
    ("kv_store", &["key", "value"]),
    ("list_store", &["list_name", "item_index", "item_value"]),
];

/// Returns whether `name` belongs to the store itself or to SQLite internals.
///
/// Such tables are never reported as foreign relations.
pub fn is_internal_table(name: &str) -> bool {
    name == KV_TABLE || name == LIST_TABLE || name.starts_with("sqlite_")
}

/// Creates both store tables when absent and validates their columns.
pub fn ensure_schema(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    for &(table, columns) in REQUIRED_COLUMNS {
        if !table_exists(conn, table)? {
            return Err(DbError::MissingRequiredTable(table));
        }
        for &column in columns {
            if !table_has_column(conn, table, column)? {
                return Err(DbError::MissingRequiredColumn { table, column });
            }
        }
    }

    Ok(())
}

/// Returns whether a table with exactly this name exists.
pub fn table_exists(conn: &Connection, table: &str) -> DbResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

/// Returns the column names of a table or view, in declaration order.
pub fn table_columns(conn: &Connection, table: &str) -> DbResult<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({});", quote_identifier(table)))?;
    let mut rows = stmt.query([])?;
    let mut columns = Vec::new();
    while let Some(row) = rows.next()? {
        columns.push(row.get::<_, String>(1)?);
    }
    Ok(columns)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> DbResult<bool> {
    Ok(table_columns(conn, table)?
        .iter()
        .any(|current| current == column))
}

/// Quotes an identifier for interpolation into SQL text.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
