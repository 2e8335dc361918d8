//! Store handle, connection scoping and scalar operations.
//!
//! # Responsibility
//! - Resolve a store location into per-operation connection scopes.
//! - Provide key/value CRUD over `kv_store`.
//!
//! # Invariants
//! - Every operation acquires its own connection scope and releases it on
//!   every exit path.
//! - Writes run inside one `IMMEDIATE` transaction and roll back on error.
//! - Scalar writes replace the whole stored value (upsert).

use super::{StoreError, StoreResult};
use crate::db::schema::{ensure_schema, KV_TABLE};
use crate::db::{current_timestamp, open_db, open_db_in_memory, StoreOptions};
use crate::model::record::{decode_value, encode_value, ScalarRecord};
use log::{debug, error, info};
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

/// Where a store keeps its tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    File(PathBuf),
    Memory,
}

impl Display for StoreLocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Memory => write!(f, ":memory:"),
        }
    }
}

enum Backing {
    /// A fresh connection is opened and closed for every operation.
    File(PathBuf),
    /// An in-memory database lives only as long as its connection, so one
    /// connection is shared and serialized behind a mutex.
    Memory(Mutex<Connection>),
}

/// Key/value and list store backed by SQLite.
///
/// The handle itself holds no open connection for file-backed stores; see
/// [`StoreLocation`].
pub struct EasyStore {
    backing: Backing,
    options: StoreOptions,
}

impl EasyStore {
    /// Opens (creating when needed) a file-backed store with default options.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::open_with_options(path, StoreOptions::default())
    }

    /// Opens a file-backed store and creates both tables when absent.
    ///
    /// # Errors
    /// - Returns `Db` when the file cannot be opened or an existing
    ///   `kv_store`/`list_store` table is missing required columns.
    pub fn open_with_options(path: impl AsRef<Path>, options: StoreOptions) -> StoreResult<Self> {
        let started_at = Instant::now();
        let path = path.as_ref().to_path_buf();
        info!("event=store_open module=store status=start mode=file");

        let result = open_db(&path, &options).and_then(|conn| ensure_schema(&conn));
        if let Err(err) = result {
            error!(
                "event=store_open module=store status=error mode=file duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }

        info!(
            "event=store_open module=store status=ok mode=file duration_ms={}",
            started_at.elapsed().as_millis()
        );
        Ok(Self {
            backing: Backing::File(path),
            options,
        })
    }

    /// Opens a private in-memory store with default options.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::open_in_memory_with_options(StoreOptions::default())
    }

    /// Opens a private in-memory store. Data is dropped with the handle.
    pub fn open_in_memory_with_options(options: StoreOptions) -> StoreResult<Self> {
        let started_at = Instant::now();
        let conn = open_db_in_memory(&options)?;
        ensure_schema(&conn)?;
        info!(
            "event=store_open module=store status=ok mode=memory duration_ms={}",
            started_at.elapsed().as_millis()
        );
        Ok(Self {
            backing: Backing::Memory(Mutex::new(conn)),
            options,
        })
    }

    pub fn location(&self) -> StoreLocation {
        match &self.backing {
            Backing::File(path) => StoreLocation::File(path.clone()),
            Backing::Memory(_) => StoreLocation::Memory,
        }
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    /// Runs `op` with a connection scoped to this call.
    pub(crate) fn with_connection<T>(
        &self,
        op: impl FnOnce(&mut Connection) -> StoreResult<T>,
    ) -> StoreResult<T> {
        match &self.backing {
            Backing::File(path) => {
                let mut conn = open_db(path, &self.options)?;
                op(&mut conn)
            }
            Backing::Memory(shared) => {
                // A panic mid-operation leaves no open transaction behind, so
                // the connection stays usable after poisoning.
                let mut conn = shared.lock().unwrap_or_else(PoisonError::into_inner);
                op(&mut conn)
            }
        }
    }

    /// Runs a read-only `op` in a per-call connection scope.
    pub(crate) fn read<T>(&self, op: impl FnOnce(&Connection) -> StoreResult<T>) -> StoreResult<T> {
        self.with_connection(|conn| op(conn))
    }

    /// Runs `op` in one `IMMEDIATE` transaction; commits only when it succeeds.
    pub(crate) fn write<T>(
        &self,
        op: impl FnOnce(&Transaction<'_>) -> StoreResult<T>,
    ) -> StoreResult<T> {
        self.with_connection(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let output = op(&tx)?;
            tx.commit()?;
            Ok(output)
        })
    }

    /// Returns the current local time as formatted by SQLite.
    pub fn timestamp(&self) -> StoreResult<String> {
        self.read(|conn| Ok(current_timestamp(conn)?))
    }

    /// Reads one scalar value.
    ///
    /// # Errors
    /// - `KeyNotFound` when no row exists for `key`.
    pub fn get_scalar(&self, key: &str) -> StoreResult<Value> {
        self.read(|conn| {
            fetch_scalar(conn, key)?.ok_or_else(|| StoreError::KeyNotFound(key.to_string()))
        })
    }

    /// Reads one scalar value and deserializes it into `T`.
    pub fn get_scalar_as<T: DeserializeOwned>(&self, key: &str) -> StoreResult<T> {
        let value = self.get_scalar(key)?;
        serde_json::from_value(value).map_err(|err| {
            StoreError::InvalidData(format!(
                "value of key `{key}` does not match the requested type: {err}"
            ))
        })
    }

    /// Inserts or fully replaces the value stored under `key`.
    ///
    /// # Errors
    /// - `Serialization` when `value` has no JSON representation; nothing is
    ///   written in that case.
    pub fn set_scalar<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> StoreResult<()> {
        let text = encode_value(value)?;
        self.write(|tx| upsert_scalar(tx, key, &text))?;
        debug!(
            "event=kv_set module=store status=ok key_len={} value_bytes={}",
            key.len(),
            text.len()
        );
        Ok(())
    }

    /// Deletes the row stored under `key`.
    ///
    /// # Errors
    /// - `KeyNotFound` when no row was removed.
    pub fn delete_scalar(&self, key: &str) -> StoreResult<()> {
        self.write(|tx| {
            let changed = tx.execute("DELETE FROM kv_store WHERE key = ?1;", [key])?;
            if changed == 0 {
                return Err(StoreError::KeyNotFound(key.to_string()));
            }
            Ok(())
        })?;
        debug!("event=kv_delete module=store status=ok key_len={}", key.len());
        Ok(())
    }

    /// Returns whether `key` has a scalar row.
    ///
    /// Absence is answered with `false`; only transport or decode failures
    /// surface as errors.
    pub fn key_exists(&self, key: &str) -> StoreResult<bool> {
        match self.get_scalar(key) {
            Ok(_) => Ok(true),
            Err(StoreError::KeyNotFound(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Same as [`EasyStore::key_exists`].
    pub fn contains(&self, key: &str) -> StoreResult<bool> {
        self.key_exists(key)
    }

    /// Lists every scalar key in storage order.
    pub fn all_keys(&self) -> StoreResult<Vec<String>> {
        Ok(self.all_items()?.into_iter().map(|record| record.key).collect())
    }

    /// Lists every scalar value in storage order.
    pub fn all_values(&self) -> StoreResult<Vec<Value>> {
        Ok(self
            .all_items()?
            .into_iter()
            .map(|record| record.value)
            .collect())
    }

    /// Lists every scalar record in storage order.
    pub fn all_items(&self) -> StoreResult<Vec<ScalarRecord>> {
        self.read(load_scalars)
    }
}

pub(crate) fn fetch_scalar(conn: &Connection, key: &str) -> StoreResult<Option<Value>> {
    let stored = conn
        .query_row("SELECT value FROM kv_store WHERE key = ?1;", [key], |row| {
            row.get::<_, Option<String>>(0)
        })
        .optional()?;

    match stored {
        Some(text) => Ok(Some(decode_column(text.as_deref(), KV_TABLE, "value")?)),
        None => Ok(None),
    }
}

pub(crate) fn upsert_scalar(conn: &Connection, key: &str, text: &str) -> StoreResult<()> {
    conn.execute(
        "INSERT OR REPLACE INTO kv_store (key, value) VALUES (?1, ?2);",
        params![key, text],
    )?;
    Ok(())
}

pub(crate) fn load_scalars(conn: &Connection) -> StoreResult<Vec<ScalarRecord>> {
    let mut stmt = conn.prepare("SELECT key, value FROM kv_store;")?;
    let mut rows = stmt.query([])?;
    let mut records = Vec::new();
    while let Some(row) = rows.next()? {
        let key: String = row.get(0)?;
        let text: Option<String> = row.get(1)?;
        records.push(ScalarRecord {
            key,
            value: decode_column(text.as_deref(), KV_TABLE, "value")?,
        });
    }
    Ok(records)
}

/// Decodes stored JSON text, reporting corrupt cells as `InvalidData`.
pub(crate) fn decode_column(
    text: Option<&str>,
    table: &str,
    column: &str,
) -> StoreResult<Value> {
    decode_value(text).map_err(|err| {
        StoreError::InvalidData(format!("`{table}.{column}` holds invalid JSON: {err}"))
    })
}
