//! List operations over `list_store`.
//!
//! # Responsibility
//! - Map index-addressable list semantics onto `(list_name, item_index)` rows.
//! - Keep indices dense across append, remove and wholesale replacement.
//!
//! # Invariants
//! - For every list, `item_index` values are exactly `0..len`.
//! - A list exists iff it has at least one row.
//! - Each mutation runs in a single transaction.

use super::engine::{decode_column, EasyStore};
use super::{StoreError, StoreResult};
use crate::db::schema::LIST_TABLE;
use crate::model::record::{encode_value, ListItem};
use log::{debug, error};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use serde_json::Value;

impl EasyStore {
    /// Returns the number of items in `name`; `0` when the list does not exist.
    pub fn list_len(&self, name: &str) -> StoreResult<usize> {
        self.read(|conn| count_items(conn, name))
    }

    /// Returns whether at least one item is stored under `name`.
    pub fn list_exists(&self, name: &str) -> StoreResult<bool> {
        self.read(|conn| list_exists_in(conn, name))
    }

    /// Returns every value of `name` ordered by index; empty when absent.
    pub fn list_get_all(&self, name: &str) -> StoreResult<Vec<Value>> {
        self.read(|conn| load_list(conn, name))
    }

    /// Returns every row of `name` with its stored index, ordered by index.
    pub fn list_items(&self, name: &str) -> StoreResult<Vec<ListItem>> {
        self.read(|conn| load_list_items(conn, name))
    }

    /// Returns the distinct names of all non-empty lists, oldest first.
    pub fn list_names(&self) -> StoreResult<Vec<String>> {
        self.read(load_list_names)
    }

    /// Reads the item at `index`.
    ///
    /// # Errors
    /// - `IndexOutOfRange` when no row exists at exactly `index`.
    pub fn list_get_item(&self, name: &str, index: usize) -> StoreResult<Value> {
        self.read(|conn| {
            let sql_index = to_sql_index(conn, name, index)?;
            let stored = conn
                .query_row(
                    "SELECT item_value FROM list_store
                     WHERE list_name = ?1 AND item_index = ?2;",
                    params![name, sql_index],
                    |row| row.get::<_, Option<String>>(0),
                )
                .optional()?;

            match stored {
                Some(text) => decode_column(text.as_deref(), LIST_TABLE, "item_value"),
                None => Err(out_of_range(conn, name, index)?),
            }
        })
    }

    /// Replaces the item at `index` in place.
    ///
    /// # Errors
    /// - `IndexOutOfRange` when `index >= list_len(name)`.
    /// - `InternalConsistency` when `index` is below the length but has no row.
    pub fn list_set_item<T: Serialize + ?Sized>(
        &self,
        name: &str,
        index: usize,
        value: &T,
    ) -> StoreResult<()> {
        let text = encode_value(value)?;
        self.write(|tx| update_item(tx, name, index, &text))?;
        debug!(
            "event=list_set module=store status=ok name_len={} index={}",
            name.len(),
            index
        );
        Ok(())
    }

    /// Writes `value` at `index`, growing the list with `null` placeholders
    /// when `index` is past the end.
    ///
    /// Within range this is [`EasyStore::list_set_item`]. Growth and the final
    /// write share one transaction.
    pub fn list_set_extending<T: Serialize + ?Sized>(
        &self,
        name: &str,
        index: usize,
        value: &T,
    ) -> StoreResult<()> {
        let text = encode_value(value)?;
        let null_text = encode_value(&Value::Null)?;
        let grown = self.write(|tx| {
            to_sql_index(tx, name, index)?;
            let len = count_items(tx, name)?;
            if index < len {
                update_item(tx, name, index, &text)?;
                return Ok(0);
            }
            for position in len..index {
                insert_item(tx, name, position, &null_text)?;
            }
            insert_item(tx, name, index, &text)?;
            Ok(index + 1 - len)
        })?;
        debug!(
            "event=list_set module=store status=ok name_len={} index={} appended={}",
            name.len(),
            index,
            grown
        );
        Ok(())
    }

    /// Appends `value` at index `list_len(name)`.
    pub fn list_append<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> StoreResult<()> {
        let text = encode_value(value)?;
        let index = self.write(|tx| {
            let index = count_items(tx, name)?;
            insert_item(tx, name, index, &text)?;
            Ok(index)
        })?;
        debug!(
            "event=list_append module=store status=ok name_len={} index={}",
            name.len(),
            index
        );
        Ok(())
    }

    /// Removes the item at `index` and shifts every later item down by one.
    ///
    /// # Errors
    /// - `IndexOutOfRange` when no row exists at `index`.
    pub fn list_remove(&self, name: &str, index: usize) -> StoreResult<()> {
        self.write(|tx| {
            let sql_index = to_sql_index(tx, name, index)?;
            let removed = tx.execute(
                "DELETE FROM list_store WHERE list_name = ?1 AND item_index = ?2;",
                params![name, sql_index],
            )?;
            if removed == 0 {
                return Err(out_of_range(tx, name, index)?);
            }

            // UNIQUE(list_name, item_index) is checked per row, so shift through
            // negative indices instead of decrementing in place.
            tx.execute(
                "UPDATE list_store SET item_index = -item_index
                 WHERE list_name = ?1 AND item_index > ?2;",
                params![name, sql_index],
            )?;
            tx.execute(
                "UPDATE list_store SET item_index = -item_index - 1
                 WHERE list_name = ?1 AND item_index < 0;",
                [name],
            )?;
            Ok(())
        })?;
        debug!(
            "event=list_remove module=store status=ok name_len={} index={}",
            name.len(),
            index
        );
        Ok(())
    }

    /// Replaces the whole content of `name` with `values`, indexed from zero.
    ///
    /// An empty `values` leaves no rows, so the list stops existing.
    pub fn list_replace_all<T: Serialize>(&self, name: &str, values: &[T]) -> StoreResult<()> {
        let encoded = values
            .iter()
            .map(encode_value)
            .collect::<Result<Vec<_>, _>>()?;
        self.write(|tx| replace_items(tx, name, &encoded))?;
        debug!(
            "event=list_replace module=store status=ok name_len={} len={}",
            name.len(),
            encoded.len()
        );
        Ok(())
    }
}

pub(crate) fn count_items(conn: &Connection, name: &str) -> StoreResult<usize> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM list_store WHERE list_name = ?1;",
        [name],
        |row| row.get(0),
    )?;
    usize::try_from(count)
        .map_err(|_| StoreError::InvalidData(format!("negative row count {count}")))
}

pub(crate) fn list_exists_in(conn: &Connection, name: &str) -> StoreResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM list_store WHERE list_name = ?1);",
        [name],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

pub(crate) fn load_list(conn: &Connection, name: &str) -> StoreResult<Vec<Value>> {
    Ok(load_list_items(conn, name)?
        .into_iter()
        .map(|item| item.item_value)
        .collect())
}

pub(crate) fn load_list_names(conn: &Connection) -> StoreResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT list_name FROM list_store
         GROUP BY list_name
         ORDER BY MIN(id) ASC;",
    )?;
    let mut rows = stmt.query([])?;
    let mut names = Vec::new();
    while let Some(row) = rows.next()? {
        names.push(row.get(0)?);
    }
    Ok(names)
}

/// Deletes every row of `name` and inserts pre-encoded `values` from index 0.
pub(crate) fn replace_items(conn: &Connection, name: &str, values: &[String]) -> StoreResult<()> {
    conn.execute("DELETE FROM list_store WHERE list_name = ?1;", [name])?;
    for (index, text) in values.iter().enumerate() {
        insert_item(conn, name, index, text)?;
    }
    Ok(())
}

fn load_list_items(conn: &Connection, name: &str) -> StoreResult<Vec<ListItem>> {
    let mut stmt = conn.prepare(
        "SELECT item_index, item_value FROM list_store
         WHERE list_name = ?1
         ORDER BY item_index ASC;",
    )?;
    let mut rows = stmt.query([name])?;
    let mut items = Vec::new();
    while let Some(row) = rows.next()? {
        let raw_index: i64 = row.get(0)?;
        let item_index = usize::try_from(raw_index).map_err(|_| {
            StoreError::InvalidData(format!(
                "invalid item_index `{raw_index}` in list_store.item_index"
            ))
        })?;
        let text: Option<String> = row.get(1)?;
        items.push(ListItem {
            list_name: name.to_string(),
            item_index,
            item_value: decode_column(text.as_deref(), LIST_TABLE, "item_value")?,
        });
    }
    Ok(items)
}

fn insert_item(conn: &Connection, name: &str, index: usize, text: &str) -> StoreResult<()> {
    let sql_index = to_sql_index(conn, name, index)?;
    conn.execute(
        "INSERT INTO list_store (list_name, item_index, item_value) VALUES (?1, ?2, ?3);",
        params![name, sql_index, text],
    )?;
    Ok(())
}

fn update_item(conn: &Connection, name: &str, index: usize, text: &str) -> StoreResult<()> {
    let sql_index = to_sql_index(conn, name, index)?;
    let changed = conn.execute(
        "UPDATE list_store SET item_value = ?1
         WHERE list_name = ?2 AND item_index = ?3;",
        params![text, name, sql_index],
    )?;
    if changed > 0 {
        return Ok(());
    }

    let len = count_items(conn, name)?;
    if index >= len {
        return Err(StoreError::IndexOutOfRange {
            list: name.to_string(),
            index,
            len,
        });
    }

    error!(
        "event=list_set module=store status=error error_code=list_index_gap name_len={} index={} len={}",
        name.len(),
        index,
        len
    );
    Err(StoreError::InternalConsistency {
        list: name.to_string(),
        index,
        len,
    })
}

fn to_sql_index(conn: &Connection, name: &str, index: usize) -> StoreResult<i64> {
    match i64::try_from(index) {
        Ok(value) => Ok(value),
        Err(_) => Err(out_of_range(conn, name, index)?),
    }
}

fn out_of_range(conn: &Connection, name: &str, index: usize) -> StoreResult<StoreError> {
    Ok(StoreError::IndexOutOfRange {
        list: name.to_string(),
        index,
        len: count_items(conn, name)?,
    })
}
