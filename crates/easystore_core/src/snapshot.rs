//! Read-only aggregate of everything stored in the database.
//!
//! # Responsibility
//! - Collect scalars, lists and every foreign relation into one ordered map.
//! - Tolerate unreadable foreign relations without failing the whole dump.
//!
//! # Invariants
//! - Building a snapshot never writes.
//! - Scalars, lists and relations are read through one connection scope.
//! - A failure reading one foreign relation only drops that relation.

use crate::db::schema::{is_internal_table, quote_identifier, table_columns};
use crate::store::engine::load_scalars;
use crate::store::lists::{load_list, load_list_names};
use crate::store::{EasyStore, StoreError, StoreResult};
use log::{debug, warn};
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use serde::Serialize;
use serde_json::{Map, Number, Value};
use std::time::Instant;

/// Which table family produced a snapshot entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryOrigin {
    Scalar,
    List,
    /// A relation the store does not own; value is an array of row objects.
    Table,
}

/// One named value of a [`Snapshot`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotEntry {
    pub name: String,
    pub origin: EntryOrigin,
    pub value: Value,
}

/// Insertion-ordered `name -> value` aggregate.
///
/// Re-inserting a name replaces its value and origin but keeps its position.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    entries: Vec<SnapshotEntry>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, origin: EntryOrigin, value: Value) {
        let name = name.into();
        match self.entries.iter_mut().find(|entry| entry.name == name) {
            Some(entry) => {
                entry.origin = origin;
                entry.value = value;
            }
            None => self.entries.push(SnapshotEntry {
                name,
                origin,
                value,
            }),
        }
    }

    pub fn get(&self, name: &str) -> Option<&SnapshotEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    pub fn entries(&self) -> &[SnapshotEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Flattens the snapshot into one JSON object, keeping entry order.
    pub fn to_json(&self) -> Value {
        let map = self
            .entries
            .iter()
            .map(|entry| (entry.name.clone(), entry.value.clone()))
            .collect::<Map<String, Value>>();
        Value::Object(map)
    }
}

impl EasyStore {
    /// Builds a fresh snapshot of all stored data.
    ///
    /// Scalars come first, then lists (overriding scalars of the same name),
    /// then foreign relations as arrays of row objects.
    ///
    /// # Errors
    /// - Propagates failures reading `kv_store` or `list_store`.
    /// - Never fails because of a foreign relation; those are skipped.
    pub fn build_snapshot(&self) -> StoreResult<Snapshot> {
        let started_at = Instant::now();
        let snapshot = self.read(collect_snapshot)?;
        debug!(
            "event=snapshot_build module=snapshot status=ok entries={} duration_ms={}",
            snapshot.len(),
            started_at.elapsed().as_millis()
        );
        Ok(snapshot)
    }
}

fn collect_snapshot(conn: &Connection) -> StoreResult<Snapshot> {
    let mut snapshot = Snapshot::new();

    for record in load_scalars(conn)? {
        snapshot.insert(record.key, EntryOrigin::Scalar, record.value);
    }

    for name in load_list_names(conn)? {
        let values = load_list(conn, &name)?;
        snapshot.insert(name, EntryOrigin::List, Value::Array(values));
    }

    let relations = match foreign_relations(conn) {
        Ok(relations) => relations,
        Err(err) => {
            warn!(
                "event=snapshot_tables_skipped module=snapshot status=error error={}",
                err
            );
            Vec::new()
        }
    };

    for relation in relations {
        match read_relation(conn, &relation) {
            Ok(rows) => snapshot.insert(relation, EntryOrigin::Table, Value::Array(rows)),
            Err(err) => warn!(
                "event=snapshot_table_skipped module=snapshot status=error name_len={} error={}",
                relation.len(),
                err
            ),
        }
    }

    Ok(snapshot)
}

/// Lists tables and views the store does not own, in schema order.
fn foreign_relations(conn: &Connection) -> StoreResult<Vec<String>> {
    let mut stmt =
        conn.prepare("SELECT name FROM sqlite_master WHERE type IN ('table', 'view');")?;
    let mut rows = stmt.query([])?;
    let mut names = Vec::new();
    while let Some(row) = rows.next()? {
        let name: String = row.get(0)?;
        if !is_internal_table(&name) {
            names.push(name);
        }
    }
    Ok(names)
}

/// Reads every row of `relation` as a `column -> value` object.
fn read_relation(conn: &Connection, relation: &str) -> StoreResult<Vec<Value>> {
    let columns = table_columns(conn, relation)?;
    let mut stmt = conn.prepare(&format!("SELECT * FROM {};", quote_identifier(relation)))?;
    if stmt.column_count() != columns.len() {
        return Err(StoreError::InvalidData(format!(
            "relation reports {} columns but yields {}",
            columns.len(),
            stmt.column_count()
        )));
    }

    let mut rows = stmt.query([])?;
    let mut output = Vec::new();
    while let Some(row) = rows.next()? {
        let mut object = Map::with_capacity(columns.len());
        for (index, column) in columns.iter().enumerate() {
            object.insert(column.clone(), sql_to_json(row.get_ref(index)?));
        }
        output.push(Value::Object(object));
    }
    Ok(output)
}

fn sql_to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(number) => Value::from(number),
        ValueRef::Real(number) => Number::from_f64(number).map_or(Value::Null, Value::Number),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => {
            let hex = bytes
                .iter()
                .map(|byte| format!("{byte:02x}"))
                .collect::<String>();
            Value::String(format!("x'{hex}'"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{sql_to_json, EntryOrigin, Snapshot};
    use rusqlite::types::ValueRef;
    use serde_json::{json, Value};

    #[test]
    fn reinserting_a_name_keeps_its_position() {
        let mut snapshot = Snapshot::new();
        snapshot.insert("a", EntryOrigin::Scalar, json!(1));
        snapshot.insert("b", EntryOrigin::Scalar, json!(2));
        snapshot.insert("a", EntryOrigin::List, json!([1, 2]));

        let names: Vec<_> = snapshot.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(snapshot.get("a").unwrap().origin, EntryOrigin::List);
        assert_eq!(snapshot.to_json(), json!({"a": [1, 2], "b": 2}));
    }

    #[test]
    fn sqlite_values_map_to_json() {
        assert_eq!(sql_to_json(ValueRef::Null), Value::Null);
        assert_eq!(sql_to_json(ValueRef::Integer(-4)), json!(-4));
        assert_eq!(sql_to_json(ValueRef::Real(1.5)), json!(1.5));
        assert_eq!(sql_to_json(ValueRef::Real(f64::INFINITY)), Value::Null);
        assert_eq!(sql_to_json(ValueRef::Text(b"hi")), json!("hi"));
        assert_eq!(sql_to_json(ValueRef::Blob(&[0x0a, 0xff])), json!("x'0aff'"));
    }
}
