use easystore_core::report::escape_html;
use easystore_core::{
    render_report, EasyStore, EntryOrigin, ReportMeta, ReportOptions, Snapshot,
};
use rusqlite::Connection;
use serde_json::json;
use std::path::Path;

fn meta() -> ReportMeta {
    ReportMeta {
        source: "test.db".to_string(),
        generated_at: "2026-01-01 00:00:00".to_string(),
    }
}

fn create_orders_table(path: &Path, rows: usize) {
    let conn = Connection::open(path).unwrap();
    conn.execute_batch("CREATE TABLE orders (id INTEGER PRIMARY KEY, item TEXT, price REAL);")
        .unwrap();
    for id in 1..=rows {
        conn.execute(
            "INSERT INTO orders (id, item, price) VALUES (?1, ?2, ?3);",
            rusqlite::params![id as i64, format!("item-{id}"), 1.5 * id as f64],
        )
        .unwrap();
    }
}

fn section<'a>(html: &'a str, heading: &str) -> &'a str {
    let start = html
        .find(&format!("<h2>{heading}</h2>"))
        .unwrap_or_else(|| panic!("missing section {heading}"));
    let rest = &html[start..];
    match rest[4..].find("<h2>") {
        Some(end) => &rest[..end + 4],
        None => rest,
    }
}

#[test]
fn snapshot_merges_scalars_lists_and_foreign_tables() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mixed.db");
    let store = EasyStore::open(&path).unwrap();
    store.set_scalar("name", "ada").unwrap();
    store.list_replace_all("numbers", &[1, 2]).unwrap();
    create_orders_table(&path, 2);

    let snapshot = store.build_snapshot().unwrap();

    let names: Vec<_> = snapshot.entries().iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["name", "numbers", "orders"]);
    assert_eq!(snapshot.get("name").unwrap().origin, EntryOrigin::Scalar);
    assert_eq!(snapshot.get("numbers").unwrap().value, json!([1, 2]));
    assert_eq!(
        snapshot.get("orders").unwrap().value,
        json!([
            {"id": 1, "item": "item-1", "price": 1.5},
            {"id": 2, "item": "item-2", "price": 3.0}
        ])
    );
    assert!(snapshot.get("kv_store").is_none());
    assert!(snapshot.get("sqlite_sequence").is_none());
}

#[test]
fn foreign_rows_keep_column_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("order.db");
    let store = EasyStore::open(&path).unwrap();
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE wide (zeta TEXT, alpha TEXT, mid BLOB);
         INSERT INTO wide VALUES ('z', 'a', x'01ff');",
    )
    .unwrap();

    let snapshot = store.build_snapshot().unwrap();
    let row = &snapshot.get("wide").unwrap().value[0];
    let columns: Vec<_> = row.as_object().unwrap().keys().cloned().collect();
    assert_eq!(columns, ["zeta", "alpha", "mid"]);
    assert_eq!(row["mid"], json!("x'01ff'"));
}

#[test]
fn list_values_override_scalars_with_the_same_name() {
    let store = EasyStore::open_in_memory().unwrap();
    store.set_scalar("dup", "scalar").unwrap();
    store.list_append("dup", "item").unwrap();

    let snapshot = store.build_snapshot().unwrap();
    assert_eq!(snapshot.len(), 1);
    let entry = snapshot.get("dup").unwrap();
    assert_eq!(entry.origin, EntryOrigin::List);
    assert_eq!(entry.value, json!(["item"]));
}

#[test]
fn report_truncates_large_tables_and_lists_plain_entries() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.db");
    let store = EasyStore::open(&path).unwrap();
    store.list_replace_all("fruits", &["apple", "pear"]).unwrap();
    store.list_replace_all("primes", &[2, 3, 5]).unwrap();
    create_orders_table(&path, 15);

    let snapshot = store.build_snapshot().unwrap();
    let html = render_report(&snapshot, &meta(), &ReportOptions::default());

    let tables = section(&html, "Tables");
    assert!(tables.contains("orders (15 rows)"));
    assert_eq!(tables.matches("<tr>").count(), 1 + 10);
    assert!(tables.contains("item-10"));
    assert!(!tables.contains("item-11"));
    assert!(tables.contains("(15 total)"));

    let stored = section(&html, "Stored data");
    assert!(stored.contains(">fruits</button>"));
    assert!(stored.contains(">primes</button>"));
    assert!(!stored.contains("orders"));
}

#[test]
fn small_tables_have_no_truncation_notice() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("small.db");
    let store = EasyStore::open(&path).unwrap();
    create_orders_table(&path, 3);

    let html = render_report(
        &store.build_snapshot().unwrap(),
        &meta(),
        &ReportOptions::default(),
    );
    assert_eq!(section(&html, "Tables").matches("<tr>").count(), 1 + 3);
    assert!(!html.contains("total)"));
}

#[test]
fn empty_foreign_tables_render_as_empty_tables() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.db");
    let store = EasyStore::open(&path).unwrap();
    create_orders_table(&path, 0);

    let snapshot = store.build_snapshot().unwrap();
    assert_eq!(snapshot.get("orders").unwrap().value, json!([]));

    let html = render_report(&snapshot, &meta(), &ReportOptions::default());
    assert!(section(&html, "Tables").contains("Table is empty"));
}

#[test]
fn unreadable_relation_is_skipped_and_report_still_renders() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.db");
    let store = EasyStore::open(&path).unwrap();
    store.set_scalar("kept", &1).unwrap();
    store.list_append("queue", &"job").unwrap();
    create_orders_table(&path, 1);

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE doomed (x INTEGER);
         CREATE VIEW broken AS SELECT x FROM doomed;
         DROP TABLE doomed;",
    )
    .unwrap();
    drop(conn);

    let snapshot = store.build_snapshot().unwrap();
    assert!(snapshot.get("broken").is_none());
    assert!(snapshot.get("orders").is_some());
    assert_eq!(snapshot.get("kept").unwrap().value, json!(1));
    assert_eq!(snapshot.get("queue").unwrap().value, json!(["job"]));

    let html = store.html_report().unwrap();
    assert!(html.contains("orders (1 rows)"));
}

#[test]
fn report_escapes_stored_text() {
    let store = EasyStore::open_in_memory().unwrap();
    store.set_scalar("<b>name</b>", "<script>alert(1)</script>").unwrap();
    store
        .list_replace_all("rows", &[json!({"html": "<img src=x onerror=alert(1)>"})])
        .unwrap();

    let html = render_report(
        &store.build_snapshot().unwrap(),
        &meta(),
        &ReportOptions::default(),
    );
    assert!(!html.contains("<script>alert"));
    assert!(!html.contains("<img"));
    assert!(!html.contains("<b>name"));
    assert!(html.contains(&escape_html("<b>name</b>")));
}

#[test]
fn report_truncates_long_cells() {
    let mut snapshot = Snapshot::new();
    snapshot.insert(
        "logs",
        EntryOrigin::Table,
        json!([{"message": "x".repeat(150)}]),
    );

    let html = render_report(&snapshot, &meta(), &ReportOptions::default());
    assert!(html.contains(&format!("<td>{}...</td>", "x".repeat(100))));
}

#[test]
fn report_header_includes_source_and_timestamp() {
    let html = render_report(&Snapshot::new(), &meta(), &ReportOptions::default());
    assert!(html.contains("test.db"));
    assert!(html.contains("2026-01-01 00:00:00"));
    assert!(!html.contains("<h2>Tables</h2>"));
    assert!(!html.contains("<h2>Stored data</h2>"));
}

#[test]
fn store_report_uses_store_location() {
    let store = EasyStore::open_in_memory().unwrap();
    store.set_scalar("k", "v").unwrap();

    let html = store.html_report().unwrap();
    assert!(html.contains(":memory:"));
    assert!(html.contains("<h2>Stored data</h2>"));
}
