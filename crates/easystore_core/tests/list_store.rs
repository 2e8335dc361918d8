use easystore_core::{EasyStore, StoreError};
use rusqlite::Connection;
use serde_json::{json, Value};

fn stored_indices(store: &EasyStore, name: &str) -> Vec<usize> {
    store
        .list_items(name)
        .unwrap()
        .into_iter()
        .map(|item| item.item_index)
        .collect()
}

#[test]
fn append_assigns_dense_indices() {
    let store = EasyStore::open_in_memory().unwrap();
    for i in 0..5 {
        store.list_append("numbers", &(i * 2)).unwrap();
    }

    assert_eq!(store.list_len("numbers").unwrap(), 5);
    assert_eq!(stored_indices(&store, "numbers"), vec![0, 1, 2, 3, 4]);
    assert_eq!(
        store.list_get_all("numbers").unwrap(),
        vec![json!(0), json!(2), json!(4), json!(6), json!(8)]
    );
}

#[test]
fn missing_list_is_empty_and_does_not_exist() {
    let store = EasyStore::open_in_memory().unwrap();
    assert_eq!(store.list_len("ghost").unwrap(), 0);
    assert!(!store.list_exists("ghost").unwrap());
    assert!(store.list_get_all("ghost").unwrap().is_empty());
}

#[test]
fn get_item_outside_list_is_out_of_range() {
    let store = EasyStore::open_in_memory().unwrap();
    store.list_append("letters", "a").unwrap();

    assert_eq!(store.list_get_item("letters", 0).unwrap(), json!("a"));
    let err = store.list_get_item("letters", 1).unwrap_err();
    assert!(matches!(
        err,
        StoreError::IndexOutOfRange { index: 1, len: 1, .. }
    ));
}

#[test]
fn set_item_updates_in_place_and_rejects_out_of_range() {
    let store = EasyStore::open_in_memory().unwrap();
    store
        .list_replace_all("numbers", &[json!(0), json!(2), json!(4)])
        .unwrap();

    store.list_set_item("numbers", 2, &100).unwrap();
    assert_eq!(
        store.list_get_all("numbers").unwrap(),
        vec![json!(0), json!(2), json!(100)]
    );

    let err = store.list_set_item("numbers", 3, &1).unwrap_err();
    assert!(matches!(
        err,
        StoreError::IndexOutOfRange { index: 3, len: 3, .. }
    ));
    assert_eq!(store.list_len("numbers").unwrap(), 3);
}

#[test]
fn set_item_over_an_index_gap_is_an_internal_consistency_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gap.db");
    let store = EasyStore::open(&path).unwrap();

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "INSERT INTO list_store (list_name, item_index, item_value) VALUES ('holes', 0, '\"a\"');
         INSERT INTO list_store (list_name, item_index, item_value) VALUES ('holes', 2, '\"c\"');",
    )
    .unwrap();

    let err = store.list_set_item("holes", 1, "b").unwrap_err();
    assert!(matches!(
        err,
        StoreError::InternalConsistency { index: 1, len: 2, .. }
    ));
}

#[test]
fn remove_shifts_later_items_down() {
    let store = EasyStore::open_in_memory().unwrap();
    let original = ["a", "b", "c", "d", "e"];
    store.list_replace_all("letters", &original).unwrap();

    store.list_remove("letters", 1).unwrap();

    assert_eq!(
        store.list_get_all("letters").unwrap(),
        vec![json!("a"), json!("c"), json!("d"), json!("e")]
    );
    assert_eq!(stored_indices(&store, "letters"), vec![0, 1, 2, 3]);

    store.list_append("letters", "f").unwrap();
    assert_eq!(stored_indices(&store, "letters"), vec![0, 1, 2, 3, 4]);
    assert_eq!(store.list_get_item("letters", 4).unwrap(), json!("f"));
}

#[test]
fn remove_first_and_last_items_keeps_indices_dense() {
    let store = EasyStore::open_in_memory().unwrap();
    store.list_replace_all("n", &[1, 2, 3, 4]).unwrap();

    store.list_remove("n", 0).unwrap();
    store.list_remove("n", 2).unwrap();

    assert_eq!(store.list_get_all("n").unwrap(), vec![json!(2), json!(3)]);
    assert_eq!(stored_indices(&store, "n"), vec![0, 1]);
}

#[test]
fn remove_out_of_range_fails_without_changes() {
    let store = EasyStore::open_in_memory().unwrap();
    store.list_replace_all("n", &[1, 2]).unwrap();

    let err = store.list_remove("n", 5).unwrap_err();
    assert!(matches!(
        err,
        StoreError::IndexOutOfRange { index: 5, len: 2, .. }
    ));
    assert_eq!(store.list_get_all("n").unwrap(), vec![json!(1), json!(2)]);
}

#[test]
fn removing_the_last_item_makes_the_list_disappear() {
    let store = EasyStore::open_in_memory().unwrap();
    store.list_append("single", &1).unwrap();
    store.list_remove("single", 0).unwrap();

    assert!(!store.list_exists("single").unwrap());
    assert!(store.list_names().unwrap().is_empty());
}

#[test]
fn replace_all_discards_previous_items() {
    let store = EasyStore::open_in_memory().unwrap();
    store.list_replace_all("tasks", &["a", "b", "c"]).unwrap();
    store.list_replace_all("tasks", &["z"]).unwrap();

    assert_eq!(store.list_get_all("tasks").unwrap(), vec![json!("z")]);

    store.list_replace_all::<Value>("tasks", &[]).unwrap();
    assert!(!store.list_exists("tasks").unwrap());
}

#[test]
fn lists_with_different_names_do_not_interfere() {
    let store = EasyStore::open_in_memory().unwrap();
    store.list_replace_all("left", &[1, 2, 3]).unwrap();
    store.list_replace_all("right", &[10, 20]).unwrap();

    store.list_remove("left", 0).unwrap();

    assert_eq!(store.list_get_all("right").unwrap(), vec![json!(10), json!(20)]);
    assert_eq!(store.list_names().unwrap(), vec!["left", "right"]);
}

#[test]
fn list_view_set_past_the_end_fills_with_nulls() {
    let store = EasyStore::open_in_memory().unwrap();
    let view = store.list_view("sparse");
    view.append(&"first").unwrap();

    view.set(4, &"fifth").unwrap();

    assert_eq!(view.len().unwrap(), 5);
    assert_eq!(
        view.to_vec().unwrap(),
        vec![json!("first"), Value::Null, Value::Null, Value::Null, json!("fifth")]
    );
    assert_eq!(stored_indices(&store, "sparse"), vec![0, 1, 2, 3, 4]);
}

#[test]
fn list_view_set_at_length_appends_without_placeholders() {
    let store = EasyStore::open_in_memory().unwrap();
    let view = store.list_view("fresh");
    assert!(view.is_empty().unwrap());

    view.set(0, &1).unwrap();
    view.set(1, &2).unwrap();
    view.set(0, &"replaced").unwrap();

    assert_eq!(view.to_vec().unwrap(), vec![json!("replaced"), json!(2)]);
    assert_eq!(view.name(), "fresh");
}

#[test]
fn list_view_delegates_get_and_remove() {
    let store = EasyStore::open_in_memory().unwrap();
    let view = store.list_view("items");
    for value in ["a", "b", "c"] {
        view.append(value).unwrap();
    }

    assert_eq!(view.get(1).unwrap(), json!("b"));
    view.remove(1).unwrap();
    assert_eq!(view.get(1).unwrap(), json!("c"));
    assert!(matches!(
        view.get(2).unwrap_err(),
        StoreError::IndexOutOfRange { .. }
    ));
}

#[cfg(target_pointer_width = "64")]
#[test]
fn list_view_set_rejects_indices_beyond_sql_range() {
    let store = EasyStore::open_in_memory().unwrap();
    store.list_replace_all("tasks", &["a", "b"]).unwrap();

    for index in [usize::MAX, i64::MAX as usize + 1] {
        let err = store.list_view("tasks").set(index, &1).unwrap_err();
        assert!(matches!(
            err,
            StoreError::IndexOutOfRange { index: got, len: 2, .. } if got == index
        ));
    }

    assert_eq!(
        store.list_get_all("tasks").unwrap(),
        vec![json!("a"), json!("b")]
    );
    assert_eq!(stored_indices(&store, "tasks"), vec![0, 1]);
}
