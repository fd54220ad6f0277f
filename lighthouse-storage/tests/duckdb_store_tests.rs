use lighthouse_storage::{DuckDbStore, KeyValueStore};

#[test]
fn in_memory_set_get_remove() {
    let store = DuckDbStore::open_in_memory().unwrap();
    store.set("task-list", "[]").unwrap();
    assert_eq!(store.get("task-list").unwrap().as_deref(), Some("[]"));

    store.remove("task-list").unwrap();
    assert_eq!(store.get("task-list").unwrap(), None);
    store.remove("task-list").unwrap();
}

#[test]
fn set_overwrites_existing_value() {
    let store = DuckDbStore::open_in_memory().unwrap();
    store.set("memorial", "first").unwrap();
    store.set("memorial", "second").unwrap();
    assert_eq!(store.get("memorial").unwrap().as_deref(), Some("second"));
    assert_eq!(store.keys().unwrap(), vec!["memorial".to_string()]);
}

#[test]
fn keys_are_sorted_and_clear_empties() {
    let store = DuckDbStore::open_in_memory().unwrap();
    for key in ["user-record", "memorial", "task-list"] {
        store.set(key, "v").unwrap();
    }
    assert_eq!(
        store.keys().unwrap(),
        vec!["memorial".to_string(), "task-list".into(), "user-record".into()]
    );

    store.clear().unwrap();
    assert!(store.keys().unwrap().is_empty());
}

#[test]
fn values_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lighthouse.duckdb");

    {
        let store = DuckDbStore::open(&path).unwrap();
        store.set("memorial", "kept").unwrap();
        store.set("user-record", "erased").unwrap();
        store.remove("user-record").unwrap();
        store.checkpoint().unwrap();
    }

    let reopened = DuckDbStore::open(&path).unwrap();
    assert_eq!(reopened.get("memorial").unwrap().as_deref(), Some("kept"));
    assert!(!reopened.contains("user-record").unwrap());
}
