use crate::cursor::{CursorStore, JsonCursorStore, LogIndexCursor, MemoryCursorStore};
use chrono::{Duration as ChronoDuration, Utc};
use pretty_assertions::assert_eq;
use std::time::Duration;
use tempfile::tempdir;

fn indexed_cursor(path: &str, docs: u64) -> LogIndexCursor {
    let mut cursor = LogIndexCursor::new(path);
    cursor.document_count = docs;
    cursor.last_position = 42;
    cursor.last_indexed_at = Some(Utc::now());
    cursor
}

/// Behaviour every backend must share.
fn exercise_store(store: &dyn CursorStore) {
    // Unknown paths yield an enabled cursor grouped under the main log path.
    let fresh = store.get("/var/log/nginx/access.log.2.gz").unwrap();
    assert!(fresh.enabled);
    assert_eq!(fresh.main_log_path, "/var/log/nginx/access.log");
    assert_eq!(fresh.last_position, 0);
    assert!(store.find("/var/log/nginx/access.log.2.gz").unwrap().is_none());

    store.save(&indexed_cursor("/a.log", 10)).unwrap();
    store.save(&indexed_cursor("/a.log.1", 5)).unwrap();
    let mut disabled = indexed_cursor("/b.log", 7);
    disabled.enabled = false;
    store.save(&disabled).unwrap();

    assert_eq!(store.get("/a.log").unwrap().last_position, 42);

    let all: Vec<String> = store.get_all().unwrap().into_iter().map(|c| c.path).collect();
    assert_eq!(all, vec!["/a.log", "/a.log.1"]);

    let stats = store.stats().unwrap();
    assert_eq!(stats.total_files, 3);
    assert_eq!(stats.enabled_files, 2);
    assert_eq!(stats.total_documents, 22);

    store.delete("/a.log.1").unwrap();
    assert!(store.find("/a.log.1").unwrap().is_none());

    store.delete_all().unwrap();
    assert_eq!(store.stats().unwrap().total_files, 0);
}

#[test]
fn memory_store_contract() {
    exercise_store(&MemoryCursorStore::new());
}

#[test]
fn json_store_contract() {
    let dir = tempdir().unwrap();
    exercise_store(&JsonCursorStore::open(dir.path().join("cursors.json")).unwrap());
}

#[test]
fn json_store_survives_reopen() {
    // Arrange
    let dir = tempdir().unwrap();
    let path = dir.path().join("state/cursors.json");
    let store = JsonCursorStore::open(&path).unwrap();
    let mut cursor = indexed_cursor("/a.log", 3);
    cursor.expand_time_range(100, 200);
    store.save(&cursor).unwrap();

    // Act
    let reopened = JsonCursorStore::open(&path).unwrap();

    // Assert
    assert_eq!(reopened.find("/a.log").unwrap(), Some(cursor));
}

#[test]
fn json_store_keeps_memory_in_step_with_disk_when_a_write_fails() {
    // Arrange
    let dir = tempdir().unwrap();
    let state = dir.path().join("state");
    let store = JsonCursorStore::open(state.join("cursors.json")).unwrap();
    let kept = indexed_cursor("/a.log", 3);
    store.save(&kept).unwrap();
    std::fs::remove_dir_all(&state).unwrap();
    std::fs::write(&state, "not a directory").unwrap();

    // Act
    let saved = store.save(&indexed_cursor("/b.log", 5));
    let deleted = store.delete("/a.log");

    // Assert
    assert!(saved.is_err());
    assert!(deleted.is_err());
    assert_eq!(store.find("/b.log").unwrap(), None);
    assert_eq!(store.find("/a.log").unwrap(), Some(kept));
}

#[test]
fn json_store_rejects_corrupt_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cursors.json");
    std::fs::write(&path, "{not json").unwrap();

    assert!(JsonCursorStore::open(&path).is_err());
}

#[test]
fn cleanup_removes_only_stale_cursors() {
    // Arrange
    let store = MemoryCursorStore::new();
    let mut stale = indexed_cursor("/old.log", 1);
    stale.last_indexed_at = Some(Utc::now() - ChronoDuration::days(10));
    store.save(&stale).unwrap();
    store.save(&indexed_cursor("/new.log", 1)).unwrap();
    store.save(&LogIndexCursor::new("/never.log")).unwrap();

    // Act
    let removed = store.cleanup_old(Duration::from_secs(86_400)).unwrap();

    // Assert
    assert_eq!(removed, 1);
    assert!(store.find("/old.log").unwrap().is_none());
    assert!(store.find("/new.log").unwrap().is_some());
    assert!(store.find("/never.log").unwrap().is_some());
}

#[test]
fn time_range_only_expands() {
    let mut cursor = LogIndexCursor::new("/a.log");

    cursor.expand_time_range(100, 200);
    cursor.expand_time_range(150, 180);
    cursor.expand_time_range(50, 300);

    assert_eq!(cursor.time_range_start, Some(50));
    assert_eq!(cursor.time_range_end, Some(300));
}
