use devjournal_core::legacy::migration::read_legacy_snapshot;
use devjournal_core::{
    migrate_legacy_snapshot, EntryId, FileKeyValueStore, JournalStore, LegacyKeyValueStore,
    MemoryKeyValueStore, MigrationError, LEGACY_ENTRIES_KEY,
};

const SNAPSHOT: &str = r#"[
    {"id": 1700000000000, "date": "2024-11-14", "mainEntry": "numeric id", "timestamp": "2024-11-14T09:00:00.000Z"},
    {"id": "abc", "date": "2024-11-15", "mainEntry": "string id", "subEntries": ["one"], "timestamp": "2024-11-15T09:00:00.000Z"}
]"#;

#[tokio::test]
async fn migration_moves_every_snapshot_entry() {
    let store = JournalStore::in_memory();
    let legacy = MemoryKeyValueStore::with_item(LEGACY_ENTRIES_KEY, SNAPSHOT);

    let moved = migrate_legacy_snapshot(&store, &legacy).await.unwrap();

    assert_eq!(moved, 2);
    let numeric = store
        .get_by_id(&EntryId::from("1700000000000"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(numeric.main_entry, "numeric id");
    assert!(numeric.imported);
    let string = store.get_by_id(&EntryId::from("abc")).await.unwrap().unwrap();
    assert_eq!(string.sub_entries, Some(vec!["one".to_string()]));
    assert_eq!(string.timestamp, "2024-11-15T09:00:00.000Z");
}

#[tokio::test]
async fn migration_does_not_erase_the_snapshot() {
    let store = JournalStore::in_memory();
    let legacy = MemoryKeyValueStore::with_item(LEGACY_ENTRIES_KEY, SNAPSHOT);

    migrate_legacy_snapshot(&store, &legacy).await.unwrap();

    assert!(legacy.get_item(LEGACY_ENTRIES_KEY).unwrap().is_some());
}

#[tokio::test]
async fn rerunning_migration_does_not_duplicate_rows() {
    let store = JournalStore::in_memory();
    let legacy = MemoryKeyValueStore::with_item(LEGACY_ENTRIES_KEY, SNAPSHOT);

    migrate_legacy_snapshot(&store, &legacy).await.unwrap();
    migrate_legacy_snapshot(&store, &legacy).await.unwrap();

    assert_eq!(store.count().await.unwrap(), 2);
}

#[tokio::test]
async fn rerunning_migration_keeps_rows_without_ids_single() {
    let store = JournalStore::in_memory();
    let legacy = MemoryKeyValueStore::with_item(
        LEGACY_ENTRIES_KEY,
        r#"[
            {"date": "2024-01-01", "mainEntry": "no id"},
            {"id": 0, "date": "2024-01-02", "mainEntry": "zero id"},
            {"id": "", "date": "2024-01-03", "mainEntry": "blank id"}
        ]"#,
    );

    assert_eq!(migrate_legacy_snapshot(&store, &legacy).await.unwrap(), 3);
    assert_eq!(migrate_legacy_snapshot(&store, &legacy).await.unwrap(), 3);

    assert_eq!(store.count().await.unwrap(), 3);
}

#[tokio::test]
async fn missing_or_empty_snapshot_moves_nothing() {
    let store = JournalStore::in_memory();

    let absent = MemoryKeyValueStore::new();
    assert_eq!(migrate_legacy_snapshot(&store, &absent).await.unwrap(), 0);

    let empty_list = MemoryKeyValueStore::with_item(LEGACY_ENTRIES_KEY, "[]");
    assert_eq!(migrate_legacy_snapshot(&store, &empty_list).await.unwrap(), 0);

    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn corrupt_snapshot_is_a_parse_error() {
    let store = JournalStore::in_memory();
    let legacy = MemoryKeyValueStore::with_item(LEGACY_ENTRIES_KEY, "{not a list");

    let err = migrate_legacy_snapshot(&store, &legacy).await.unwrap_err();

    assert!(matches!(err, MigrationError::Parse(_)));
    assert_eq!(store.count().await.unwrap(), 0);
}

#[test]
fn entries_without_ids_get_stable_derived_ones() {
    let legacy = MemoryKeyValueStore::with_item(
        LEGACY_ENTRIES_KEY,
        r#"[
            {"date": "2024-01-01", "mainEntry": "same text"},
            {"date": "2024-01-01", "mainEntry": "same text"}
        ]"#,
    );

    let first_read = read_legacy_snapshot(&legacy).unwrap();
    let second_read = read_legacy_snapshot(&legacy).unwrap();

    assert_eq!(first_read.len(), 2);
    assert!(!first_read[0].id.as_str().is_empty());
    assert_ne!(first_read[0].id, first_read[1].id);
    assert_eq!(first_read[0].id, second_read[0].id);
    assert_eq!(first_read[1].id, second_read[1].id);
    assert!(!first_read[0].timestamp.is_empty());
    assert!(first_read[0].imported);
}

#[tokio::test]
async fn file_snapshot_migrates_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy_storage.json");
    let mut legacy = FileKeyValueStore::new(&path);
    legacy.set_item(LEGACY_ENTRIES_KEY, SNAPSHOT).unwrap();

    let reopened = FileKeyValueStore::new(&path);
    let store = JournalStore::in_memory();

    assert_eq!(migrate_legacy_snapshot(&store, &reopened).await.unwrap(), 2);
}
