//! Integration tests for overlay-store
//!
//! These tests exercise the SQLite store through the `RecordStore` trait.

use overlay_domain::{Collection, CounterField, PeerRecord, RecordId, RecordStore};
use overlay_store::{SqliteRecordStore, StoreError};

fn slap_record() -> PeerRecord {
    PeerRecord {
        service_url: Some("https://lookup.example.com".to_string()),
        protocols: vec![
            "wss://lookup.example.com".to_string(),
            "https://lookup.example.com".to_string(),
        ],
        down: 1,
        ..Default::default()
    }
}

fn down_of(store: &SqliteRecordStore, id: &RecordId) -> u32 {
    let record = store.get_record(Collection::Ship, id).unwrap();
    record.expect("record should exist").down
}

#[test]
fn test_store_initialization() {
    let store = SqliteRecordStore::open_in_memory();
    assert!(store.is_ok(), "Store should initialize successfully");
}

#[tokio::test]
async fn test_fetch_all_preserves_fields() {
    let store = SqliteRecordStore::open_in_memory().unwrap();
    let id = store.insert_record(Collection::Slap, slap_record()).unwrap();

    let records = store.fetch_all(Collection::Slap).await.unwrap();
    assert_eq!(records.len(), 1);

    let record = &records[0];
    assert_eq!(record.id, id);
    assert_eq!(record.service_url.as_deref(), Some("https://lookup.example.com"));
    assert_eq!(record.protocols.len(), 2);
    assert_eq!(record.down, 1);
    assert!(record.domain.is_none());
}

#[tokio::test]
async fn test_fetch_all_insertion_order() {
    let store = SqliteRecordStore::open_in_memory().unwrap();
    for host in ["a.example.com", "b.example.com", "c.example.com"] {
        let record = PeerRecord::with_domain("", host);
        store.insert_record(Collection::Ship, record).unwrap();
    }

    let hosts: Vec<_> = store
        .fetch_all(Collection::Ship)
        .await
        .unwrap()
        .into_iter()
        .filter_map(|r| r.domain)
        .collect();
    assert_eq!(hosts, vec!["a.example.com", "b.example.com", "c.example.com"]);
}

#[tokio::test]
async fn test_increment_counter_never_negative() {
    let store = SqliteRecordStore::open_in_memory().unwrap();
    let record = PeerRecord::with_domain("p1", "a.example.com");
    let id = store.insert_record(Collection::Ship, record).unwrap();

    store
        .increment_counter(Collection::Ship, &id, CounterField::Down, 2)
        .await
        .unwrap();
    assert_eq!(down_of(&store, &id), 2);

    for _ in 0..5 {
        store
            .increment_counter(Collection::Ship, &id, CounterField::Down, -1)
            .await
            .unwrap();
    }
    assert_eq!(down_of(&store, &id), 0);
}

#[tokio::test]
async fn test_missing_record_reports_not_found() {
    let store = SqliteRecordStore::open_in_memory().unwrap();
    let missing = RecordId::new("missing");

    let inc = store
        .increment_counter(Collection::Ship, &missing, CounterField::Down, 1)
        .await;
    assert!(matches!(inc, Err(StoreError::NotFound(_))));

    let del = store.delete_record(Collection::Ship, &missing).await;
    assert!(matches!(del, Err(StoreError::NotFound(_))));
}

#[tokio::test]
async fn test_delete_only_touches_one_collection() {
    let store = SqliteRecordStore::open_in_memory().unwrap();
    let id = RecordId::new("shared");
    let record = PeerRecord::with_domain(id.clone(), "a.example.com");
    store.insert_record(Collection::Ship, record.clone()).unwrap();
    store.insert_record(Collection::Slap, record).unwrap();

    store.delete_record(Collection::Ship, &id).await.unwrap();

    assert_eq!(store.count(Collection::Ship).unwrap(), 0);
    assert_eq!(store.count(Collection::Slap).unwrap(), 1);
}

#[tokio::test]
async fn test_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("overlay.db");

    let id = {
        let store = SqliteRecordStore::new(&path).unwrap();
        let record = PeerRecord::with_domain("", "a.example.com");
        let id = store.insert_record(Collection::Ship, record).unwrap();
        store
            .increment_counter(Collection::Ship, &id, CounterField::Down, 1)
            .await
            .unwrap();
        id
    };

    let store = SqliteRecordStore::new(&path).unwrap();
    let record = store.get_record(Collection::Ship, &id).unwrap().unwrap();
    assert_eq!(record.down, 1);
}
