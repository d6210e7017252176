//! In-process record store

use crate::StoreError;
use async_trait::async_trait;
use overlay_domain::{Collection, CounterField, PeerRecord, RecordId, RecordStore};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

/// Mutex-guarded record store kept entirely in memory
///
/// Every operation holds the lock for its full duration, which makes counter
/// updates atomic with respect to other callers.
///
/// # Examples
///
/// ```
/// use overlay_domain::{Collection, PeerRecord};
/// use overlay_store::MemoryRecordStore;
///
/// let store = MemoryRecordStore::new();
/// let id = store.insert(Collection::Slap, PeerRecord::with_domain("", "svc.example.com"));
/// assert_eq!(store.get(Collection::Slap, &id).unwrap().down, 0);
/// ```
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: Mutex<HashMap<Collection, Vec<PeerRecord>>>,
    next_id: AtomicU64,
}

impl MemoryRecordStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn records(&self) -> Result<MutexGuard<'_, HashMap<Collection, Vec<PeerRecord>>>, StoreError> {
        self.records.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Add a record, assigning a sequential id when it has none
    pub fn insert(&self, collection: Collection, mut record: PeerRecord) -> RecordId {
        if record.id.is_empty() {
            let n = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
            record.id = RecordId::new(n.to_string());
        }
        let id = record.id.clone();
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        records.entry(collection).or_default().push(record);
        id
    }

    /// Snapshot of one record
    pub fn get(&self, collection: Collection, id: &RecordId) -> Option<PeerRecord> {
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        records
            .get(&collection)
            .and_then(|list| list.iter().find(|r| &r.id == id))
            .cloned()
    }

    /// Number of records in a collection
    pub fn len(&self, collection: Collection) -> usize {
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        records.get(&collection).map_or(0, Vec::len)
    }

    /// True when a collection holds no records
    pub fn is_empty(&self, collection: Collection) -> bool {
        self.len(collection) == 0
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    type Error = StoreError;

    async fn fetch_all(&self, collection: Collection) -> Result<Vec<PeerRecord>, Self::Error> {
        Ok(self.records()?.get(&collection).cloned().unwrap_or_default())
    }

    async fn increment_counter(
        &self,
        collection: Collection,
        id: &RecordId,
        field: CounterField,
        delta: i64,
    ) -> Result<(), Self::Error> {
        let mut records = self.records()?;
        let record = records
            .get_mut(&collection)
            .and_then(|list| list.iter_mut().find(|r| &r.id == id))
            .ok_or_else(|| StoreError::NotFound(format!("{}/{}", collection, id)))?;

        let counter = match field {
            CounterField::Down => &mut record.down,
        };
        let next = (i64::from(*counter) + delta).clamp(0, i64::from(u32::MAX));
        *counter = next as u32;
        Ok(())
    }

    async fn delete_record(
        &self,
        collection: Collection,
        id: &RecordId,
    ) -> Result<(), Self::Error> {
        let mut records = self.records()?;
        let list = records.entry(collection).or_default();
        let before = list.len();
        list.retain(|r| &r.id != id);

        if list.len() == before {
            return Err(StoreError::NotFound(format!("{}/{}", collection, id)));
        }
        Ok(())
    }
}
