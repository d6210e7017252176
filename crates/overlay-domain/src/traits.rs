//! Trait definitions for external interactions
//!
//! These traits define the boundaries between domain logic and infrastructure.
//! Infrastructure implementations live in other crates.

use crate::{Collection, PeerRecord, RecordId};
use async_trait::async_trait;
use std::fmt;

/// Numeric record fields a maintenance service may adjust
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CounterField {
    /// Failed health check counter
    Down,
}

impl CounterField {
    /// Document field name
    pub fn as_str(&self) -> &'static str {
        match self {
            CounterField::Down => "down",
        }
    }
}

impl fmt::Display for CounterField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trait for reading and maintaining peer records
///
/// Implemented by the infrastructure layer (overlay-store).
///
/// Counter updates must be applied by the store itself in a single atomic
/// operation; callers never read-modify-write a local copy.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Error type for store operations
    type Error: fmt::Display + Send + Sync;

    /// Fetch every record in a collection
    async fn fetch_all(&self, collection: Collection) -> Result<Vec<PeerRecord>, Self::Error>;

    /// Atomically add `delta` to a counter field of one record
    async fn increment_counter(
        &self,
        collection: Collection,
        id: &RecordId,
        field: CounterField,
        delta: i64,
    ) -> Result<(), Self::Error>;

    /// Permanently remove a record
    async fn delete_record(&self, collection: Collection, id: &RecordId) -> Result<(), Self::Error>;
}

#[async_trait]
impl<T: RecordStore + ?Sized> RecordStore for std::sync::Arc<T> {
    type Error = T::Error;

    async fn fetch_all(&self, collection: Collection) -> Result<Vec<PeerRecord>, Self::Error> {
        (**self).fetch_all(collection).await
    }

    async fn increment_counter(
        &self,
        collection: Collection,
        id: &RecordId,
        field: CounterField,
        delta: i64,
    ) -> Result<(), Self::Error> {
        (**self).increment_counter(collection, id, field, delta).await
    }

    async fn delete_record(
        &self,
        collection: Collection,
        id: &RecordId,
    ) -> Result<(), Self::Error> {
        (**self).delete_record(collection, id).await
    }
}
