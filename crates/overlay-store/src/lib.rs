//! Overlay Storage Layer
//!
//! Implements the `RecordStore` trait for peer records.
//!
//! # Backends
//!
//! - `SqliteRecordStore`: persistent storage, counters updated with a single SQL statement
//! - `MemoryRecordStore`: mutex-guarded in-process store for tests and embedding
//!
//! # Examples
//!
//! ```no_run
//! use overlay_domain::{Collection, PeerRecord};
//! use overlay_store::SqliteRecordStore;
//!
//! let store = SqliteRecordStore::new("overlay.db").unwrap();
//! let id = store
//!     .insert_record(Collection::Ship, PeerRecord::with_domain("", "node.example.com"))
//!     .unwrap();
//! println!("registered {}", id);
//! ```

#![warn(missing_docs)]

pub mod memory;

use async_trait::async_trait;
use overlay_domain::{Collection, CounterField, PeerRecord, RecordId, RecordStore};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;

pub use memory::MemoryRecordStore;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Record not found
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// A previous holder of the store lock panicked
    #[error("Store lock poisoned")]
    Poisoned,
}

/// SQLite-based implementation of RecordStore
///
/// The connection is guarded by a mutex so a single store can be shared
/// between the janitor and other readers.
pub struct SqliteRecordStore {
    conn: Mutex<Connection>,
}

impl SqliteRecordStore {
    /// Open (or create) a store at the given database path
    ///
    /// Use `:memory:` for an in-memory database.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    /// Open a fresh in-memory store
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(include_str!("schema.sql"))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Register a record, returning its identifier
    ///
    /// A record with an empty id is given a fresh UUIDv7.
    pub fn insert_record(
        &self,
        collection: Collection,
        record: PeerRecord,
    ) -> Result<RecordId, StoreError> {
        let id = if record.id.is_empty() {
            RecordId::new(uuid::Uuid::now_v7().to_string())
        } else {
            record.id.clone()
        };
        let protocols = serde_json::to_string(&record.protocols)
            .map_err(|e| StoreError::InvalidData(e.to_string()))?;

        self.conn()?.execute(
            "INSERT INTO peer_records (collection, id, domain, url, service_url, protocols, down)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                collection.as_str(),
                id.as_str(),
                record.domain,
                record.url,
                record.service_url,
                protocols,
                i64::from(record.down),
            ],
        )?;

        Ok(id)
    }

    /// Get a single record
    pub fn get_record(
        &self,
        collection: Collection,
        id: &RecordId,
    ) -> Result<Option<PeerRecord>, StoreError> {
        let record = self
            .conn()?
            .query_row(
                "SELECT id, domain, url, service_url, protocols, down
                 FROM peer_records WHERE collection = ?1 AND id = ?2",
                params![collection.as_str(), id.as_str()],
                Self::row_to_record,
            )
            .optional()?;

        Ok(record)
    }

    /// Number of records in a collection
    pub fn count(&self, collection: Collection) -> Result<usize, StoreError> {
        let count: i64 = self.conn()?.query_row(
            "SELECT COUNT(*) FROM peer_records WHERE collection = ?1",
            params![collection.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<PeerRecord> {
        let protocols: String = row.get(4)?;
        let protocols: Vec<String> = serde_json::from_str(&protocols).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
        })?;
        let down: i64 = row.get(5)?;

        Ok(PeerRecord {
            id: RecordId::new(row.get::<_, String>(0)?),
            domain: row.get(1)?,
            url: row.get(2)?,
            service_url: row.get(3)?,
            protocols,
            down: u32::try_from(down.max(0)).unwrap_or(u32::MAX),
        })
    }

    /// Column backing a counter field
    fn counter_column(field: CounterField) -> &'static str {
        match field {
            CounterField::Down => "down",
        }
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    type Error = StoreError;

    async fn fetch_all(&self, collection: Collection) -> Result<Vec<PeerRecord>, Self::Error> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, domain, url, service_url, protocols, down
             FROM peer_records WHERE collection = ?1 ORDER BY rowid",
        )?;
        let records = stmt
            .query_map(params![collection.as_str()], Self::row_to_record)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    async fn increment_counter(
        &self,
        collection: Collection,
        id: &RecordId,
        field: CounterField,
        delta: i64,
    ) -> Result<(), Self::Error> {
        // Single statement: the read and the write cannot interleave with another writer
        let sql = format!(
            "UPDATE peer_records SET {col} = MAX({col} + ?1, 0) WHERE collection = ?2 AND id = ?3",
            col = Self::counter_column(field)
        );
        let updated = self
            .conn()?
            .execute(&sql, params![delta, collection.as_str(), id.as_str()])?;

        if updated == 0 {
            return Err(StoreError::NotFound(format!("{}/{}", collection, id)));
        }
        Ok(())
    }

    async fn delete_record(
        &self,
        collection: Collection,
        id: &RecordId,
    ) -> Result<(), Self::Error> {
        let deleted = self.conn()?.execute(
            "DELETE FROM peer_records WHERE collection = ?1 AND id = ?2",
            params![collection.as_str(), id.as_str()],
        )?;

        if deleted == 0 {
            return Err(StoreError::NotFound(format!("{}/{}", collection, id)));
        }
        Ok(())
    }
}
