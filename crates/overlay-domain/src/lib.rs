//! Overlay Domain Layer
//!
//! Core vocabulary shared by the overlay maintenance services: peer records,
//! the collections they live in, and the trait boundary to the record store.
//!
//! ## Key Concepts
//!
//! - **Peer record**: a stored entry advertising one network service endpoint
//! - **Collection**: the discovery category a record belongs to (SHIP or SLAP)
//! - **Down counter**: saturating failure count that drives eviction
//!
//! ## Architecture
//!
//! This crate holds no infrastructure. Store implementations live in
//! `overlay-store`, the health sweep lives in `overlay-janitor`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod collection;
pub mod record;
pub mod traits;

// Re-exports for convenience
pub use collection::Collection;
pub use record::{PeerRecord, RecordId};
pub use traits::{CounterField, RecordStore};
