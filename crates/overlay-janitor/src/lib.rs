//! Overlay Janitor
//!
//! Health maintenance for advertised overlay peers.
//!
//! # Overview
//!
//! Hosts advertise themselves through SHIP and SLAP records. The Janitor
//! periodically checks that each advertised host is still reachable and evicts
//! the ones that keep failing:
//! - **Address extraction**: `domain`, then `url`, then `serviceURL`, then the first
//!   `https://` protocol
//! - **Validation**: only domain names, `localhost` and IPv4 hosts are probed
//! - **Probing**: `GET /health` with a hard deadline, healthy only on `{"status": "ok"}`
//! - **Eviction**: a saturating `down` counter per record, deleted at the revoke score
//!
//! ## Record Lifecycle
//!
//! | Check result | `down` before | Store write |
//! |--------------|---------------|-------------|
//! | healthy | 0 | none |
//! | healthy | > 0 | `down -= 1` |
//! | unhealthy | `down + 1 < revoke score` | `down += 1` |
//! | unhealthy | `down + 1 >= revoke score` | delete |
//! | no address | any | none |
//!
//! # Usage
//!
//! ## One-time Sweep
//!
//! ```no_run
//! use overlay_janitor::{Janitor, JanitorConfig};
//! use overlay_store::SqliteRecordStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = SqliteRecordStore::new("overlay.db")?;
//! let janitor = Janitor::with_http_probe(store, JanitorConfig::default())?;
//!
//! let report = janitor.run().await?;
//! println!("{}", report.summary());
//! # Ok(())
//! # }
//! ```
//!
//! ## Background Worker
//!
//! ```no_run
//! use overlay_janitor::{Janitor, JanitorConfig, JanitorWorker};
//! use overlay_store::SqliteRecordStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = SqliteRecordStore::new("overlay.db")?;
//!     let janitor = Janitor::with_http_probe(store, JanitorConfig::default())?;
//!
//!     // Run indefinitely (until Ctrl+C)
//!     JanitorWorker::from_config(janitor).run().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Configuration
//!
//! The Janitor can be configured via TOML:
//!
//! ```toml
//! [janitor]
//! request_timeout_ms = 10000
//! host_down_revoke_score = 3
//! sweep_interval_secs = 3600
//! max_concurrent_checks = 1
//! dry_run = false
//! ```
//!
//! # Logging
//!
//! All events go through `tracing`, inside the span given to
//! [`Janitor::with_span`]. Routine transitions log at `info`, timeouts and
//! invalid hosts at `warn`, collection failures at `error`.

#![warn(missing_docs)]

pub mod address;
mod config;
mod error;
mod janitor;
mod metrics;
pub mod probe;
mod transition;
mod worker;

pub use config::JanitorConfig;
pub use error::JanitorError;
pub use janitor::{Fallback, Janitor, RecordOutcome, Verdict};
pub use metrics::{CollectionReport, JanitorMetrics, SweepReport};
pub use probe::{HealthProbe, HttpProbe, ProbeFailure, ProbeOutcome};
pub use transition::Transition;
pub use worker::JanitorWorker;
