//! Command implementations.

pub mod list;
pub mod sweep;
pub mod watch;

pub use self::list::execute_list;
pub use self::sweep::execute_sweep;
pub use self::watch::execute_watch;

use crate::config::Config;
use crate::error::Result;
use overlay_janitor::{Janitor, JanitorConfig};
use overlay_store::SqliteRecordStore;

/// Open the configured store and build an HTTP-probing Janitor around it.
pub(crate) fn build_janitor(
    config: &Config,
    janitor_config: JanitorConfig,
) -> Result<Janitor<SqliteRecordStore>> {
    let store = SqliteRecordStore::new(&config.store.path)?;
    tracing::debug!("Opened record store at {}", config.store.path.display());
    Ok(Janitor::with_http_probe(store, janitor_config)?)
}
