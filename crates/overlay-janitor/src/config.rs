//! Configuration for Janitor operations
//!
//! Defines probe timeouts, the eviction threshold and sweep scheduling.

use crate::JanitorError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the Janitor service
///
/// Immutable once handed to a [`Janitor`](crate::Janitor).
///
/// # Examples
///
/// ```
/// use overlay_janitor::JanitorConfig;
///
/// let config = JanitorConfig::default();
/// assert_eq!(config.request_timeout_ms, 10_000);
/// assert_eq!(config.host_down_revoke_score, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JanitorConfig {
    /// Hard deadline for a single health probe (in milliseconds)
    /// Default: 10000
    pub request_timeout_ms: u64,

    /// Failure count at which a record is evicted
    /// Default: 3
    pub host_down_revoke_score: u32,

    /// How often the worker runs a sweep (in seconds)
    /// Default: 3600 (hourly)
    pub sweep_interval_secs: u64,

    /// Records of one collection evaluated at the same time
    /// Default: 1 (sequential)
    pub max_concurrent_checks: usize,

    /// Dry-run mode: log transitions without writing to the store
    /// Default: false
    pub dry_run: bool,
}

impl Default for JanitorConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: 10_000,
            host_down_revoke_score: 3,
            sweep_interval_secs: 3600,
            max_concurrent_checks: 1,
            dry_run: false,
        }
    }
}

impl JanitorConfig {
    /// Reject values the sweep cannot work with
    pub fn validate(&self) -> Result<(), JanitorError> {
        if self.request_timeout_ms == 0 {
            return Err(JanitorError::Config(
                "request_timeout_ms must be greater than 0".to_string(),
            ));
        }
        if self.host_down_revoke_score == 0 {
            return Err(JanitorError::Config(
                "host_down_revoke_score must be at least 1".to_string(),
            ));
        }
        if self.max_concurrent_checks == 0 {
            return Err(JanitorError::Config(
                "max_concurrent_checks must be at least 1".to_string(),
            ));
        }
        if self.sweep_interval_secs == 0 {
            return Err(JanitorError::Config(
                "sweep_interval_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Get probe timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Get sweep interval as Duration
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}
