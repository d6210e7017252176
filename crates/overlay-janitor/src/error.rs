//! Error types for Janitor operations

use thiserror::Error;

/// Errors that can occur during Janitor operations
#[derive(Error, Debug)]
pub enum JanitorError {
    /// Storage layer error
    #[error("Storage error: {0}")]
    Store(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Peer address could not be turned into a probe target
    #[error("Invalid address: {0}")]
    Address(#[from] crate::address::AddressError),

    /// HTTP client construction failed
    #[error("HTTP client error: {0}")]
    Client(String),

    /// The sweep loop itself failed; no report was produced
    #[error("Sweep aborted: {0}")]
    Aborted(String),
}
