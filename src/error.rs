//! Error types for the fallible edges of the crate.
//!
//! The computational core never fails; only decoding host-supplied documents
//! and validating selection changes can.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashboardError {
    /// A snapshot list document could not be decoded
    #[error("Invalid snapshot document: {0}")]
    InvalidSnapshot(#[source] serde_json::Error),

    /// A selection document could not be decoded
    #[error("Invalid selection: {0}")]
    InvalidSelection(#[source] serde_json::Error),

    /// A selected resource is not advertised by any node
    #[error("Unknown resource: {0}")]
    UnknownResource(String),
}

/// Result type alias for dashboard operations
pub type DashboardResult<T> = std::result::Result<T, DashboardError>;
