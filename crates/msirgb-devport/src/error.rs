//! Error types for port file operations

use thiserror::Error;

/// Port file specific errors
#[derive(Debug, Error)]
pub enum DevPortError {
    /// Failed to open the port file
    #[error("Failed to open {path}: {source}")]
    OpenFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to create the dry-run port file
    #[error("Failed to create {path}: {source}")]
    CreateFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to seek to a port address
    #[error("Failed to seek to port {port:#06x}: {source}")]
    SeekFailed {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    /// Read or write returned an error
    #[error("I/O on port {port:#06x} failed: {source}")]
    TransferFailed {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    /// Read or write moved a byte count other than one
    #[error("Short transfer on port {port:#06x}: {count} bytes instead of 1")]
    ShortTransfer { port: u16, count: usize },

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl DevPortError {
    /// Returns true if the failure looks like missing privileges
    pub fn is_permission_denied(&self) -> bool {
        match self {
            Self::OpenFailed { source, .. } | Self::CreateFailed { source, .. } => {
                source.kind() == std::io::ErrorKind::PermissionDenied
            }
            _ => false,
        }
    }
}

/// Result type for port file operations
pub type Result<T> = std::result::Result<T, DevPortError>;
