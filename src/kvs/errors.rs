//! KVS client errors

use thiserror::Error;

/// Result type for KVS operations
pub type KvsResult<T> = Result<T, KvsError>;

/// Errors returned by a KVS client
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KvsError {
    #[error("{0}: not found")]
    NotFound(String),

    #[error("{0}: not a directory")]
    NotADirectory(String),

    #[error("{0}: is a directory")]
    IsADirectory(String),

    #[error("invalid key '{0}'")]
    InvalidKey(String),

    #[error("{key}: {message}")]
    Io { key: String, message: String },
}

impl KvsError {
    /// Creates an I/O error for a key
    pub fn io(key: impl Into<String>, message: impl Into<String>) -> Self {
        KvsError::Io {
            key: key.into(),
            message: message.into(),
        }
    }

    /// True if the key does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, KvsError::NotFound(_))
    }
}
