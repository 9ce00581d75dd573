//! Checkpoint error types
//!
//! A missing checkpoint is a distinct, expected outcome (first start of a
//! fresh instance) and is reported as [`CheckpointError::NotFound`] so
//! callers can treat it as "use the default".

use thiserror::Error;

use crate::kvs::KvsError;

/// Result type for checkpoint operations
pub type CheckpointResult<T> = Result<T, CheckpointError>;

/// Checkpoint errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckpointError {
    #[error("checkpoint {key} not found")]
    NotFound { key: String },

    #[error("lookup {key}: {source}")]
    Lookup {
        key: String,
        #[source]
        source: KvsError,
    },

    #[error("checkpoint {key} is malformed: {message}")]
    Malformed { key: String, message: String },

    #[error("commit {key}: {source}")]
    Commit {
        key: String,
        #[source]
        source: KvsError,
    },
}

impl CheckpointError {
    /// Returns the error code
    pub fn code(&self) -> &'static str {
        match self {
            CheckpointError::NotFound { .. } => "JOBMGR_CHECKPOINT_NOT_FOUND",
            CheckpointError::Lookup { .. } | CheckpointError::Malformed { .. } => {
                "JOBMGR_CHECKPOINT_RESTORE_FAILED"
            }
            CheckpointError::Commit { .. } => "JOBMGR_CHECKPOINT_COMMIT_FAILED",
        }
    }

    /// True if no checkpoint record exists
    pub fn is_not_found(&self) -> bool {
        matches!(self, CheckpointError::NotFound { .. })
    }
}
