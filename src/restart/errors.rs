//! Restart error types
//!
//! Error codes:
//! - JOBMGR_ID_DECODE_FAILED (FATAL)
//! - JOBMGR_KVS_LOOKUP_FAILED (FATAL)
//! - JOBMGR_EVENTLOG_REPLAY_FAILED (FATAL)
//! - JOBMGR_DUPLICATE_JOB (FATAL)
//! - JOBMGR_NAMESPACE_INCONSISTENT (FATAL)
//! - JOBMGR_CHECKPOINT_RESTORE_FAILED (FATAL)
//! - JOBMGR_CHECKPOINT_COMMIT_FAILED (FATAL)
//!
//! Every error that reaches the caller of a restart is fatal: the manager
//! must not serve requests with a partially rebuilt job table. Per-job
//! resumption failures are logged and never surface here.

use std::fmt;

use crate::checkpoint::CheckpointError;
use crate::jobid::{DecodeError, JobId};
use crate::kvs::KvsError;

use super::hooks::ReplayError;

/// Severity levels for restart errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Startup must abort
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Restart error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartErrorCode {
    /// A namespace leaf is not a well-formed job ID token
    IdDecodeFailed,
    /// A KVS read failed, including not-found for a record that must exist
    KvsLookupFailed,
    /// The eventlog or jobspec could not be replayed into a job
    EventlogReplayFailed,
    /// The same job ID was restored twice
    DuplicateJob,
    /// The namespace changed shape or is malformed below the root
    NamespaceInconsistent,
    /// The checkpoint exists but could not be read or parsed
    CheckpointRestoreFailed,
    /// The checkpoint could not be committed
    CheckpointCommitFailed,
}

impl RestartErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            RestartErrorCode::IdDecodeFailed => "JOBMGR_ID_DECODE_FAILED",
            RestartErrorCode::KvsLookupFailed => "JOBMGR_KVS_LOOKUP_FAILED",
            RestartErrorCode::EventlogReplayFailed => "JOBMGR_EVENTLOG_REPLAY_FAILED",
            RestartErrorCode::DuplicateJob => "JOBMGR_DUPLICATE_JOB",
            RestartErrorCode::NamespaceInconsistent => "JOBMGR_NAMESPACE_INCONSISTENT",
            RestartErrorCode::CheckpointRestoreFailed => "JOBMGR_CHECKPOINT_RESTORE_FAILED",
            RestartErrorCode::CheckpointCommitFailed => "JOBMGR_CHECKPOINT_COMMIT_FAILED",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        Severity::Fatal
    }
}

impl fmt::Display for RestartErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Restart error with full context
#[derive(Debug, Clone)]
pub struct RestartError {
    /// Error code
    code: RestartErrorCode,
    /// Human-readable message, naming the key or job
    message: String,
    /// KVS key involved, if any
    key: Option<String>,
    /// Job involved, if any
    job_id: Option<JobId>,
}

impl RestartError {
    fn new(code: RestartErrorCode, message: String) -> Self {
        Self {
            code,
            message,
            key: None,
            job_id: None,
        }
    }

    fn with_key(mut self, key: &str) -> Self {
        self.key = Some(key.to_string());
        self
    }

    fn with_job(mut self, id: JobId) -> Self {
        self.job_id = Some(id);
        self
    }

    /// A leaf key whose name does not decode to a job ID
    pub fn decode(key: &str, cause: &DecodeError) -> Self {
        Self::new(RestartErrorCode::IdDecodeFailed, cause.to_string()).with_key(key)
    }

    /// A failed read of a key
    pub fn lookup(key: &str, cause: &KvsError) -> Self {
        Self::new(
            RestartErrorCode::KvsLookupFailed,
            format!("lookup {}: {}", key, cause),
        )
        .with_key(key)
    }

    /// A job whose records could not be replayed
    pub fn replay(key: &str, id: JobId, cause: &ReplayError) -> Self {
        Self::new(
            RestartErrorCode::EventlogReplayFailed,
            format!("replay {}: {}", key, cause),
        )
        .with_key(key)
        .with_job(id)
    }

    /// A job ID restored twice
    pub fn duplicate_job(id: JobId) -> Self {
        Self::new(
            RestartErrorCode::DuplicateJob,
            format!("could not insert job {} into active job table", id),
        )
        .with_job(id)
    }

    /// Namespace shape violation at `key`
    pub fn namespace(key: &str, reason: impl Into<String>) -> Self {
        Self::new(RestartErrorCode::NamespaceInconsistent, reason.into()).with_key(key)
    }

    /// A checkpoint failure that must abort startup
    pub fn checkpoint(cause: &CheckpointError) -> Self {
        let (code, key) = match cause {
            CheckpointError::Commit { key, .. } => (RestartErrorCode::CheckpointCommitFailed, key),
            CheckpointError::NotFound { key }
            | CheckpointError::Lookup { key, .. }
            | CheckpointError::Malformed { key, .. } => {
                (RestartErrorCode::CheckpointRestoreFailed, key)
            }
        };
        Self::new(code, cause.to_string()).with_key(key)
    }

    /// Returns the error code
    pub fn code(&self) -> RestartErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the KVS key involved, if any
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Returns the job involved, if any
    pub fn job_id(&self) -> Option<JobId> {
        self.job_id
    }

    /// All restart errors abort startup
    pub fn is_fatal(&self) -> bool {
        true
    }
}

impl fmt::Display for RestartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )
    }
}

impl std::error::Error for RestartError {}

impl From<CheckpointError> for RestartError {
    fn from(err: CheckpointError) -> Self {
        Self::checkpoint(&err)
    }
}

/// Result type for restart operations
pub type RestartResult<T> = Result<T, RestartError>;
