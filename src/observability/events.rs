//! Observable job manager events
//!
//! Every log line emitted by the restart path names one of these events.

use std::fmt;

use super::logger::Severity;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Restart
    /// Restart from the KVS begins
    RestartBegin,
    /// Namespace walk finished, table rebuilt
    RestartJobsLoaded,
    /// State action failed for a replayed job
    RestartReplayWarning,
    /// Dependency re-check failed for a job
    RestartDependencyCheckFailed,
    /// A jobtap plugin callback failed
    RestartJobtapCallFailed,
    /// Posting a resumption event failed
    RestartEventPostFailed,
    /// Running jobs counted
    RestartRunningJobs,
    /// No checkpoint record in the KVS
    RestartCheckpointNotFound,
    /// Final watermark after reconciliation
    RestartMaxJobid,
    /// Restart finished, manager may serve requests
    RestartComplete,
    /// Restart aborted (FATAL)
    RestartFailed,

    // Checkpoint
    /// Checkpoint committed
    CheckpointSaved,
    /// Checkpoint commit failed
    CheckpointSaveFailed,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::RestartBegin => "RESTART_BEGIN",
            Event::RestartJobsLoaded => "RESTART_JOBS_LOADED",
            Event::RestartReplayWarning => "RESTART_REPLAY_WARNING",
            Event::RestartDependencyCheckFailed => "RESTART_DEPENDENCY_CHECK_FAILED",
            Event::RestartJobtapCallFailed => "RESTART_JOBTAP_CALL_FAILED",
            Event::RestartEventPostFailed => "RESTART_EVENT_POST_FAILED",
            Event::RestartRunningJobs => "RESTART_RUNNING_JOBS",
            Event::RestartCheckpointNotFound => "RESTART_CHECKPOINT_NOT_FOUND",
            Event::RestartMaxJobid => "RESTART_MAX_JOBID",
            Event::RestartComplete => "RESTART_COMPLETE",
            Event::RestartFailed => "RESTART_FAILED",
            Event::CheckpointSaved => "CHECKPOINT_SAVED",
            Event::CheckpointSaveFailed => "CHECKPOINT_SAVE_FAILED",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::RestartMaxJobid => Severity::Trace,
            Event::RestartReplayWarning => Severity::Warn,
            Event::RestartDependencyCheckFailed
            | Event::RestartJobtapCallFailed
            | Event::RestartEventPostFailed
            | Event::CheckpointSaveFailed => Severity::Error,
            Event::RestartFailed => Severity::Fatal,
            _ => Severity::Info,
        }
    }

    /// Returns true if this event indicates a fatal condition
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
