//! In-memory job model
//!
//! A [`Job`] is produced by replaying the job's eventlog and is owned by the
//! [`ActiveJobs`] table for as long as the job is active.

mod flags;
mod priority;
mod state;
mod table;

pub use flags::JobFlags;
pub use priority::{Priority, PRIORITY_UNSET};
pub use state::JobState;
pub use table::{ActiveJobs, DuplicateJob};

use serde::{Deserialize, Serialize};

use crate::jobid::JobId;

/// Default urgency assigned at submission
pub const URGENCY_DEFAULT: u32 = 16;

/// An active job as reconstructed from its eventlog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Job identifier
    pub id: JobId,
    /// Submitting user
    pub userid: u32,
    /// Submitter-requested urgency
    pub urgency: u32,
    /// Submission time (seconds since the epoch)
    pub t_submit: f64,
    /// Current lifecycle state
    pub state: JobState,
    /// Submission flags
    pub flags: JobFlags,
    /// Scheduling priority
    pub priority: Priority,
    /// Set on restart for jobs that were already running, so the
    /// execution layer reconnects instead of launching them again.
    #[serde(skip)]
    pub reattach: bool,
}

impl Job {
    /// Creates a job in the NEW state with no priority
    pub fn new(id: JobId) -> Self {
        Self {
            id,
            userid: 0,
            urgency: URGENCY_DEFAULT,
            t_submit: 0.0,
            state: JobState::New,
            flags: JobFlags::NONE,
            priority: Priority::Unset,
            reattach: false,
        }
    }

    /// Sets the state
    pub fn with_state(mut self, state: JobState) -> Self {
        self.state = state;
        self
    }

    /// Sets the flags
    pub fn with_flags(mut self, flags: JobFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Sets the priority
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn is_waitable(&self) -> bool {
        self.flags.contains(JobFlags::WAITABLE)
    }

    pub fn is_debug(&self) -> bool {
        self.flags.contains(JobFlags::DEBUG)
    }
}
