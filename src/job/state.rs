//! Job lifecycle states
//!
//! States are single bits so that families of states can be tested with a
//! mask rather than a chain of equality checks.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobState {
    /// Submitted, not yet validated for dependencies
    New,
    /// Waiting on dependencies
    Depend,
    /// Waiting for a priority to be assigned
    Priority,
    /// Waiting for the scheduler
    Sched,
    /// Resources allocated, executing
    Run,
    /// Execution finished, releasing resources
    Cleanup,
    /// Finished
    Inactive,
}

impl JobState {
    /// All states in lifecycle order
    pub const ALL: [JobState; 7] = [
        JobState::New,
        JobState::Depend,
        JobState::Priority,
        JobState::Sched,
        JobState::Run,
        JobState::Cleanup,
        JobState::Inactive,
    ];

    /// DEPEND, PRIORITY or SCHED
    pub const PENDING: u32 = JobState::Depend.bit() | JobState::Priority.bit() | JobState::Sched.bit();
    /// RUN or CLEANUP
    pub const RUNNING: u32 = JobState::Run.bit() | JobState::Cleanup.bit();
    /// Any state other than NEW and INACTIVE
    pub const ACTIVE: u32 = JobState::PENDING | JobState::RUNNING;

    /// Returns the state's bit value
    pub const fn bit(&self) -> u32 {
        match self {
            JobState::New => 1,
            JobState::Depend => 2,
            JobState::Priority => 4,
            JobState::Sched => 8,
            JobState::Run => 16,
            JobState::Cleanup => 32,
            JobState::Inactive => 64,
        }
    }

    /// Maps a bit value back to a state
    pub fn from_bit(bit: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.bit() == bit)
    }

    /// True if the state is in the given mask
    pub fn matches(&self, mask: u32) -> bool {
        self.bit() & mask != 0
    }

    /// True for RUN and CLEANUP
    pub fn is_running(&self) -> bool {
        self.matches(Self::RUNNING)
    }

    /// Long name, e.g. `SCHED`
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::New => "NEW",
            JobState::Depend => "DEPEND",
            JobState::Priority => "PRIORITY",
            JobState::Sched => "SCHED",
            JobState::Run => "RUN",
            JobState::Cleanup => "CLEANUP",
            JobState::Inactive => "INACTIVE",
        }
    }

    /// Single letter name, e.g. `S`
    pub fn abbrev(&self) -> &'static str {
        match self {
            JobState::New => "N",
            JobState::Depend => "D",
            JobState::Priority => "P",
            JobState::Sched => "S",
            JobState::Run => "R",
            JobState::Cleanup => "C",
            JobState::Inactive => "I",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
