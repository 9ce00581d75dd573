//! Collaborators of the restart protocol
//!
//! The restart core rebuilds state and resumes lifecycle processing, but the
//! subsystems it drives live elsewhere in the job manager. Each is reached
//! through a narrow trait so the protocol can run against fakes.
//!
//! [`RestartHooks`] is implemented for any type that implements all five
//! hook traits, so one object can stand in for the whole job manager.

use serde_json::Value;
use thiserror::Error;

use crate::job::Job;
use crate::jobid::JobId;

/// Plugin callback issued when a job is first created
pub const JOBTAP_JOB_CREATE: &str = "job.create";
/// Plugin callback issued when a job is first seen in NEW
pub const JOBTAP_JOB_NEW: &str = "job.new";
/// Event posted to SCHED jobs so they return to PRIORITY
pub const EVENT_FLUX_RESTART: &str = "flux-restart";
/// Debug event posted to running jobs that will be reattached
pub const EVENT_EXEC_REATTACH_START: &str = "debug.exec-reattach-start";

/// Failure reported by a collaborator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct HookError(String);

impl HookError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

/// Eventlog or jobspec could not be replayed into a job
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ReplayError(String);

impl ReplayError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

/// Rebuilds a job from its persisted records
pub trait EventReplay {
    /// Replays `eventlog` against `jobspec`, returning the job with state,
    /// flags and priority derived from the full event history.
    fn replay(&self, id: JobId, eventlog: &str, jobspec: &str) -> Result<Job, ReplayError>;
}

/// Dependency evaluator
pub trait DependencyCheck {
    /// (Re)checks the job's dependencies; `restart` is true when called
    /// during restart.
    fn check_dependencies(&mut self, job: &mut Job, restart: bool) -> Result<(), HookError>;
}

/// Jobtap plugin dispatcher
pub trait Jobtap {
    /// Invokes plugin callbacks for `topic` on `job`
    fn jobtap_call(&mut self, job: &mut Job, topic: &str, args: Option<&Value>)
        -> Result<(), HookError>;
}

/// Event posting subsystem, which drives the job state machine
pub trait EventPost {
    /// Appends an event to the job's eventlog and applies it
    fn post_event(&mut self, job: &mut Job, name: &str, context: Option<Value>)
        -> Result<(), HookError>;
}

/// Registry of jobs that may be waited on
pub trait WaitRegistry {
    /// Records an active waitable job so waiters can be satisfied later
    fn notify_active(&mut self, job: &Job);
}

/// Per-state side effects of the job state machine
pub trait StateAction {
    /// Re-establishes the side effects of the job's current state
    fn job_action(&mut self, job: &mut Job) -> Result<(), HookError>;
}

/// Everything the restart protocol calls out to
pub trait RestartHooks: DependencyCheck + Jobtap + EventPost + WaitRegistry + StateAction {}

impl<T> RestartHooks for T where
    T: DependencyCheck + Jobtap + EventPost + WaitRegistry + StateAction + ?Sized
{
}
