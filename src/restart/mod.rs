//! Job manager restart
//!
//! On startup the job manager rebuilds its in-memory table of active jobs
//! from the KVS and resumes the lifecycle of each job as if the outage
//! never happened.
//!
//! - [`walker`]: depth-first enumeration of the sharded job namespace
//! - [`reconstruct`]: per-job record fetch and eventlog replay
//! - [`hooks`]: the job manager subsystems the protocol drives
//! - [`manager`]: the two-pass restart and the checkpoint watermark
//!
//! Any error during the walk is fatal; the job manager must not serve
//! requests after a failed restart.

pub mod errors;
pub mod hooks;
pub mod manager;
pub mod reconstruct;
pub mod walker;

pub use errors::{RestartError, RestartErrorCode, RestartResult, Severity};
pub use hooks::{
    DependencyCheck, EventPost, EventReplay, HookError, Jobtap, ReplayError, RestartHooks,
    StateAction, WaitRegistry, EVENT_EXEC_REATTACH_START, EVENT_FLUX_RESTART, JOBTAP_JOB_CREATE,
    JOBTAP_JOB_NEW,
};
pub use manager::{RestartManager, RestartSummary};
pub use reconstruct::{JobReconstructor, EVENTLOG_KEY, JOBSPEC_KEY};
pub use walker::{path_level, LeafEntry, NamespaceWalker, SHARD_DEPTH};
