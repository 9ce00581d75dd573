//! jobmgr - job manager startup recovery
//!
//! Rebuilds the active job table from a hierarchical key-value store after
//! a restart and resumes each job's lifecycle.

pub mod checkpoint;
pub mod cli;
pub mod config;
pub mod job;
pub mod jobid;
pub mod kvs;
pub mod observability;
pub mod restart;
