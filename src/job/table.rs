//! Active job table
//!
//! Keyed by job ID. Iteration order is unspecified; callers must not
//! depend on ID or insertion order.

use std::collections::hash_map::{Entry, HashMap};

use thiserror::Error;

use super::Job;
use crate::jobid::JobId;

/// Insert of an ID that is already in the table
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("job {0} is already in the active job table")]
pub struct DuplicateJob(pub JobId);

/// Table of active jobs owned by the job manager
#[derive(Debug, Default)]
pub struct ActiveJobs {
    jobs: HashMap<JobId, Job>,
}

impl ActiveJobs {
    /// Creates an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a job and returns a mutable reference to it.
    ///
    /// Fails without modifying the table if the ID is already present.
    pub fn insert(&mut self, job: Job) -> Result<&mut Job, DuplicateJob> {
        match self.jobs.entry(job.id) {
            Entry::Occupied(_) => Err(DuplicateJob(job.id)),
            Entry::Vacant(slot) => Ok(slot.insert(job)),
        }
    }

    pub fn get(&self, id: JobId) -> Option<&Job> {
        self.jobs.get(&id)
    }

    pub fn get_mut(&mut self, id: JobId) -> Option<&mut Job> {
        self.jobs.get_mut(&id)
    }

    pub fn contains(&self, id: JobId) -> bool {
        self.jobs.contains_key(&id)
    }

    /// Removes a job, e.g. once it has become inactive
    pub fn remove(&mut self, id: JobId) -> Option<Job> {
        self.jobs.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Job> {
        self.jobs.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Job> {
        self.jobs.values_mut()
    }

    /// IDs in ascending order, for display and comparisons
    pub fn sorted_ids(&self) -> Vec<JobId> {
        let mut ids: Vec<JobId> = self.jobs.keys().copied().collect();
        ids.sort();
        ids
    }
}
