//! Job reconstruction from persisted records
//!
//! Each job directory holds an `eventlog` and a `jobspec`. Both lookups are
//! issued before either is awaited so the store can serve them together.

use crate::job::Job;
use crate::jobid::JobId;
use crate::kvs::Kvs;

use super::errors::{RestartError, RestartResult};
use super::hooks::{EventReplay, ReplayError};

/// Name of the eventlog record in a job directory
pub const EVENTLOG_KEY: &str = "eventlog";
/// Name of the jobspec record in a job directory
pub const JOBSPEC_KEY: &str = "jobspec";

/// Loads and replays one job at a time
pub struct JobReconstructor<'a, K: ?Sized, R: ?Sized> {
    kvs: &'a K,
    replay: &'a R,
    root: String,
}

impl<'a, K, R> JobReconstructor<'a, K, R>
where
    K: Kvs + ?Sized,
    R: EventReplay + ?Sized,
{
    /// Creates a reconstructor for jobs under `root`
    pub fn new(kvs: &'a K, replay: &'a R, root: &str) -> Self {
        Self {
            kvs,
            replay,
            root: root.to_string(),
        }
    }

    /// Fetches the job's records and replays them into a job
    pub async fn reconstruct(&self, id: JobId) -> RestartResult<Job> {
        let eventlog_key = id.kvs_key(&self.root, EVENTLOG_KEY);
        let jobspec_key = id.kvs_key(&self.root, JOBSPEC_KEY);

        let eventlog_request = self.kvs.lookup(&eventlog_key);
        let jobspec_request = self.kvs.lookup(&jobspec_key);
        let (eventlog, jobspec) = tokio::join!(eventlog_request, jobspec_request);

        let eventlog = eventlog.map_err(|e| RestartError::lookup(&eventlog_key, &e))?;
        let jobspec = jobspec.map_err(|e| RestartError::lookup(&jobspec_key, &e))?;

        let job = self
            .replay
            .replay(id, &eventlog, &jobspec)
            .map_err(|e| RestartError::replay(&eventlog_key, id, &e))?;

        if job.id != id {
            return Err(RestartError::replay(
                &eventlog_key,
                id,
                &ReplayError::new(format!("replay produced job {}", job.id)),
            ));
        }
        Ok(job)
    }
}
