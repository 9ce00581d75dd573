//! Restart orchestration
//!
//! Rebuilds the active job table from the KVS at startup.
//!
//! # Startup sequence (strict order)
//!
//! 1. Walk the job namespace; for each job: insert into the table, raise the
//!    watermark, notify the wait registry, run the state action
//! 2. For each job in the complete table: re-check dependencies, issue the
//!    first-seen jobtap callbacks, restart SCHED jobs, mark running jobs
//!    for reattachment
//! 3. Reconcile the watermark with the checkpoint record
//!
//! Step 1 is fail-fast and any failure aborts startup. Step 2 is
//! best-effort per job. In step 3 only a missing checkpoint is tolerated.

use serde_json::json;

use crate::checkpoint::{CheckpointResult, CheckpointStore};
use crate::config::RestartConfig;
use crate::job::{ActiveJobs, DuplicateJob, Job, JobState, Priority};
use crate::jobid::JobId;
use crate::kvs::{Kvs, Transaction};
use crate::observability::{log_event_with_fields, Event};

use super::errors::{RestartError, RestartResult};
use super::hooks::{
    EventReplay, RestartHooks, EVENT_EXEC_REATTACH_START, EVENT_FLUX_RESTART, JOBTAP_JOB_CREATE,
    JOBTAP_JOB_NEW,
};
use super::reconstruct::JobReconstructor;
use super::walker::NamespaceWalker;

/// Outcome of a successful restart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestartSummary {
    /// Jobs reloaded into the active job table
    pub jobs_restored: usize,
    /// Jobs in RUN or CLEANUP, marked for reattachment
    pub running_jobs: usize,
    /// Watermark after checkpoint reconciliation
    pub max_jobid: JobId,
    /// Whether a checkpoint record was found
    pub checkpoint_restored: bool,
}

/// Owns the active job table while it is rebuilt
pub struct RestartManager {
    config: RestartConfig,
    checkpoint: CheckpointStore,
    active_jobs: ActiveJobs,
    max_jobid: JobId,
    running_jobs: usize,
}

impl Default for RestartManager {
    fn default() -> Self {
        Self::new(RestartConfig::default())
    }
}

impl RestartManager {
    /// Creates a manager with an empty table and a zero watermark
    pub fn new(config: RestartConfig) -> Self {
        let checkpoint = CheckpointStore::new(config.checkpoint_key.clone());
        Self {
            config,
            checkpoint,
            active_jobs: ActiveJobs::new(),
            max_jobid: JobId::default(),
            running_jobs: 0,
        }
    }

    pub fn config(&self) -> &RestartConfig {
        &self.config
    }

    /// The active job table. After a failed restart this holds the jobs
    /// restored before the failure.
    pub fn active_jobs(&self) -> &ActiveJobs {
        &self.active_jobs
    }

    /// Hands the table over to the rest of the job manager
    pub fn into_active_jobs(self) -> ActiveJobs {
        self.active_jobs
    }

    /// Highest job ID observed so far
    pub fn max_jobid(&self) -> JobId {
        self.max_jobid
    }

    pub fn running_jobs(&self) -> usize {
        self.running_jobs
    }

    /// Raises the watermark; it never decreases
    pub fn observe_jobid(&mut self, id: JobId) {
        if self.max_jobid < id {
            self.max_jobid = id;
        }
    }

    /// Loads every active job from the KVS and resumes its lifecycle.
    ///
    /// Must run once, before the job manager serves requests. On error the
    /// manager must not serve requests.
    pub async fn restart_from_kvs<K, R, H>(
        &mut self,
        kvs: &K,
        replay: &R,
        hooks: &mut H,
    ) -> RestartResult<RestartSummary>
    where
        K: Kvs + ?Sized,
        R: EventReplay + ?Sized,
        H: RestartHooks + ?Sized,
    {
        log_event_with_fields(
            Event::RestartBegin,
            &[("namespace", &self.config.namespace_root)],
        );

        match self.run(kvs, replay, hooks).await {
            Ok(summary) => {
                log_event_with_fields(
                    Event::RestartComplete,
                    &[
                        ("jobs", &summary.jobs_restored.to_string()),
                        ("running", &summary.running_jobs.to_string()),
                        ("max_jobid", &summary.max_jobid.to_string()),
                    ],
                );
                Ok(summary)
            }
            Err(e) => {
                log_event_with_fields(
                    Event::RestartFailed,
                    &[("code", e.code().code()), ("error", &e.to_string())],
                );
                Err(e)
            }
        }
    }

    async fn run<K, R, H>(
        &mut self,
        kvs: &K,
        replay: &R,
        hooks: &mut H,
    ) -> RestartResult<RestartSummary>
    where
        K: Kvs + ?Sized,
        R: EventReplay + ?Sized,
        H: RestartHooks + ?Sized,
    {
        let jobs_restored = self.restore_jobs(kvs, replay, hooks).await?;
        log_event_with_fields(
            Event::RestartJobsLoaded,
            &[("count", &jobs_restored.to_string())],
        );

        self.resume_jobs(hooks);
        log_event_with_fields(
            Event::RestartRunningJobs,
            &[("count", &self.running_jobs.to_string())],
        );

        let checkpoint_restored = self.restore_checkpoint(kvs).await?;
        log_event_with_fields(
            Event::RestartMaxJobid,
            &[("max_jobid", &self.max_jobid.to_string())],
        );

        Ok(RestartSummary {
            jobs_restored,
            running_jobs: self.running_jobs,
            max_jobid: self.max_jobid,
            checkpoint_restored,
        })
    }

    /// Pass 1: rebuild the table
    async fn restore_jobs<K, R, H>(
        &mut self,
        kvs: &K,
        replay: &R,
        hooks: &mut H,
    ) -> RestartResult<usize>
    where
        K: Kvs + ?Sized,
        R: EventReplay + ?Sized,
        H: RestartHooks + ?Sized,
    {
        let root = self.config.namespace_root.clone();
        let walker = NamespaceWalker::new(kvs, &root);
        let reconstructor = JobReconstructor::new(kvs, replay, &root);

        let active_jobs = &mut self.active_jobs;
        let max_jobid = &mut self.max_jobid;
        walker
            .walk(&reconstructor, |job| {
                restore_job(&mut *active_jobs, &mut *max_jobid, &mut *hooks, job)
            })
            .await
    }

    /// Pass 2: resume every job. Table order is arbitrary.
    fn resume_jobs<H: RestartHooks + ?Sized>(&mut self, hooks: &mut H) {
        for job in self.active_jobs.iter_mut() {
            if resume_job(job, hooks) {
                self.running_jobs += 1;
            }
        }
    }

    /// Raises the watermark to the checkpointed value, if there is one
    async fn restore_checkpoint<K: Kvs + ?Sized>(&mut self, kvs: &K) -> RestartResult<bool> {
        match self.checkpoint.restore(kvs).await {
            Ok(record) => {
                self.observe_jobid(record.max_jobid);
                Ok(true)
            }
            Err(e) if e.is_not_found() => {
                log_event_with_fields(
                    Event::RestartCheckpointNotFound,
                    &[("key", self.checkpoint.key())],
                );
                Ok(false)
            }
            Err(e) => Err(RestartError::checkpoint(&e)),
        }
    }

    /// Adds the checkpoint write to a caller-owned transaction
    pub fn save_state_to_txn(&self, txn: &mut Transaction) -> CheckpointResult<()> {
        self.checkpoint.write_to_txn(txn, self.max_jobid)
    }

    /// Commits the checkpoint and waits for the store to acknowledge it
    pub async fn save_state<K: Kvs + ?Sized>(&self, kvs: &K) -> CheckpointResult<()> {
        let max_jobid = self.max_jobid.to_string();
        match self.checkpoint.save(kvs, self.max_jobid).await {
            Ok(()) => {
                log_event_with_fields(Event::CheckpointSaved, &[("max_jobid", &max_jobid)]);
                Ok(())
            }
            Err(e) => {
                log_event_with_fields(
                    Event::CheckpointSaveFailed,
                    &[("code", e.code()), ("error", &e.to_string())],
                );
                Err(e)
            }
        }
    }
}

fn restore_job<H: RestartHooks + ?Sized>(
    active_jobs: &mut ActiveJobs,
    max_jobid: &mut JobId,
    hooks: &mut H,
    job: Job,
) -> RestartResult<()> {
    let job = active_jobs
        .insert(job)
        .map_err(|DuplicateJob(id)| RestartError::duplicate_job(id))?;

    if *max_jobid < job.id {
        *max_jobid = job.id;
    }
    if job.is_waitable() {
        hooks.notify_active(job);
    }
    if let Err(e) = hooks.job_action(job) {
        log_event_with_fields(
            Event::RestartReplayWarning,
            &[
                ("id", &job.id.to_string()),
                ("state", job.state.as_str()),
                ("error", e.message()),
            ],
        );
    }
    Ok(())
}

/// Resumes one job; returns true if it is running
fn resume_job<H: RestartHooks + ?Sized>(job: &mut Job, hooks: &mut H) -> bool {
    if matches!(job.state, JobState::New | JobState::Depend) {
        if let Err(e) = hooks.check_dependencies(job, true) {
            log_event_with_fields(
                Event::RestartDependencyCheckFailed,
                &[("id", &job.id.to_string()), ("error", e.message())],
            );
        }
    }

    // First callbacks this instance issues for the job; they must precede
    // any event posted below.
    for topic in [JOBTAP_JOB_CREATE, JOBTAP_JOB_NEW] {
        if let Err(e) = hooks.jobtap_call(job, topic, None) {
            log_event_with_fields(
                Event::RestartJobtapCallFailed,
                &[
                    ("id", &job.id.to_string()),
                    ("topic", topic),
                    ("error", e.message()),
                ],
            );
        }
    }

    if job.state == JobState::Sched {
        // The priority event is only posted when the value changes, so the
        // replayed value must be discarded for PRIORITY to recompute it.
        job.priority = Priority::Unset;
        post_or_log(hooks, job, EVENT_FLUX_RESTART, None);
        false
    } else if job.state.is_running() {
        job.reattach = true;
        if job.is_debug() {
            let context = json!({ "id": job.id.as_u64() });
            post_or_log(hooks, job, EVENT_EXEC_REATTACH_START, Some(context));
        }
        true
    } else {
        false
    }
}

fn post_or_log<H: RestartHooks + ?Sized>(
    hooks: &mut H,
    job: &mut Job,
    name: &str,
    context: Option<serde_json::Value>,
) {
    if let Err(e) = hooks.post_event(job, name, context) {
        log_event_with_fields(
            Event::RestartEventPostFailed,
            &[
                ("id", &job.id.to_string()),
                ("event", name),
                ("error", e.message()),
            ],
        );
    }
}
