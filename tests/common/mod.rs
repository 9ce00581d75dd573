//! Shared fixtures for restart integration tests

#![allow(dead_code)]

use jobmgr::job::Job;
use jobmgr::jobid::JobId;
use jobmgr::kvs::{Kvs, MemoryKvs, Transaction};
use jobmgr::restart::{
    DependencyCheck, EventPost, EventReplay, HookError, Jobtap, ReplayError, StateAction,
    WaitRegistry, EVENTLOG_KEY, JOBSPEC_KEY,
};
use serde_json::Value;

// =============================================================================
// Replay
// =============================================================================

/// Test eventlogs hold the serialized job; the jobspec must exist but is
/// not interpreted.
pub struct JsonReplay;

impl EventReplay for JsonReplay {
    fn replay(&self, _id: JobId, eventlog: &str, _jobspec: &str) -> Result<Job, ReplayError> {
        serde_json::from_str(eventlog).map_err(|e| ReplayError::new(e.to_string()))
    }
}

pub fn job_txn(job: &Job) -> Transaction {
    let mut txn = Transaction::new();
    txn.put_json(&job.id.kvs_key("job", EVENTLOG_KEY), job)
        .unwrap();
    txn.put(&job.id.kvs_key("job", JOBSPEC_KEY), "{}").unwrap();
    txn
}

/// Persists a job the way the job manager would before a restart
pub async fn store_job<K: Kvs + ?Sized>(kvs: &K, job: &Job) {
    kvs.commit(job_txn(job)).await.unwrap();
}

pub async fn memory_store(jobs: &[Job]) -> MemoryKvs {
    let kvs = MemoryKvs::new();
    for job in jobs {
        store_job(&kvs, job).await;
    }
    kvs
}

// =============================================================================
// Recording hooks
// =============================================================================

/// One collaborator call
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Wait(JobId),
    Action(JobId),
    Depend { id: JobId, restart: bool },
    Jobtap { id: JobId, topic: String },
    Post { id: JobId, name: String, context: Option<Value> },
}

impl Call {
    pub fn id(&self) -> JobId {
        match self {
            Call::Wait(id) | Call::Action(id) => *id,
            Call::Depend { id, .. } | Call::Jobtap { id, .. } | Call::Post { id, .. } => *id,
        }
    }
}

/// Records every call in one timeline
#[derive(Default)]
pub struct Recorder {
    pub calls: Vec<Call>,
    /// Each job as seen by the state action, before any resume step
    pub restored: Vec<Job>,
    pub fail_action: bool,
    pub fail_depend: bool,
    pub fail_jobtap: bool,
    pub fail_post: bool,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail_action: true,
            fail_depend: true,
            fail_jobtap: true,
            fail_post: true,
            ..Self::default()
        }
    }

    pub fn calls_for(&self, id: JobId) -> Vec<&Call> {
        self.calls.iter().filter(|c| c.id() == id).collect()
    }

    pub fn posts(&self, id: JobId, name: &str) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, Call::Post { id: i, name: n, .. } if *i == id && n == name))
            .count()
    }
}

fn outcome(fail: bool, what: &str) -> Result<(), HookError> {
    if fail {
        Err(HookError::new(format!("{} failed", what)))
    } else {
        Ok(())
    }
}

impl DependencyCheck for Recorder {
    fn check_dependencies(&mut self, job: &mut Job, restart: bool) -> Result<(), HookError> {
        self.calls.push(Call::Depend { id: job.id, restart });
        outcome(self.fail_depend, "dependency check")
    }
}

impl Jobtap for Recorder {
    fn jobtap_call(
        &mut self,
        job: &mut Job,
        topic: &str,
        _args: Option<&Value>,
    ) -> Result<(), HookError> {
        self.calls.push(Call::Jobtap {
            id: job.id,
            topic: topic.to_string(),
        });
        outcome(self.fail_jobtap, "jobtap")
    }
}

impl EventPost for Recorder {
    fn post_event(
        &mut self,
        job: &mut Job,
        name: &str,
        context: Option<Value>,
    ) -> Result<(), HookError> {
        self.calls.push(Call::Post {
            id: job.id,
            name: name.to_string(),
            context,
        });
        outcome(self.fail_post, "event post")
    }
}

impl WaitRegistry for Recorder {
    fn notify_active(&mut self, job: &Job) {
        self.calls.push(Call::Wait(job.id));
    }
}

impl StateAction for Recorder {
    fn job_action(&mut self, job: &mut Job) -> Result<(), HookError> {
        self.calls.push(Call::Action(job.id));
        self.restored.push(job.clone());
        outcome(self.fail_action, "state action")
    }
}
