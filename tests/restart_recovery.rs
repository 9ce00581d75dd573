//! Restart Recovery Tests
//!
//! Covers the startup sequence end to end:
//! - Empty and populated namespaces
//! - Exact reconstruction of replayed jobs
//! - SCHED jobs restarted, running jobs marked for reattach
//! - Callback ordering per job and between passes
//! - Fail-fast traversal with a partial table left behind
//! - Collaborator failures tolerated during resume

mod common;

use std::collections::BTreeSet;

use common::{memory_store, store_job, Call, JsonReplay, Recorder};
use jobmgr::config::RestartConfig;
use jobmgr::job::{Job, JobFlags, JobState, Priority};
use jobmgr::jobid::{IdEncoding, JobId};
use jobmgr::kvs::{DirKvs, KvsError, MemoryKvs};
use jobmgr::restart::{
    RestartErrorCode, RestartManager, EVENT_EXEC_REATTACH_START, EVENT_FLUX_RESTART,
    JOBSPEC_KEY, JOBTAP_JOB_CREATE, JOBTAP_JOB_NEW,
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde_json::json;
use tempfile::TempDir;

// =============================================================================
// Test Utilities
// =============================================================================

fn random_jobs(seed: u64, count: usize) -> Vec<Job> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut ids = BTreeSet::new();
    while ids.len() < count {
        // Mix jobs that share shards with jobs that do not
        let id = match rng.gen_range(0..3) {
            0 => rng.gen_range(1..64),
            1 => rng.gen_range(0..4u64) << 32 | rng.gen_range(1..8u64),
            _ => rng.gen::<u64>(),
        };
        ids.insert(id);
    }

    let flag_choices = [
        JobFlags::NONE,
        JobFlags::DEBUG,
        JobFlags::WAITABLE,
        JobFlags::DEBUG | JobFlags::WAITABLE,
    ];
    let active = [
        JobState::New,
        JobState::Depend,
        JobState::Priority,
        JobState::Sched,
        JobState::Run,
        JobState::Cleanup,
    ];

    let mut jobs: Vec<Job> = ids
        .into_iter()
        .map(|id| {
            let priority = if rng.gen_bool(0.5) {
                Priority::Value(rng.gen_range(0..1000))
            } else {
                Priority::Unset
            };
            let mut job = Job::new(JobId::new(id))
                .with_state(*active.choose(&mut rng).unwrap())
                .with_flags(*flag_choices.choose(&mut rng).unwrap())
                .with_priority(priority);
            job.userid = rng.gen_range(0..5000);
            job.urgency = rng.gen_range(0..32);
            job.t_submit = 1_700_000_000.5;
            job
        })
        .collect();
    jobs.shuffle(&mut rng);
    jobs
}

fn is_jobtap(call: &Call, topic: &str) -> bool {
    matches!(call, Call::Jobtap { topic: t, .. } if t == topic)
}

async fn restart(kvs: &MemoryKvs) -> (RestartManager, Recorder) {
    let mut manager = RestartManager::default();
    let mut hooks = Recorder::new();
    manager
        .restart_from_kvs(kvs, &JsonReplay, &mut hooks)
        .await
        .unwrap();
    (manager, hooks)
}

// =============================================================================
// Empty Store
// =============================================================================

#[tokio::test]
async fn test_empty_store_restores_nothing() {
    let kvs = MemoryKvs::new();
    let mut manager = RestartManager::default();
    let mut hooks = Recorder::new();

    let summary = manager
        .restart_from_kvs(&kvs, &JsonReplay, &mut hooks)
        .await
        .unwrap();

    assert_eq!(summary.jobs_restored, 0);
    assert_eq!(summary.running_jobs, 0);
    assert_eq!(summary.max_jobid, JobId::new(0));
    assert!(manager.active_jobs().is_empty());
    assert!(hooks.calls.is_empty());
}

// =============================================================================
// Concrete Scenario
// =============================================================================

/// A scheduled job and a running debug job survive a restart
#[tokio::test]
async fn test_sched_and_debug_run_jobs() {
    let a = JobId::decode("0000.0004.b200.0000", IdEncoding::DotHex).unwrap();
    let b = JobId::decode("0000.0004.b300.0000", IdEncoding::DotHex).unwrap();
    let kvs = memory_store(&[
        Job::new(a)
            .with_state(JobState::Sched)
            .with_priority(Priority::Value(7)),
        Job::new(b)
            .with_state(JobState::Run)
            .with_flags(JobFlags::DEBUG),
    ])
    .await;

    let (manager, hooks) = restart(&kvs).await;

    let table = manager.active_jobs();
    assert_eq!(table.len(), 2);

    let job_a = table.get(a).unwrap();
    assert_eq!(job_a.priority, Priority::Unset);
    assert!(!job_a.reattach);
    assert_eq!(hooks.posts(a, EVENT_FLUX_RESTART), 1);

    let job_b = table.get(b).unwrap();
    assert!(job_b.reattach);
    assert_eq!(hooks.posts(b, EVENT_EXEC_REATTACH_START), 1);
    assert!(hooks.calls.contains(&Call::Post {
        id: b,
        name: EVENT_EXEC_REATTACH_START.to_string(),
        context: Some(json!({ "id": b.as_u64() })),
    }));

    assert_eq!(manager.running_jobs(), 1);
    assert_eq!(manager.max_jobid(), b);
}

// =============================================================================
// Reconstruction
// =============================================================================

/// Jobs enter the table exactly as replayed, regardless of store order
#[tokio::test]
async fn test_round_trip_of_replayed_fields() {
    for seed in 0..4 {
        let jobs = random_jobs(seed, 40);
        let kvs = memory_store(&jobs).await;
        let (manager, hooks) = restart(&kvs).await;

        assert_eq!(manager.active_jobs().len(), jobs.len());
        assert_eq!(hooks.restored.len(), jobs.len());
        for job in &jobs {
            let seen = hooks.restored.iter().find(|j| j.id == job.id).unwrap();
            assert_eq!(seen, job);
        }
    }
}

#[tokio::test]
async fn test_walk_visits_jobs_in_id_order() {
    let jobs = random_jobs(7, 30);
    let kvs = memory_store(&jobs).await;
    let (_, hooks) = restart(&kvs).await;

    let visited: Vec<JobId> = hooks.restored.iter().map(|j| j.id).collect();
    let mut sorted = visited.clone();
    sorted.sort();
    assert_eq!(visited, sorted);
}

#[tokio::test]
async fn test_waitable_jobs_registered_before_state_action() {
    let waitable = Job::new(JobId::new(1)).with_flags(JobFlags::WAITABLE);
    let plain = Job::new(JobId::new(2));
    let kvs = memory_store(&[waitable, plain]).await;

    let (_, hooks) = restart(&kvs).await;

    let calls = hooks.calls_for(JobId::new(1));
    assert_eq!(calls[0], &Call::Wait(JobId::new(1)));
    assert_eq!(calls[1], &Call::Action(JobId::new(1)));
    assert!(!hooks.calls.contains(&Call::Wait(JobId::new(2))));
}

// =============================================================================
// Resume
// =============================================================================

#[tokio::test]
async fn test_sched_jobs_lose_priority_and_restart_once() {
    let jobs = random_jobs(11, 50);
    let kvs = memory_store(&jobs).await;
    let (manager, hooks) = restart(&kvs).await;

    for job in &jobs {
        let restored = manager.active_jobs().get(job.id).unwrap();
        let restarts = hooks.posts(job.id, EVENT_FLUX_RESTART);
        if job.state == JobState::Sched {
            assert_eq!(restored.priority, Priority::Unset);
            assert_eq!(restarts, 1);
        } else {
            assert_eq!(restored.priority, job.priority);
            assert_eq!(restarts, 0);
        }
    }
}

#[tokio::test]
async fn test_running_jobs_marked_for_reattach() {
    let jobs = random_jobs(12, 50);
    let kvs = memory_store(&jobs).await;
    let (manager, hooks) = restart(&kvs).await;

    let running = jobs.iter().filter(|j| j.state.is_running()).count();
    assert_eq!(manager.running_jobs(), running);

    for job in &jobs {
        let restored = manager.active_jobs().get(job.id).unwrap();
        assert_eq!(restored.reattach, job.state.is_running());
        let expected = usize::from(job.state.is_running() && job.is_debug());
        assert_eq!(hooks.posts(job.id, EVENT_EXEC_REATTACH_START), expected);
    }
}

#[tokio::test]
async fn test_dependencies_rechecked_for_new_and_depend() {
    let jobs = random_jobs(13, 40);
    let kvs = memory_store(&jobs).await;
    let (_, hooks) = restart(&kvs).await;

    for job in &jobs {
        let checks: Vec<_> = hooks
            .calls_for(job.id)
            .into_iter()
            .filter(|c| matches!(c, Call::Depend { .. }))
            .collect();
        if matches!(job.state, JobState::New | JobState::Depend) {
            assert_eq!(
                checks,
                vec![&Call::Depend {
                    id: job.id,
                    restart: true
                }]
            );
        } else {
            assert!(checks.is_empty());
        }
    }
}

/// job.create, then job.new, then any event, for every job
#[tokio::test]
async fn test_jobtap_callbacks_precede_events() {
    let jobs = random_jobs(14, 40);
    let kvs = memory_store(&jobs).await;
    let (_, hooks) = restart(&kvs).await;

    for job in &jobs {
        let calls = hooks.calls_for(job.id);
        let create = calls
            .iter()
            .position(|c| is_jobtap(c, JOBTAP_JOB_CREATE))
            .unwrap();
        let new = calls
            .iter()
            .position(|c| is_jobtap(c, JOBTAP_JOB_NEW))
            .unwrap();
        assert!(create < new);

        for (i, call) in calls.iter().enumerate() {
            if matches!(call, Call::Post { .. }) {
                assert!(new < i, "event posted before job.new for {}", job.id);
            }
        }
    }
}

/// Every job is in the table before any job is resumed
#[tokio::test]
async fn test_passes_do_not_interleave() {
    let jobs = random_jobs(15, 30);
    let kvs = memory_store(&jobs).await;
    let (_, hooks) = restart(&kvs).await;

    let last_pass1 = hooks
        .calls
        .iter()
        .rposition(|c| matches!(c, Call::Wait(_) | Call::Action(_)))
        .unwrap();
    let first_pass2 = hooks
        .calls
        .iter()
        .position(|c| matches!(c, Call::Depend { .. } | Call::Jobtap { .. } | Call::Post { .. }))
        .unwrap();
    assert!(last_pass1 < first_pass2);
}

#[tokio::test]
async fn test_collaborator_failures_do_not_abort() {
    let jobs = random_jobs(16, 25);
    let kvs = memory_store(&jobs).await;
    let mut manager = RestartManager::default();
    let mut hooks = Recorder::failing();

    let summary = manager
        .restart_from_kvs(&kvs, &JsonReplay, &mut hooks)
        .await
        .unwrap();

    assert_eq!(summary.jobs_restored, jobs.len());
    let sched = jobs.iter().filter(|j| j.state == JobState::Sched).count();
    let restarts: usize = jobs
        .iter()
        .map(|j| hooks.posts(j.id, EVENT_FLUX_RESTART))
        .sum();
    assert_eq!(restarts, sched);
}

// =============================================================================
// Fail-Fast Traversal
// =============================================================================

/// Jobs walked before the failure stay in the table; later jobs are never read
#[tokio::test]
async fn test_missing_jobspec_aborts_with_partial_table() {
    let ids: Vec<JobId> = [1u64, 2, 3, 4].into_iter().map(JobId::new).collect();
    let kvs = memory_store(&ids.iter().map(|id| Job::new(*id)).collect::<Vec<_>>()).await;
    let broken = ids[2].kvs_key("job", JOBSPEC_KEY);
    kvs.inject_fault(&broken, KvsError::NotFound(broken.clone()));

    let mut manager = RestartManager::default();
    let mut hooks = Recorder::new();
    let err = manager
        .restart_from_kvs(&kvs, &JsonReplay, &mut hooks)
        .await
        .unwrap_err();

    assert_eq!(err.code(), RestartErrorCode::KvsLookupFailed);
    assert!(err.is_fatal());
    assert_eq!(err.key(), Some(broken.as_str()));
    assert_eq!(manager.active_jobs().sorted_ids(), vec![ids[0], ids[1]]);
    assert_eq!(manager.max_jobid(), ids[1]);

    // Resume never started
    assert!(hooks
        .calls
        .iter()
        .all(|c| matches!(c, Call::Wait(_) | Call::Action(_))));
    assert!(!kvs.requests().iter().any(|k| k.contains(".0004.")));
}

#[tokio::test]
async fn test_unreplayable_eventlog_aborts() {
    let kvs = memory_store(&[Job::new(JobId::new(1))]).await;
    kvs.insert("job.0000.0000.0000.0002.eventlog", "not json")
        .unwrap();
    kvs.insert("job.0000.0000.0000.0002.jobspec", "{}").unwrap();
    store_job(&kvs, &Job::new(JobId::new(3))).await;

    let mut manager = RestartManager::default();
    let err = manager
        .restart_from_kvs(&kvs, &JsonReplay, &mut Recorder::new())
        .await
        .unwrap_err();

    assert_eq!(err.code(), RestartErrorCode::EventlogReplayFailed);
    assert_eq!(err.job_id(), Some(JobId::new(2)));
    assert_eq!(manager.active_jobs().sorted_ids(), vec![JobId::new(1)]);
}

#[tokio::test]
async fn test_corrupt_leaf_aborts() {
    let kvs = memory_store(&[Job::new(JobId::new(1))]).await;
    kvs.insert("job.0000.0000.0000.00zz.eventlog", "{}").unwrap();

    let mut manager = RestartManager::default();
    let err = manager
        .restart_from_kvs(&kvs, &JsonReplay, &mut Recorder::new())
        .await
        .unwrap_err();

    assert_eq!(err.code(), RestartErrorCode::IdDecodeFailed);
    assert!(err.to_string().starts_with("[FATAL] JOBMGR_ID_DECODE_FAILED"));
    assert_eq!(manager.active_jobs().len(), 1);
}

// =============================================================================
// Filesystem Store
// =============================================================================

#[tokio::test]
async fn test_restart_from_directory_store() {
    let temp_dir = TempDir::new().unwrap();
    let jobs = random_jobs(21, 12);
    {
        let kvs = DirKvs::open(temp_dir.path()).unwrap();
        for job in &jobs {
            store_job(&kvs, job).await;
        }
    }

    let kvs = DirKvs::open(temp_dir.path()).unwrap();
    let mut manager = RestartManager::new(RestartConfig::default());
    let mut hooks = Recorder::new();
    let summary = manager
        .restart_from_kvs(&kvs, &JsonReplay, &mut hooks)
        .await
        .unwrap();

    assert_eq!(summary.jobs_restored, jobs.len());
    let max = jobs.iter().map(|j| j.id).max().unwrap();
    assert_eq!(summary.max_jobid, max);
    for job in &jobs {
        assert!(manager.active_jobs().contains(job.id));
    }
}
