//! Checkpoint store for the job manager watermark
//!
//! The highest job ID ever issued is checkpointed to a single KVS key so
//! that it survives restarts even after every job has been purged from the
//! job namespace.
//!
//! - `save` commits a one-key transaction and returns only once the store
//!   acknowledges it
//! - `write_to_txn` adds the same write to a caller-owned transaction
//! - `restore` reports a missing record as `CheckpointError::NotFound`

mod errors;
mod record;

pub use errors::{CheckpointError, CheckpointResult};
pub use record::CheckpointRecord;

use crate::jobid::JobId;
use crate::kvs::{Kvs, KvsError, Transaction};

/// Default KVS key of the job manager checkpoint
pub const CHECKPOINT_KEY: &str = "checkpoint.job-manager";

/// Reads and writes the checkpoint record at one key
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    key: String,
}

impl Default for CheckpointStore {
    fn default() -> Self {
        Self::new(CHECKPOINT_KEY)
    }
}

impl CheckpointStore {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    /// The checkpoint key
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Adds the checkpoint write to an existing transaction
    pub fn write_to_txn(&self, txn: &mut Transaction, max_jobid: JobId) -> CheckpointResult<()> {
        txn.put(&self.key, CheckpointRecord::new(max_jobid).to_json())
            .map_err(|source| self.commit_error(source))
    }

    /// Commits the watermark in its own transaction
    pub async fn save<K: Kvs + ?Sized>(&self, kvs: &K, max_jobid: JobId) -> CheckpointResult<()> {
        let mut txn = Transaction::new();
        self.write_to_txn(&mut txn, max_jobid)?;
        kvs.commit(txn)
            .await
            .map_err(|source| self.commit_error(source))
    }

    /// Reads the checkpoint record
    pub async fn restore<K: Kvs + ?Sized>(&self, kvs: &K) -> CheckpointResult<CheckpointRecord> {
        let json = kvs.lookup(&self.key).await.map_err(|source| {
            if source.is_not_found() {
                CheckpointError::NotFound {
                    key: self.key.clone(),
                }
            } else {
                CheckpointError::Lookup {
                    key: self.key.clone(),
                    source,
                }
            }
        })?;
        CheckpointRecord::from_json(&self.key, &json)
    }

    fn commit_error(&self, source: KvsError) -> CheckpointError {
        CheckpointError::Commit {
            key: self.key.clone(),
            source,
        }
    }
}
