//! Checkpoint record
//!
//! Stored as a single JSON object under the checkpoint key:
//!
//! ```json
//! {"max_jobid": 20233322496}
//! ```

use serde::{Deserialize, Serialize};

use super::errors::{CheckpointError, CheckpointResult};
use crate::jobid::JobId;

/// Job manager state that survives restarts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointRecord {
    /// Highest job ID the manager has ever observed
    pub max_jobid: JobId,
}

impl CheckpointRecord {
    pub fn new(max_jobid: JobId) -> Self {
        Self { max_jobid }
    }

    /// Serializes the record to JSON
    pub fn to_json(&self) -> String {
        serde_json::json!({ "max_jobid": self.max_jobid.as_u64() }).to_string()
    }

    /// Parses a record read from `key`
    pub fn from_json(key: &str, json: &str) -> CheckpointResult<Self> {
        serde_json::from_str(json).map_err(|e| CheckpointError::Malformed {
            key: key.to_string(),
            message: e.to_string(),
        })
    }
}
