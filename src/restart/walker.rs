//! Depth-first walk of the sharded job namespace
//!
//! Job directories are not stored flat under the root. The dotted-hex ID
//! token doubles as a path, so each directory holds at most 65536 entries:
//!
//! ```text
//! job                          depth 0 (root)
//! job.0000                     depth 1
//! job.0000.0004                depth 2
//! job.0000.0004.b200           depth 3
//! job.0000.0004.b200.0000      leaf: job 0000.0004.b200.0000
//! ```
//!
//! Depth is the number of separators in the key past the root. Children of
//! a depth-3 directory are complete job keys; anything else is descended
//! into. Values (non-directories) found anywhere in the tree are skipped.
//!
//! The walk is strictly sequential and stops at the first error.

use crate::job::Job;
use crate::jobid::{IdEncoding, JobId};
use crate::kvs::{Kvs, SEPARATOR};

use super::errors::{RestartError, RestartResult};
use super::hooks::EventReplay;
use super::reconstruct::JobReconstructor;

/// Number of directory levels between the root and a job directory
pub const SHARD_DEPTH: usize = 3;

/// A job directory found by the walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafEntry {
    /// Full key of the job directory
    pub key: String,
    /// Job ID decoded from the key
    pub id: JobId,
}

enum Pending {
    Dir(String),
    Leaf(String),
}

/// Explicit-stack depth-first walker over one namespace root
pub struct NamespaceWalker<'a, K: ?Sized> {
    kvs: &'a K,
    root: String,
    dirskip: usize,
    stack: Vec<Pending>,
}

/// Number of separators in `key` past the first `dirskip` bytes
pub fn path_level(key: &str, dirskip: usize) -> usize {
    key.get(dirskip..)
        .map(|rest| rest.matches(SEPARATOR).count())
        .unwrap_or(0)
}

impl<'a, K: Kvs + ?Sized> NamespaceWalker<'a, K> {
    /// Creates a walker rooted at `root`
    pub fn new(kvs: &'a K, root: &str) -> Self {
        Self {
            kvs,
            root: root.to_string(),
            dirskip: root.len(),
            stack: vec![Pending::Dir(root.to_string())],
        }
    }

    /// The namespace root
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Returns the next job directory in depth-first order, or `None` once
    /// the namespace is exhausted.
    ///
    /// A missing root is an empty namespace. A directory that disappears
    /// below the root is an error.
    pub async fn next_leaf(&mut self) -> RestartResult<Option<LeafEntry>> {
        while let Some(pending) = self.stack.pop() {
            let key = match pending {
                Pending::Leaf(key) => return self.decode_leaf(key).map(Some),
                Pending::Dir(key) => key,
            };

            let level = path_level(&key, self.dirskip);
            let dir = match self.kvs.readdir(&key).await {
                Ok(dir) => dir,
                Err(e) if e.is_not_found() && level == 0 => continue,
                Err(e) if e.is_not_found() => {
                    return Err(RestartError::namespace(
                        &key,
                        format!("could not look up {}: {}", key, e),
                    ))
                }
                Err(e) => return Err(RestartError::lookup(&key, &e)),
            };

            // Reverse so the first listed child is visited first
            for entry in dir.entries().iter().rev() {
                if !entry.is_dir {
                    continue;
                }
                let child = dir.key_at(&entry.name);
                if level == SHARD_DEPTH {
                    self.stack.push(Pending::Leaf(child));
                } else {
                    self.stack.push(Pending::Dir(child));
                }
            }
        }
        Ok(None)
    }

    fn decode_leaf(&self, key: String) -> RestartResult<LeafEntry> {
        let token = match key.get(self.dirskip + 1..) {
            Some(token) => token,
            None => {
                return Err(RestartError::namespace(
                    &key,
                    format!("internal error key={} dirskip={}", key, self.dirskip),
                ))
            }
        };
        let id = JobId::decode(token, IdEncoding::DotHex)
            .map_err(|e| RestartError::decode(&key, &e))?;
        Ok(LeafEntry { key, id })
    }

    /// Walks the whole namespace, reconstructing each job and handing it to
    /// `callback`. Returns the number of jobs processed.
    ///
    /// Stops at the first decode, lookup, replay or callback error.
    pub async fn walk<R, F>(
        mut self,
        reconstructor: &JobReconstructor<'_, K, R>,
        mut callback: F,
    ) -> RestartResult<usize>
    where
        R: EventReplay + ?Sized,
        F: FnMut(Job) -> RestartResult<()>,
    {
        let mut count = 0;
        while let Some(leaf) = self.next_leaf().await? {
            let job = reconstructor.reconstruct(leaf.id).await?;
            callback(job)?;
            count += 1;
        }
        Ok(count)
    }

    /// Collects the IDs of every job in the namespace without reading any
    /// job records
    pub async fn collect_ids(mut self) -> RestartResult<Vec<JobId>> {
        let mut ids = Vec::new();
        while let Some(leaf) = self.next_leaf().await? {
            ids.push(leaf.id);
        }
        Ok(ids)
    }
}
