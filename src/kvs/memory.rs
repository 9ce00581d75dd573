//! In-memory KVS
//!
//! Values live in a sorted map keyed by full path; directories are implied
//! by key prefixes. Directory listings are returned in name order.
//!
//! Faults can be injected per key so callers can exercise error paths, and
//! every lookup/readdir request is recorded in order.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, RwLock};

use super::errors::{KvsError, KvsResult};
use super::txn::{Transaction, TxnOp};
use super::{validate_key, DirEntry, Kvs, KvsDir, KvsFuture, SEPARATOR};

/// Hierarchical KVS held in memory
#[derive(Debug, Default)]
pub struct MemoryKvs {
    values: RwLock<BTreeMap<String, String>>,
    faults: RwLock<HashMap<String, KvsError>>,
    commit_fault: RwLock<Option<KvsError>>,
    requests: Mutex<Vec<String>>,
}

impl MemoryKvs {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a value directly, bypassing transactions
    pub fn insert(&self, key: &str, value: impl Into<String>) -> KvsResult<()> {
        validate_key(key)?;
        let mut values = self.values.write().map_err(|_| poisoned(key))?;
        put_value(&mut values, key, value.into());
        Ok(())
    }

    /// Makes lookups and listings of `key` fail with `error`
    pub fn inject_fault(&self, key: &str, error: KvsError) {
        if let Ok(mut faults) = self.faults.write() {
            faults.insert(key.to_string(), error);
        }
    }

    /// Makes every commit fail with `error`
    pub fn inject_commit_fault(&self, error: KvsError) {
        if let Ok(mut fault) = self.commit_fault.write() {
            *fault = Some(error);
        }
    }

    /// Removes all injected faults
    pub fn clear_faults(&self) {
        if let Ok(mut faults) = self.faults.write() {
            faults.clear();
        }
        if let Ok(mut fault) = self.commit_fault.write() {
            *fault = None;
        }
    }

    /// Keys requested through lookup/readdir, in request order
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    /// Reads a value synchronously
    pub fn get(&self, key: &str) -> Option<String> {
        self.values.read().ok()?.get(key).cloned()
    }

    /// Number of stored values
    pub fn len(&self) -> usize {
        self.values.read().map(|values| values.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn record(&self, key: &str) {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(key.to_string());
        }
    }

    fn fault(&self, key: &str) -> Option<KvsError> {
        self.faults.read().ok()?.get(key).cloned()
    }

    fn lookup_now(&self, key: &str) -> KvsResult<String> {
        self.record(key);
        validate_key(key)?;
        if let Some(err) = self.fault(key) {
            return Err(err);
        }
        let values = self.values.read().map_err(|_| poisoned(key))?;
        if let Some(value) = values.get(key) {
            return Ok(value.clone());
        }
        if has_children(&values, key) {
            return Err(KvsError::IsADirectory(key.to_string()));
        }
        Err(KvsError::NotFound(key.to_string()))
    }

    fn readdir_now(&self, key: &str) -> KvsResult<KvsDir> {
        self.record(key);
        validate_key(key)?;
        if let Some(err) = self.fault(key) {
            return Err(err);
        }
        let values = self.values.read().map_err(|_| poisoned(key))?;
        if values.contains_key(key) {
            return Err(KvsError::NotADirectory(key.to_string()));
        }

        let prefix = format!("{}{}", key, SEPARATOR);
        let mut children: BTreeMap<String, bool> = BTreeMap::new();
        for full in values.range(prefix.clone()..).map(|(k, _)| k) {
            let Some(rest) = full.strip_prefix(&prefix) else {
                break;
            };
            let (name, is_dir) = match rest.split_once(SEPARATOR) {
                Some((name, _)) => (name, true),
                None => (rest, false),
            };
            *children.entry(name.to_string()).or_insert(false) |= is_dir;
        }

        if children.is_empty() {
            return Err(KvsError::NotFound(key.to_string()));
        }

        let entries = children
            .into_iter()
            .map(|(name, is_dir)| DirEntry { name, is_dir })
            .collect();
        Ok(KvsDir::new(key, entries))
    }

    fn commit_now(&self, txn: Transaction) -> KvsResult<()> {
        if let Some(err) = self.commit_fault.read().ok().and_then(|f| f.clone()) {
            return Err(err);
        }
        let mut values = self
            .values
            .write()
            .map_err(|_| KvsError::io("commit", "store lock poisoned"))?;
        for op in txn.ops() {
            match op {
                TxnOp::Put { key, value } => put_value(&mut values, key, value.clone()),
                TxnOp::Unlink { key } => remove_subtree(&mut values, key),
            }
        }
        Ok(())
    }
}

impl Kvs for MemoryKvs {
    fn lookup(&self, key: &str) -> KvsFuture<'_, String> {
        let result = self.lookup_now(key);
        Box::pin(async move { result })
    }

    fn readdir(&self, key: &str) -> KvsFuture<'_, KvsDir> {
        let result = self.readdir_now(key);
        Box::pin(async move { result })
    }

    fn commit(&self, txn: Transaction) -> KvsFuture<'_, ()> {
        let result = self.commit_now(txn);
        Box::pin(async move { result })
    }
}

fn poisoned(key: &str) -> KvsError {
    KvsError::io(key, "store lock poisoned")
}

fn has_children(values: &BTreeMap<String, String>, key: &str) -> bool {
    let prefix = format!("{}{}", key, SEPARATOR);
    values
        .range(prefix.clone()..)
        .next()
        .is_some_and(|(k, _)| k.starts_with(&prefix))
}

/// Stores a value, replacing any value at an ancestor key and any subtree
/// at the key itself.
fn put_value(values: &mut BTreeMap<String, String>, key: &str, value: String) {
    let mut end = 0;
    while let Some(pos) = key[end..].find(SEPARATOR) {
        end += pos;
        values.remove(&key[..end]);
        end += 1;
    }
    remove_subtree(values, key);
    values.insert(key.to_string(), value);
}

fn remove_subtree(values: &mut BTreeMap<String, String>, key: &str) {
    let prefix = format!("{}{}", key, SEPARATOR);
    let doomed: Vec<String> = values
        .range(prefix.clone()..)
        .map(|(k, _)| k)
        .take_while(|k| k.starts_with(&prefix))
        .cloned()
        .collect();
    for k in doomed {
        values.remove(&k);
    }
    values.remove(key);
}
