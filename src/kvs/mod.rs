//! Hierarchical key-value store client interface
//!
//! Keys are dot-separated paths (`job.0000.0004.b200.0000.eventlog`). Every
//! path prefix is a directory; leaves hold string values.
//!
//! Operations return boxed futures so the trait stays object safe and a
//! caller can create several requests before awaiting any of them.
//!
//! Two stores are provided:
//! - [`MemoryKvs`]: in-memory, with fault injection
//! - [`DirKvs`]: backed by a directory tree on the local filesystem

mod dir;
mod errors;
mod memory;
mod txn;

use std::future::Future;
use std::pin::Pin;

pub use dir::DirKvs;
pub use errors::{KvsError, KvsResult};
pub use memory::MemoryKvs;
pub use txn::{Transaction, TxnOp};

/// Key path separator
pub const SEPARATOR: char = '.';

/// Future returned by KVS operations
pub type KvsFuture<'a, T> = Pin<Box<dyn Future<Output = KvsResult<T>> + Send + 'a>>;

/// One child of a KVS directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Name relative to the directory
    pub name: String,
    /// True if the child is itself a directory
    pub is_dir: bool,
}

/// Listing of a KVS directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvsDir {
    key: String,
    entries: Vec<DirEntry>,
}

impl KvsDir {
    /// Creates a listing for the directory at `key`
    pub fn new(key: impl Into<String>, entries: Vec<DirEntry>) -> Self {
        Self {
            key: key.into(),
            entries,
        }
    }

    /// The directory's own key
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Children in the order the store listed them
    pub fn entries(&self) -> &[DirEntry] {
        &self.entries
    }

    /// True if `name` is a child directory
    pub fn is_dir(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name && e.is_dir)
    }

    /// Full key of a child
    pub fn key_at(&self, name: &str) -> String {
        format!("{}{}{}", self.key, SEPARATOR, name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Client of a hierarchical key-value store
pub trait Kvs: Send + Sync {
    /// Reads the value at `key`
    fn lookup(&self, key: &str) -> KvsFuture<'_, String>;

    /// Lists the directory at `key`
    fn readdir(&self, key: &str) -> KvsFuture<'_, KvsDir>;

    /// Applies a transaction; resolves once the store has made it durable
    fn commit(&self, txn: Transaction) -> KvsFuture<'_, ()>;
}

/// Checks that a key is a non-empty path with no empty segments
pub fn validate_key(key: &str) -> KvsResult<()> {
    if key.is_empty() || key.split(SEPARATOR).any(|segment| segment.is_empty()) {
        return Err(KvsError::InvalidKey(key.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_key() {
        assert!(validate_key("job").is_ok());
        assert!(validate_key("job.0000.0001").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("job.").is_err());
        assert!(validate_key(".job").is_err());
        assert!(validate_key("job..x").is_err());
    }

    #[test]
    fn test_dir_key_at() {
        let dir = KvsDir::new(
            "job.0000",
            vec![
                DirEntry {
                    name: "0001".into(),
                    is_dir: true,
                },
                DirEntry {
                    name: "stray".into(),
                    is_dir: false,
                },
            ],
        );
        assert_eq!(dir.key_at("0001"), "job.0000.0001");
        assert!(dir.is_dir("0001"));
        assert!(!dir.is_dir("stray"));
        assert_eq!(dir.len(), 2);
    }
}
