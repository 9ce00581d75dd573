//! KVS transactions
//!
//! A transaction is an ordered list of operations applied atomically by
//! [`Kvs::commit`](super::Kvs::commit).

use serde::Serialize;

use super::errors::{KvsError, KvsResult};
use super::validate_key;

/// One operation in a transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxnOp {
    /// Store a value, replacing whatever was at the key
    Put { key: String, value: String },
    /// Remove a key and everything below it
    Unlink { key: String },
}

impl TxnOp {
    /// The key this operation touches
    pub fn key(&self) -> &str {
        match self {
            TxnOp::Put { key, .. } | TxnOp::Unlink { key } => key,
        }
    }
}

/// An ordered set of KVS updates
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transaction {
    ops: Vec<TxnOp>,
}

impl Transaction {
    /// Creates an empty transaction
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a put of a raw string value
    pub fn put(&mut self, key: &str, value: impl Into<String>) -> KvsResult<()> {
        validate_key(key)?;
        self.ops.push(TxnOp::Put {
            key: key.to_string(),
            value: value.into(),
        });
        Ok(())
    }

    /// Adds a put of a JSON-encoded value
    pub fn put_json<T: Serialize>(&mut self, key: &str, value: &T) -> KvsResult<()> {
        let json = serde_json::to_string(value)
            .map_err(|e| KvsError::io(key, format!("failed to encode value: {}", e)))?;
        self.put(key, json)
    }

    /// Adds removal of a key
    pub fn unlink(&mut self, key: &str) -> KvsResult<()> {
        validate_key(key)?;
        self.ops.push(TxnOp::Unlink {
            key: key.to_string(),
        });
        Ok(())
    }

    pub fn ops(&self) -> &[TxnOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}
