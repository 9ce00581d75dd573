//! Filesystem-backed KVS
//!
//! Key `a.b.c` maps to `<root>/a/b/c`. Directories are directories, values
//! are regular files holding the value text.
//!
//! Commits write each value and fsync both the file and its parent
//! directory before resolving. A commit is applied in operation order; it is
//! not atomic across operations.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::errors::{KvsError, KvsResult};
use super::txn::{Transaction, TxnOp};
use super::{validate_key, DirEntry, Kvs, KvsDir, KvsFuture, SEPARATOR};

/// KVS rooted at a local directory
#[derive(Debug, Clone)]
pub struct DirKvs {
    root: PathBuf,
}

impl DirKvs {
    /// Opens a store rooted at `root`, creating the directory if needed
    pub fn open(root: impl AsRef<Path>) -> KvsResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(|e| {
            KvsError::io(
                root.display().to_string(),
                format!("failed to create store directory: {}", e),
            )
        })?;
        Ok(Self { root })
    }

    /// The store's root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a key to its path under the root
    pub fn key_path(&self, key: &str) -> KvsResult<PathBuf> {
        validate_key(key)?;
        let mut path = self.root.clone();
        for segment in key.split(SEPARATOR) {
            if segment.contains('/') || segment.contains('\\') {
                return Err(KvsError::InvalidKey(key.to_string()));
            }
            path.push(segment);
        }
        Ok(path)
    }
}

impl Kvs for DirKvs {
    fn lookup(&self, key: &str) -> KvsFuture<'_, String> {
        let key = key.to_string();
        Box::pin(async move {
            let path = self.key_path(&key)?;
            let meta = tokio::fs::metadata(&path)
                .await
                .map_err(|e| map_io(&key, e))?;
            if meta.is_dir() {
                return Err(KvsError::IsADirectory(key));
            }
            tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| map_io(&key, e))
        })
    }

    fn readdir(&self, key: &str) -> KvsFuture<'_, KvsDir> {
        let key = key.to_string();
        Box::pin(async move {
            let path = self.key_path(&key)?;
            let meta = tokio::fs::metadata(&path)
                .await
                .map_err(|e| map_io(&key, e))?;
            if !meta.is_dir() {
                return Err(KvsError::NotADirectory(key));
            }

            let mut reader = tokio::fs::read_dir(&path)
                .await
                .map_err(|e| map_io(&key, e))?;
            let mut entries = Vec::new();
            while let Some(entry) = reader.next_entry().await.map_err(|e| map_io(&key, e))? {
                let Ok(name) = entry.file_name().into_string() else {
                    continue;
                };
                if name.contains(SEPARATOR) {
                    continue;
                }
                let file_type = entry.file_type().await.map_err(|e| map_io(&key, e))?;
                entries.push(DirEntry {
                    name,
                    is_dir: file_type.is_dir(),
                });
            }
            // Filesystem order is arbitrary
            entries.sort_by(|a, b| a.name.cmp(&b.name));

            Ok(KvsDir::new(key, entries))
        })
    }

    fn commit(&self, txn: Transaction) -> KvsFuture<'_, ()> {
        let store = self.clone();
        Box::pin(async move {
            tokio::task::spawn_blocking(move || store.apply(&txn))
                .await
                .map_err(|e| KvsError::io("commit", format!("commit task failed: {}", e)))?
        })
    }
}

impl DirKvs {
    fn apply(&self, txn: &Transaction) -> KvsResult<()> {
        for op in txn.ops() {
            match op {
                TxnOp::Put { key, value } => self.write_value(key, value)?,
                TxnOp::Unlink { key } => self.unlink(key)?,
            }
        }
        Ok(())
    }

    fn write_value(&self, key: &str, value: &str) -> KvsResult<()> {
        let path = self.key_path(key)?;
        if let Some(parent) = path.parent() {
            self.make_parent_dirs(key, parent)?;
        }
        if path.is_dir() {
            fs::remove_dir_all(&path).map_err(|e| map_io(key, e))?;
        }

        let mut file = File::create(&path).map_err(|e| map_io(key, e))?;
        file.write_all(value.as_bytes())
            .map_err(|e| map_io(key, e))?;
        // fsync is mandatory before acknowledging
        file.sync_all().map_err(|e| map_io(key, e))?;

        if let Some(parent) = path.parent() {
            let dir = OpenOptions::new()
                .read(true)
                .open(parent)
                .map_err(|e| map_io(key, e))?;
            dir.sync_all().map_err(|e| map_io(key, e))?;
        }
        Ok(())
    }

    /// Creates missing ancestors, replacing any ancestor that is a value
    fn make_parent_dirs(&self, key: &str, parent: &Path) -> KvsResult<()> {
        let mut current = self.root.clone();
        let relative = parent.strip_prefix(&self.root).unwrap_or(parent);
        for component in relative.components() {
            current.push(component);
            if current.is_file() {
                fs::remove_file(&current).map_err(|e| map_io(key, e))?;
            }
        }
        fs::create_dir_all(parent).map_err(|e| map_io(key, e))
    }

    fn unlink(&self, key: &str) -> KvsResult<()> {
        let path = self.key_path(key)?;
        let result = if path.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        match result {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(map_io(key, e)),
        }
    }
}

fn map_io(key: &str, err: io::Error) -> KvsError {
    if err.kind() == io::ErrorKind::NotFound {
        KvsError::NotFound(key.to_string())
    } else {
        KvsError::io(key, err.to_string())
    }
}
