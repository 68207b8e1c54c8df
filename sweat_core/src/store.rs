//! Storage backends behind a transactional unit-of-work abstraction.
//!
//! The engine never touches collections directly; every operation runs in a
//! `read` or `transact` closure. A transaction commits only when the closure
//! returns `Ok`, so a failed operation leaves no partial state, and
//! transactions are serialized so check-then-act pairs (active-session
//! check, balance check) cannot interleave.

use crate::{DataSet, Error, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;

/// Transactional access to the full dataset
pub trait Store: Send + Sync {
    /// Run a read-only closure against the committed dataset
    fn read<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&DataSet) -> Result<T>;

    /// Run a mutating closure as one atomic unit: commit on `Ok`,
    /// discard every change on `Err`
    fn transact<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut DataSet) -> Result<T>;
}

// ============================================================================
// In-memory store
// ============================================================================

/// Thread-safe in-memory store
///
/// Transactions mutate a working copy under the lock and swap it in on
/// commit. The single mutex is the single-writer mechanism that protects
/// the concurrency-sensitive invariants.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: Mutex<DataSet>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(data: DataSet) -> Self {
        Self {
            data: Mutex::new(data),
        }
    }
}

impl Store for MemoryStore {
    fn read<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&DataSet) -> Result<T>,
    {
        let guard = self.data.lock().unwrap();
        f(&guard)
    }

    fn transact<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut DataSet) -> Result<T>,
    {
        let mut guard = self.data.lock().unwrap();
        let mut working = guard.clone();
        let out = f(&mut working)?;
        *guard = working;
        Ok(out)
    }
}

// ============================================================================
// File-backed store
// ============================================================================

/// JSON-file store with cross-process locking
///
/// A sibling lock file (never renamed, so locks stay valid across the
/// atomic replace) serializes access: shared for reads, exclusive for
/// transactions. Commits write to a temp file in the same directory,
/// sync, and rename over the data file.
pub struct FileStore {
    path: PathBuf,
    lock_path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let lock_path = path.with_extension("lock");
        Self { path, lock_path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_file(&self) -> Result<File> {
        if let Some(parent) = self.lock_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .open(&self.lock_path)?;
        Ok(file)
    }

    /// Load the committed dataset; a missing file is an empty dataset
    fn load(&self) -> Result<DataSet> {
        if !self.path.exists() {
            tracing::debug!("No data file at {:?}, starting empty", self.path);
            return Ok(DataSet::default());
        }
        let contents = std::fs::read_to_string(&self.path)?;
        let data = serde_json::from_str(&contents)?;
        Ok(data)
    }

    /// Atomically replace the data file
    fn save(&self, data: &DataSet) -> Result<()> {
        let parent = self.path.parent().ok_or_else(|| {
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "data path missing parent",
            ))
        })?;
        std::fs::create_dir_all(parent)?;

        let temp = NamedTempFile::new_in(parent)?;
        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(data)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }
        temp.as_file().sync_all()?;
        temp.persist(&self.path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Committed dataset to {:?}", self.path);
        Ok(())
    }
}

impl Store for FileStore {
    fn read<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&DataSet) -> Result<T>,
    {
        let lock = self.lock_file()?;
        lock.lock_shared()?;
        let result = self.load().and_then(|data| f(&data));
        lock.unlock()?;
        result
    }

    fn transact<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut DataSet) -> Result<T>,
    {
        let lock = self.lock_file()?;
        lock.lock_exclusive()?;
        let result = (|| {
            let mut data = self.load()?;
            let out = f(&mut data)?;
            self.save(&data)?;
            Ok(out)
        })();
        lock.unlock()?;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_memory_transact_commits_on_ok() {
        let store = MemoryStore::new();
        store
            .transact(|data| {
                catalog::seed_defaults(data);
                Ok(())
            })
            .unwrap();

        let count = store.read(|data| Ok(data.workouts.len())).unwrap();
        assert!(count > 0);
    }

    #[test]
    fn test_memory_transact_rolls_back_on_err() {
        let store = MemoryStore::new();
        let result: Result<()> = store.transact(|data| {
            catalog::seed_defaults(data);
            Err(Error::InvalidArgument("abort".into()))
        });
        assert!(result.is_err());

        // The seeding above must not have leaked out
        let count = store.read(|data| Ok(data.workouts.len())).unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_file_store_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(temp_dir.path().join("data.json"));

        store
            .transact(|data| {
                catalog::seed_defaults(data);
                Ok(())
            })
            .unwrap();

        // A fresh store over the same path sees the committed data
        let reopened = FileStore::new(temp_dir.path().join("data.json"));
        let count = reopened.read(|data| Ok(data.workouts.len())).unwrap();
        assert_eq!(count, 7);
    }

    #[test]
    fn test_file_store_missing_file_is_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(temp_dir.path().join("missing.json"));
        let empty = store.read(|data| Ok(data.is_empty())).unwrap();
        assert!(empty);
    }

    #[test]
    fn test_file_transact_rolls_back_on_err() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(temp_dir.path().join("data.json"));
        store
            .transact(|data| {
                catalog::seed_defaults(data);
                Ok(())
            })
            .unwrap();

        let result: Result<()> = store.transact(|data| {
            data.workouts.clear();
            Err(Error::InvalidArgument("abort".into()))
        });
        assert!(result.is_err());

        let count = store.read(|data| Ok(data.workouts.len())).unwrap();
        assert_eq!(count, 7);
    }

    #[test]
    fn test_corrupted_file_surfaces_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("data.json");
        std::fs::write(&path, "{ not json }").unwrap();

        let store = FileStore::new(&path);
        let result = store.read(|_| Ok(()));
        assert!(matches!(result, Err(Error::Json(_))));
    }

    #[test]
    fn test_concurrent_memory_transactions_serialize() {
        let store = Arc::new(MemoryStore::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    store
                        .transact(|data| {
                            let limits = crate::Limits::default();
                            catalog::add_action(data, &limits, "tick", 1)?;
                            Ok(())
                        })
                        .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let count = store.read(|data| Ok(data.actions.len())).unwrap();
        assert_eq!(count, 8);
    }
}
