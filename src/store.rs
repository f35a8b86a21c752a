// src/store.rs

//! Whole-document persistence.
//!
//! Every data file (users, sellers, quizzes, attempts) is one JSON document
//! that is read and rewritten wholesale. `Shared` wraps a `Store` with an
//! exclusive lock so that read + mutate + write sequences never interleave.

use std::{
    marker::PhantomData,
    ops::{Deref, DerefMut},
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;
use tokio::sync::{Mutex, MutexGuard};

/// Errors surfaced by store adapters.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed document {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A key-value document store holding one value of type `T`.
#[async_trait]
pub trait Store<T>: Send + Sync {
    async fn read(&self) -> Result<T, StoreError>;
    async fn write(&self, value: &T) -> Result<(), StoreError>;
}

/// JSON file backend. A missing file reads as `T::default()`.
pub struct JsonFile<T> {
    path: PathBuf,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonFile<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl<T> JsonFile<T>
where
    T: Serialize + DeserializeOwned + Default + Send + Sync,
{
    /// Creates the file with `initial` if it does not exist yet.
    /// Returns `true` when the file was created.
    pub async fn ensure(&self, initial: &T) -> Result<bool, StoreError> {
        if tokio::fs::try_exists(&self.path)
            .await
            .map_err(|e| self.io_err(e))?
        {
            return Ok(false);
        }
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_err(e))?;
        }
        self.write(initial).await?;
        tracing::info!("Initialized data file {}", self.path.display());
        Ok(true)
    }
}

#[async_trait]
impl<T> Store<T> for JsonFile<T>
where
    T: Serialize + DeserializeOwned + Default + Send + Sync,
{
    async fn read(&self) -> Result<T, StoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(T::default()),
            Err(e) => return Err(self.io_err(e)),
        };

        serde_json::from_slice(&bytes).map_err(|source| StoreError::Malformed {
            path: self.path.clone(),
            source,
        })
    }

    async fn write(&self, value: &T) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(value)?;

        // Write next to the target and rename over it so readers never see a
        // truncated document.
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| self.io_err(e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| self.io_err(e))
    }
}

/// A store guarded by an exclusive lock.
pub struct Shared<T> {
    store: Arc<dyn Store<T>>,
    lock: Mutex<()>,
}

impl<T> Shared<T>
where
    T: Send + Sync,
{
    pub fn new(store: Arc<dyn Store<T>>) -> Self {
        Self {
            store,
            lock: Mutex::new(()),
        }
    }

    /// Reads the current document under the lock.
    pub async fn snapshot(&self) -> Result<T, StoreError> {
        let _guard = self.lock.lock().await;
        self.store.read().await
    }

    /// Takes the lock and loads the document for mutation.
    /// Nothing is written unless the returned transaction is committed.
    pub async fn begin(&self) -> Result<Txn<'_, T>, StoreError> {
        let guard = self.lock.lock().await;
        let value = self.store.read().await?;
        Ok(Txn {
            _guard: guard,
            store: self.store.as_ref(),
            value,
        })
    }
}

/// An open read-modify-write sequence. Holds the store lock until dropped.
pub struct Txn<'a, T> {
    _guard: MutexGuard<'a, ()>,
    store: &'a dyn Store<T>,
    value: T,
}

impl<T> Txn<'_, T>
where
    T: Send + Sync,
{
    pub async fn commit(self) -> Result<(), StoreError> {
        self.store.write(&self.value).await
    }
}

impl<T> Deref for Txn<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T> DerefMut for Txn<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

/// In-memory backend that counts writes and can be told to fail some.
#[cfg(test)]
pub struct MemoryStore<T> {
    value: std::sync::Mutex<T>,
    writes: std::sync::atomic::AtomicUsize,
    failing_writes: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl<T> MemoryStore<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: std::sync::Mutex::new(value),
            writes: std::sync::atomic::AtomicUsize::new(0),
            failing_writes: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Successful writes so far.
    pub fn writes(&self) -> usize {
        self.writes.load(std::sync::atomic::Ordering::SeqCst)
    }

    /// Makes the next `n` writes fail with an i/o error.
    pub fn fail_next_writes(&self, n: usize) {
        self.failing_writes.store(n, std::sync::atomic::Ordering::SeqCst);
    }
}

#[cfg(test)]
#[async_trait]
impl<T> Store<T> for MemoryStore<T>
where
    T: Clone + Send + Sync,
{
    async fn read(&self) -> Result<T, StoreError> {
        Ok(self.value.lock().unwrap().clone())
    }

    async fn write(&self, value: &T) -> Result<(), StoreError> {
        use std::sync::atomic::Ordering;

        let failing = self
            .failing_writes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if failing.is_ok() {
            return Err(StoreError::Io {
                path: PathBuf::from("memory"),
                source: std::io::Error::other("disk full"),
            });
        }

        *self.value.lock().unwrap() = value.clone();
        self.writes.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("quiz-store-{}-{}", std::process::id(), name))
            .join("doc.json")
    }

    #[tokio::test]
    async fn missing_file_reads_as_default() {
        let file: JsonFile<Vec<String>> = JsonFile::new(temp_path("missing"));
        assert!(file.read().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn ensure_creates_once_and_write_replaces() {
        let path = temp_path("ensure");
        let _ = tokio::fs::remove_file(&path).await;
        let file: JsonFile<HashMap<String, u32>> = JsonFile::new(&path);

        let mut initial = HashMap::new();
        initial.insert("a".to_string(), 1);
        assert!(file.ensure(&initial).await.unwrap());
        assert!(!file.ensure(&HashMap::new()).await.unwrap());
        assert_eq!(file.read().await.unwrap()["a"], 1);

        initial.insert("b".to_string(), 2);
        file.write(&initial).await.unwrap();
        assert_eq!(file.read().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn malformed_file_is_reported() {
        let path = temp_path("malformed");
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(&path, b"{ not json").await.unwrap();

        let file: JsonFile<Vec<String>> = JsonFile::new(&path);
        assert!(matches!(
            file.read().await,
            Err(StoreError::Malformed { .. })
        ));
    }

    #[tokio::test]
    async fn uncommitted_txn_does_not_write() {
        let memory = Arc::new(MemoryStore::new(vec![1u32]));
        let shared = Shared::new(memory.clone() as Arc<dyn Store<Vec<u32>>>);

        {
            let mut txn = shared.begin().await.unwrap();
            txn.push(2);
        }
        assert_eq!(memory.writes(), 0);
        assert_eq!(shared.snapshot().await.unwrap(), vec![1]);

        let mut txn = shared.begin().await.unwrap();
        txn.push(3);
        txn.commit().await.unwrap();
        assert_eq!(memory.writes(), 1);
        assert_eq!(shared.snapshot().await.unwrap(), vec![1, 3]);
    }
}
