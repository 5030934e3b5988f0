//! In-memory resource store.
//!
//! A ready-made [`ResourceHandler`] exposing all five capabilities over an
//! ordered map. Nothing is persisted; it backs the demo binary and tests.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, RwLock,
};

use async_trait::async_trait;
use indexmap::IndexMap;
use reason_core::{
    Capabilities, Creator, Deleter, Getter, Lister, ResourceError, ResourceHandler, Schema, Updater,
};
use serde::Serialize;

/// A record with a numeric id assigned by the store.
pub trait Record: Clone + Serialize + Send + Sync + 'static {
    fn id(&self) -> u64;
    fn set_id(&mut self, id: u64);
}

/// Thread-safe registry of records, kept in insertion order.
#[derive(Debug)]
pub struct MemoryStore<T> {
    path: String,
    entries: RwLock<IndexMap<u64, T>>,
    next_id: AtomicU64,
}

impl<T: Record> MemoryStore<T> {
    /// Create an empty store served under `path`.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self::with_records(path, Vec::new())
    }

    /// Create a store seeded with `records`, keeping their ids. New records
    /// are numbered after the highest seeded id.
    #[must_use]
    pub fn with_records(path: impl Into<String>, records: impl IntoIterator<Item = T>) -> Self {
        let entries: IndexMap<u64, T> = records.into_iter().map(|r| (r.id(), r)).collect();
        let next_id = entries.keys().max().map_or(1, |max| max + 1);
        Self {
            path: path.into(),
            entries: RwLock::new(entries),
            next_id: AtomicU64::new(next_id),
        }
    }

    /// Store `record` under a freshly assigned id and return it.
    ///
    /// # Panics
    /// Panics if the internal `RwLock` is poisoned.
    pub fn insert(&self, mut record: T) -> T {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        record.set_id(id);
        #[expect(clippy::expect_used, reason = "lock poisoning is unrecoverable")]
        self.entries
            .write()
            .expect("memory store write lock poisoned")
            .insert(id, record.clone());
        record
    }

    /// Look up a record by id.
    ///
    /// # Panics
    /// Panics if the internal `RwLock` is poisoned.
    #[must_use]
    pub fn get(&self, id: u64) -> Option<T> {
        #[expect(clippy::expect_used, reason = "lock poisoning is unrecoverable")]
        let entries = self.entries.read().expect("memory store read lock poisoned");
        entries.get(&id).cloned()
    }

    /// Replace the record stored under `record.id()`. Returns `false` if no
    /// such record exists.
    ///
    /// # Panics
    /// Panics if the internal `RwLock` is poisoned.
    pub fn replace(&self, record: T) -> bool {
        #[expect(clippy::expect_used, reason = "lock poisoning is unrecoverable")]
        let mut entries = self.entries.write().expect("memory store write lock poisoned");
        match entries.get_mut(&record.id()) {
            Some(slot) => {
                *slot = record;
                true
            }
            None => false,
        }
    }

    /// Remove a record by id. Returns the removed record, if any.
    ///
    /// # Panics
    /// Panics if the internal `RwLock` is poisoned.
    pub fn remove(&self, id: u64) -> Option<T> {
        #[expect(clippy::expect_used, reason = "lock poisoning is unrecoverable")]
        let mut entries = self.entries.write().expect("memory store write lock poisoned");
        entries.shift_remove(&id)
    }

    /// All records in insertion order.
    ///
    /// # Panics
    /// Panics if the internal `RwLock` is poisoned.
    #[must_use]
    pub fn records(&self) -> Vec<T> {
        #[expect(clippy::expect_used, reason = "lock poisoning is unrecoverable")]
        let entries = self.entries.read().expect("memory store read lock poisoned");
        entries.values().cloned().collect()
    }

    /// # Panics
    /// Panics if the internal `RwLock` is poisoned.
    #[must_use]
    pub fn len(&self) -> usize {
        #[expect(clippy::expect_used, reason = "lock poisoning is unrecoverable")]
        let entries = self.entries.read().expect("memory store read lock poisoned");
        entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn parse_id(id: &str) -> Result<u64, ResourceError> {
    id.parse().map_err(|_| ResourceError::NotFound)
}

impl<T: Record + Schema> ResourceHandler for MemoryStore<T> {
    type Resource = T;
    type Schema = T;

    fn path(&self) -> &str {
        &self.path
    }

    fn capabilities(self: Arc<Self>) -> Capabilities<T, T> {
        Capabilities::all(self)
    }
}

#[async_trait]
impl<T: Record> Getter<T> for MemoryStore<T> {
    async fn get_resource(&self, id: &str) -> Result<T, ResourceError> {
        self.get(parse_id(id)?).ok_or(ResourceError::NotFound)
    }
}

#[async_trait]
impl<T: Record> Lister<T> for MemoryStore<T> {
    async fn list_resource(&self) -> Result<Vec<T>, ResourceError> {
        Ok(self.records())
    }
}

#[async_trait]
impl<T: Record> Creator<T, T> for MemoryStore<T> {
    async fn create_resource(&self, input: T) -> Result<T, ResourceError> {
        let created = self.insert(input);
        tracing::debug!(path = %self.path, id = created.id(), "created record");
        Ok(created)
    }
}

/// Replaces the stored record with the decoded input, keeping its id.
#[async_trait]
impl<T: Record> Updater<T, T> for MemoryStore<T> {
    async fn update_resource(&self, existing: T, mut input: T) -> Result<T, ResourceError> {
        input.set_id(existing.id());
        if !self.replace(input.clone()) {
            return Err(ResourceError::NotFound);
        }
        Ok(input)
    }
}

#[async_trait]
impl<T: Record> Deleter<T> for MemoryStore<T> {
    async fn delete_resource(&self, existing: T) -> Result<(), ResourceError> {
        self.remove(existing.id()).map(|_| ()).ok_or(ResourceError::NotFound)
    }
}
