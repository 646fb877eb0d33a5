//! Shared access to an entry.

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::Arc;

/// Cloneable handle to an entry.
///
/// Lookups (`state_at`) only need the read side and may run in parallel.
/// Snapshot creation, mutation and snapshot deletion all reshape the chain
/// and must hold the write side.
#[derive(Debug)]
pub struct EntryHandle<E> {
    inner: Arc<RwLock<E>>,
}

impl<E> Clone for EntryHandle<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E> EntryHandle<E> {
    pub fn new(entry: E) -> Self {
        Self {
            inner: Arc::new(RwLock::new(entry)),
        }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, E> {
        self.inner.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, E> {
        self.inner.write()
    }
}
