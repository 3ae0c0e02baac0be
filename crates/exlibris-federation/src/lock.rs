//! Per-IRI mutual exclusion.
//!
//! The protocol engine brackets every mutating call with `lock(iri)` and
//! `unlock(iri)`, possibly from different tasks, so a lock is held as an
//! owned guard parked in its table entry rather than as a scoped guard.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use exlibris_types::Iri;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::trace;

use crate::error::{FederationError, Result};

/// One lock per IRI, plus the guard of whoever currently holds it.
#[derive(Default)]
struct LockEntry {
    mutex: Arc<AsyncMutex<()>>,
    held: Mutex<Option<OwnedMutexGuard<()>>>,
}

impl LockEntry {
    fn is_held(&self) -> bool {
        self.held
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

/// Table of per-IRI locks.
///
/// Entries are created on first use under a short write lock on the table
/// and are never evicted; the table grows with the number of distinct IRIs
/// ever locked. Unrelated IRIs never contend beyond the table lookup.
#[derive(Default)]
pub struct LockManager {
    entries: RwLock<HashMap<Iri, Arc<LockEntry>>>,
}

impl LockManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, iri: &Iri) -> Arc<LockEntry> {
        if let Some(entry) = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(iri)
        {
            return Arc::clone(entry);
        }
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(entries.entry(iri.clone()).or_default())
    }

    /// Acquire the lock for `iri`, waiting as long as it takes.
    ///
    /// Succeeds whether or not anything exists at `iri`. Not reentrant: a
    /// task locking an IRI it already holds waits forever.
    pub async fn lock(&self, iri: &Iri) {
        let entry = self.entry(iri);
        let guard = Arc::clone(&entry.mutex).lock_owned().await;
        *entry.held.lock().unwrap_or_else(PoisonError::into_inner) = Some(guard);
        trace!(%iri, "locked");
    }

    /// Release the lock for `iri`.
    ///
    /// Fails with [`FederationError::NotLocked`] if `iri` was never locked
    /// or is not currently held.
    pub fn unlock(&self, iri: &Iri) -> Result<()> {
        let entry = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(iri)
            .cloned()
            .ok_or_else(|| FederationError::NotLocked(iri.clone()))?;
        let guard = entry
            .held
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or_else(|| FederationError::NotLocked(iri.clone()))?;
        drop(guard);
        trace!(%iri, "unlocked");
        Ok(())
    }

    /// Number of distinct IRIs ever locked.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of IRIs currently held.
    pub fn held_count(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|e| e.is_held())
            .count()
    }
}

impl std::fmt::Debug for LockManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockManager")
            .field("entries", &self.len())
            .field("held", &self.held_count())
            .finish()
    }
}
