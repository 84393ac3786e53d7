//! Per-report serialization locks.
//!
//! The vote ledger's check-then-write sequence (count existing votes,
//! insert vote, increment counter, rescore) is not safe under
//! concurrent execution for the same report: two votes could both pass
//! the quota check before either commits. Every mutation of a report's
//! counters or derived fields therefore runs under that report's lock
//! from this registry. Operations on different reports proceed in
//! parallel.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::OwnedMutexGuard;
use uuid::Uuid;

/// Registry of per-report async mutexes.
#[derive(Default)]
pub struct ReportLocks {
    inner: Mutex<HashMap<Uuid, Arc<tokio::sync::Mutex<()>>>>,
}

impl ReportLocks {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the lock for a report, creating it on first use.
    ///
    /// # Panics
    ///
    /// Panics if the registry mutex is poisoned.
    pub async fn acquire(&self, id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut registry = self.inner.lock().expect("report lock registry poisoned");
            Arc::clone(
                registry
                    .entry(id)
                    .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(()))),
            )
        };

        lock.lock_owned().await
    }

    /// Drops the lock entry for a deleted report.
    ///
    /// In-flight holders keep their `Arc`; later acquisitions for a
    /// recreated ID get a fresh lock.
    ///
    /// # Panics
    ///
    /// Panics if the registry mutex is poisoned.
    pub fn remove(&self, id: Uuid) {
        self.inner
            .lock()
            .expect("report lock registry poisoned")
            .remove(&id);
    }
}
