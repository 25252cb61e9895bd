//! Per-identity command serialization.
//!
//! Commands on one member read-then-diff against projected state, so two of
//! them must never interleave. Different members never contend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

/// Lock table keyed by aggregate identity
#[derive(Debug, Default)]
pub struct IdentityLocks {
    locks: Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>,
}

impl IdentityLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to an aggregate; released when the guard drops
    pub async fn acquire(&self, aggregate_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            // Entries only the table references are idle
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(aggregate_id).or_default().clone()
        };

        lock.lock_owned().await
    }

    /// Identities currently held or awaited
    pub fn active(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|lock| Arc::strong_count(lock) > 1)
            .count()
    }
}
