use std::pin::Pin;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

type LockMap = DashMap<i32, Arc<Mutex<()>>>;

/// Keyed mutual exclusion over entity ids.
///
/// Entries exist only while someone holds or waits for the lock on an id.
#[derive(Debug, Default)]
pub struct EntityLocks {
    locks: Arc<LockMap>,
}

/// Holds the lock for one entity id until dropped.
pub struct EntityGuard {
    id: i32,
    guard: Option<OwnedMutexGuard<()>>,
    locks: Arc<LockMap>,
}

impl EntityLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, id: i32) -> EntityGuard {
        let mutex = self.locks.entry(id).or_default().clone();
        let mut acquire = Acquire {
            pending: Box::pin(mutex.lock_owned()),
            guard: EntityGuard {
                id,
                guard: None,
                locks: Arc::clone(&self.locks),
            },
        };

        let owned = (&mut acquire.pending).await;
        let Acquire { pending, mut guard } = acquire;
        drop(pending);
        guard.guard = Some(owned);
        guard
    }

    /// Number of ids currently locked or awaited.
    pub fn active(&self) -> usize {
        self.locks.len()
    }
}

/// A lock request in flight.
///
/// Fields drop in order, so a cancelled request releases its handle on the
/// mutex before the guard checks whether the entry can go.
struct Acquire<F> {
    pending: Pin<Box<F>>,
    guard: EntityGuard,
}

impl Drop for EntityGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Only the map's own reference left means nobody is waiting.
        self.locks
            .remove_if(&self.id, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}
