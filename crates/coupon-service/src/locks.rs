//! Per-key async mutexes.
//!
//! Validations of the same coupon code run one at a time; different codes
//! never wait on each other. A key's entry is removed from the table as soon
//! as nobody holds or waits on it.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Table of named locks.
#[derive(Debug, Default)]
pub struct KeyedLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

/// Held lock for one key. Releases (and cleans up) on drop.
#[derive(Debug)]
pub struct KeyGuard<'a> {
    // Declaration order is drop order: unlock, then clean up the entry.
    _guard: OwnedMutexGuard<()>,
    _slot: Slot<'a>,
}

/// One task's reference to a key's mutex, from the start of the wait until
/// the lock is released. Dropping it removes the table entry once nobody
/// else refers to the mutex, whether the lock was taken or the wait was
/// cancelled.
#[derive(Debug)]
struct Slot<'a> {
    owner: &'a KeyedLocks,
    key: String,
    mutex: Arc<Mutex<()>>,
}

impl Slot<'_> {
    async fn acquire(&self) -> OwnedMutexGuard<()> {
        Arc::clone(&self.mutex).lock_owned().await
    }
}

impl Drop for Slot<'_> {
    fn drop(&mut self) {
        // Two references left means the table and this slot
        self.owner.locks.remove_if(&self.key, |_, mutex| {
            Arc::ptr_eq(mutex, &self.mutex) && Arc::strong_count(mutex) == 2
        });
    }
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `key`.
    ///
    /// Cancelling the returned future while it waits leaves no entry behind.
    pub async fn lock(&self, key: &str) -> KeyGuard<'_> {
        let slot = Slot {
            owner: self,
            key: key.to_string(),
            mutex: self
                .locks
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone(),
        };

        let guard = slot.acquire().await;

        KeyGuard {
            _guard: guard,
            _slot: slot,
        }
    }

    /// Number of keys currently held or awaited.
    pub fn active_keys(&self) -> usize {
        self.locks.len()
    }
}
