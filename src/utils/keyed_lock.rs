use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use tokio::sync::{Mutex, OwnedMutexGuard};

// ============================================================================
// Keyed Locks - one mutual-exclusion token per key
// ============================================================================
//
// Hands out an async lock per key (order item id, measurement id, ...).
// Slots are created on first use and removed again once the last holder or
// waiter goes away (released, or cancelled while waiting), so the map only
// ever contains keys that are in use.
//
// ============================================================================

type Slot = Arc<Mutex<()>>;
type SlotMap<K> = Arc<StdMutex<HashMap<K, Slot>>>;

pub struct KeyedLocks<K> {
    slots: SlotMap<K>,
}

impl<K> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self {
            slots: Arc::new(StdMutex::new(HashMap::new())),
        }
    }
}

impl<K> KeyedLocks<K>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`.
    pub async fn lock(&self, key: K) -> KeyedGuard<K> {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            slots
                .entry(key.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };

        // Built before waiting so a cancelled waiter still releases its slot.
        let mut pending = KeyedGuard {
            key,
            slot: Arc::clone(&slot),
            guard: None,
            slots: Arc::clone(&self.slots),
        };
        let acquire = slot.lock_owned();
        pending.guard = Some(acquire.await);
        pending
    }

    /// Number of keys currently held or waited on.
    pub fn active_keys(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

pub struct KeyedGuard<K>
where
    K: Eq + Hash,
{
    key: K,
    slot: Slot,
    guard: Option<OwnedMutexGuard<()>>,
    slots: SlotMap<K>,
}

impl<K> Drop for KeyedGuard<K>
where
    K: Eq + Hash,
{
    fn drop(&mut self) {
        self.guard.take();

        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        // Only the map and this guard still point at the slot: nobody else holds or waits.
        if Arc::strong_count(&self.slot) == 2 {
            slots.remove(&self.key);
        }
    }
}
