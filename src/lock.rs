use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
    thread::{self, ThreadId},
};

use parking_lot::{lock_api::ArcMutexGuard, Mutex, RawMutex};
use tracing::debug;

use crate::id::ComponentId;

/// Per-component construction locks.
///
/// A lock is held across a builder call for one id only, so the second caller waits for the first
/// and then reads the cached instance, while unrelated components keep building in parallel.
///
/// Every wait is recorded, so a wait that would close a cycle of threads blocked on each other's builds
/// is refused instead of blocking forever.
#[derive(Default)]
pub(crate) struct BuildLocks {
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    locks: BTreeMap<ComponentId, Arc<Mutex<()>>>,
    // Thread building each locked id
    holders: BTreeMap<ComponentId, ThreadId>,
    // Id each blocked thread waits for
    waiting: HashMap<ThreadId, ComponentId>,
}

impl State {
    /// Follows holders and the ids they wait for, starting from `id`, looking for `current`.
    fn would_deadlock(&self, current: ThreadId, id: ComponentId) -> bool {
        let mut next = id;
        for _ in 0..=self.waiting.len() {
            let Some(&holder) = self.holders.get(&next) else {
                return false;
            };
            if holder == current {
                return true;
            }
            let Some(&waits_for) = self.waiting.get(&holder) else {
                return false;
            };
            next = waits_for;
        }
        false
    }
}

impl BuildLocks {
    #[inline]
    #[must_use]
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Blocks until the lock of `id` is free and takes it.
    ///
    /// Returns `None` without blocking if the lock is held by the current thread, or by a thread that
    /// is itself waiting, directly or through other threads, for a lock the current thread holds.
    #[must_use]
    pub(crate) fn acquire(&self, id: ComponentId) -> Option<BuildLock<'_>> {
        let current = thread::current().id();

        let lock = {
            let mut state = self.state.lock();
            if state.would_deadlock(current, id) {
                debug!(%id, "Waiting for the lock would deadlock");
                return None;
            }
            state.waiting.insert(current, id);
            state.locks.entry(id).or_default().clone()
        };

        let guard = lock.lock_arc();

        let mut state = self.state.lock();
        state.waiting.remove(&current);
        state.holders.insert(id, current);

        Some(BuildLock {
            locks: self,
            id,
            guard: Some(guard),
        })
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.state.lock().locks.len()
    }
}

/// Held construction lock. Dropping it unlocks, and forgets the lock once nobody else waits for it.
pub(crate) struct BuildLock<'a> {
    locks: &'a BuildLocks,
    id: ComponentId,
    guard: Option<ArcMutexGuard<RawMutex, ()>>,
}

impl Drop for BuildLock<'_> {
    fn drop(&mut self) {
        let mut state = self.locks.state.lock();
        state.holders.remove(&self.id);
        drop(self.guard.take());

        if state.locks.get(&self.id).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            state.locks.remove(&self.id);
        }
    }
}
