//! The mutator lock (§5): the runtime's reader/writer lock coordinating GC
//! with any thread touching managed objects.
//!
//! Callbacks that touch the resolver, dex cache, object graph, or class
//! state hold a reader ("runnable") guard. Before a worker-pool join the
//! calling thread must drop to "suspended" — modeled here as a scoped guard
//! that's acquired on entry and released on every exit path, mirroring the
//! design note's "coroutine-like scoped object access".

use parking_lot::RwLock;

/// The shared mutator lock. One instance per driver, shared across all
/// worker threads.
#[derive(Default)]
pub struct MutatorLock {
    lock: RwLock<()>,
}

impl MutatorLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter "runnable" state: take a reader hold for the duration of the
    /// guard. Many threads may hold this concurrently.
    pub fn enter_runnable(&self) -> RunnableGuard<'_> {
        RunnableGuard {
            _guard: self.lock.read(),
        }
    }

    /// Take the exclusive ("world-stopped") hold, used by anything that
    /// must observe no concurrent mutator activity.
    pub fn enter_exclusive(&self) -> ExclusiveGuard<'_> {
        ExclusiveGuard {
            _guard: self.lock.write(),
        }
    }
}

/// RAII reader hold. Drop transitions the thread back to "suspended".
pub struct RunnableGuard<'a> {
    _guard: parking_lot::RwLockReadGuard<'a, ()>,
}

/// RAII writer hold.
pub struct ExclusiveGuard<'a> {
    _guard: parking_lot::RwLockWriteGuard<'a, ()>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn multiple_readers_proceed_concurrently() {
        let lock = Arc::new(MutatorLock::new());
        let mut handles = vec![];
        for _ in 0..8 {
            let lock = lock.clone();
            handles.push(thread::spawn(move || {
                let _g = lock.enter_runnable();
                thread::sleep(std::time::Duration::from_millis(5));
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
    }

    #[test]
    fn exclusive_excludes_readers() {
        let lock = MutatorLock::new();
        let _exclusive = lock.enter_exclusive();
        assert!(lock.lock.try_read().is_none());
    }
}
