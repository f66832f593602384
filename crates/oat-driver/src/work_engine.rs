//! The parallel work engine (§4.2): fans a `[begin, end)` range out across a
//! bounded number of scoped worker threads, joined before `for_all` returns.
//!
//! `for_all` borrows its callback (and whatever the callback itself
//! borrows) for the duration of the call only, via `crossbeam::thread::scope`
//! — the scope guarantees every spawned thread is joined before `scope()`
//! returns, so borrowed collaborators never need to be `'static` or wrapped
//! in `Arc`. This mirrors cargo's own scoped job-queue dispatch
//! (`cargo::core::compiler::job_queue`), which reaches for the same
//! primitive to fan work out over borrowed build-plan state.

use crossbeam::thread;

/// How many scoped threads `for_all` spawns when asked to partition work
/// into `thread_count` strides.
pub struct WorkerPool {
    thread_count: usize,
}

impl WorkerPool {
    /// `thread_count` is the default stride width `for_all` callers should
    /// pass; it's stored here (rather than read fresh from `num_cpus` at
    /// every call site) so one orchestrator consistently fans every stage
    /// out the same way.
    pub fn new(thread_count: usize) -> Self {
        Self {
            thread_count: thread_count.max(1),
        }
    }

    /// Number of threads this pool fans `for_all` calls out across by
    /// default.
    pub fn thread_count(&self) -> usize {
        self.thread_count
    }

    /// Dispatch `work_units` tasks over `[begin, end)`, each task *i*
    /// processing indices `begin+i, begin+i+work_units, begin+i+2*work_units, …`
    /// — a strided partition, not contiguous chunks, so that adjacent
    /// (often related) indices land on different workers. Blocks until every
    /// task has run to completion.
    pub fn for_all<F>(&self, begin: u32, end: u32, work_units: u32, callback: F)
    where
        F: Fn(u32) + Sync,
    {
        if begin >= end || work_units == 0 {
            return;
        }
        let callback = &callback;
        let result = thread::scope(|scope| {
            for i in 0..work_units {
                scope.spawn(move |_| {
                    let mut idx = begin + i;
                    while idx < end {
                        callback(idx);
                        idx += work_units;
                    }
                });
            }
        });
        // `thread::scope`'s error is `Box<dyn Any + Send>`, which carries
        // whatever a panicking worker passed to `panic!` but implements
        // neither `Debug` nor `Display` — resume the panic on this thread
        // instead of `unwrap`ing it away.
        if let Err(payload) = result {
            std::panic::resume_unwind(payload);
        }
    }
}
