//! Explicit task queue standing in for a script engine's microtask queue.
//!
//! Two kinds of work are queued:
//!
//! - **Microtasks**: one-shot closures, run strictly in FIFO order.
//! - **Jobs**: effect re-runs keyed by effect id. A job queued while an
//!   identical one is still pending is dropped. Pending jobs are drained
//!   together by a single "flush jobs" task occupying one slot in the FIFO.
//!
//! Nothing runs until [`Scheduler::flush`] is called, which guarantees that
//! queued work only happens after the current synchronous unit completes.

use std::collections::VecDeque;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;
use tracing::warn;

use crate::constants::DEFAULT_MAX_FLUSH_TASKS;

pub type Task = Box<dyn FnOnce() + Send + 'static>;

enum Slot {
    Microtask(Task),
    FlushJobs,
}

#[derive(Default)]
struct JobQueue {
    jobs: VecDeque<(u64, Task)>,
    flush_queued: bool,
}

struct SchedulerInner {
    queue: Mutex<VecDeque<Slot>>,
    jobs: Mutex<JobQueue>,
    flushing: AtomicBool,
    max_tasks: usize,
}

#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<SchedulerInner>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FLUSH_TASKS)
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("pending", &self.pending())
            .field("max_tasks", &self.inner.max_tasks)
            .finish()
    }
}

impl Scheduler {
    /// `max_tasks` caps how many tasks a single [`flush`](Self::flush) runs.
    pub fn new(max_tasks: usize) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                queue: Mutex::new(VecDeque::new()),
                jobs: Mutex::new(JobQueue::default()),
                flushing: AtomicBool::new(false),
                max_tasks: max_tasks.max(1),
            }),
        }
    }

    pub fn queue_microtask(
        &self,
        task: impl FnOnce() + Send + 'static,
    ) {
        self.inner.queue.lock().push_back(Slot::Microtask(Box::new(task)));
    }

    /// Queue `job` under `id`. Returns false when a job with the same id is
    /// already pending.
    pub fn queue_job(
        &self,
        id: u64,
        job: impl FnOnce() + Send + 'static,
    ) -> bool {
        let mut jobs = self.inner.jobs.lock();
        if jobs.jobs.iter().any(|(pending, _)| *pending == id) {
            return false;
        }
        jobs.jobs.push_back((id, Box::new(job)));

        if !jobs.flush_queued {
            jobs.flush_queued = true;
            drop(jobs);
            self.inner.queue.lock().push_back(Slot::FlushJobs);
        }
        true
    }

    /// Number of queued microtasks plus pending jobs.
    pub fn pending(&self) -> usize {
        let microtasks = self
            .inner
            .queue
            .lock()
            .iter()
            .filter(|slot| matches!(slot, Slot::Microtask(_)))
            .count();
        microtasks + self.inner.jobs.lock().jobs.len()
    }

    pub fn is_idle(&self) -> bool {
        self.pending() == 0
    }

    /// Drain the queue, including work queued by the tasks themselves.
    ///
    /// Returns the number of tasks that ran. A call made while a drain is
    /// already in progress (from inside a task) returns 0 immediately.
    pub fn flush(&self) -> usize {
        let Some(_guard) = FlushGuard::acquire(&self.inner.flushing) else {
            return 0;
        };

        let mut ran = 0;
        while ran < self.inner.max_tasks {
            let slot = self.inner.queue.lock().pop_front();
            match slot {
                Some(Slot::Microtask(task)) => {
                    task();
                    ran += 1;
                }
                Some(Slot::FlushJobs) => ran += self.run_jobs(self.inner.max_tasks - ran),
                None => break,
            }
        }

        if ran >= self.inner.max_tasks && !self.inner.queue.lock().is_empty() {
            warn!(
                ran,
                pending = self.pending(),
                "scheduler drain reached its task limit, remaining work stays queued"
            );
        }

        trace!(ran, "scheduler drained");
        ran
    }

    fn run_jobs(
        &self,
        budget: usize,
    ) -> usize {
        let mut ran = 0;
        loop {
            let next = {
                let mut jobs = self.inner.jobs.lock();
                if ran >= budget {
                    // Leave the rest for a later flush, keeping its FIFO slot
                    if !jobs.jobs.is_empty() {
                        drop(jobs);
                        self.inner.queue.lock().push_front(Slot::FlushJobs);
                    } else {
                        jobs.flush_queued = false;
                    }
                    return ran;
                }
                match jobs.jobs.pop_front() {
                    Some((_, job)) => job,
                    None => {
                        jobs.flush_queued = false;
                        return ran;
                    }
                }
            };
            let mut slot = JobSlotGuard {
                inner: &self.inner,
                finished: false,
            };
            next();
            slot.finished = true;
            ran += 1;
        }
    }
}

/// Marks a drain in progress; cleared on drop, including when a task panics.
struct FlushGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> FlushGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        if flag.swap(true, Ordering::AcqRel) {
            return None;
        }
        Some(Self { flag })
    }
}

impl Drop for FlushGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Restores the jobs slot when a job unwinds, so jobs queued later still get
/// a FIFO slot.
struct JobSlotGuard<'a> {
    inner: &'a SchedulerInner,
    finished: bool,
}

impl Drop for JobSlotGuard<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let mut jobs = self.inner.jobs.lock();
        if jobs.jobs.is_empty() {
            jobs.flush_queued = false;
        } else {
            drop(jobs);
            self.inner.queue.lock().push_front(Slot::FlushJobs);
        }
    }
}
