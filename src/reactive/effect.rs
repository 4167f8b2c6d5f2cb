//! Effect runtime: dependency capture and re-run scheduling.
//!
//! An effect is a closure run once immediately. Every tracked read made while
//! it runs subscribes it to that dependency. A later write to any of those
//! dependencies queues the effect as a job on the [`Scheduler`]; dependencies
//! are re-captured from scratch on every run.

use std::collections::HashSet;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Weak;

use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::trace;

use super::Scheduler;

pub type EffectId = u64;
pub type StateId = u64;

/// What a tracked read observed
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Dep {
    /// The value at a path
    Path(String),
    /// The key set of the object/array at a path
    Keys(String),
}

pub(crate) type DepKey = (StateId, Dep);

struct EffectCell {
    run: Mutex<Box<dyn FnMut() + Send>>,
    deps: Mutex<HashSet<DepKey>>,
    stopped: AtomicBool,
}

struct ReactivityInner {
    scheduler: Scheduler,
    next_effect: AtomicU64,
    next_state: AtomicU64,
    effects: DashMap<EffectId, Arc<EffectCell>>,
    subscribers: DashMap<DepKey, HashSet<EffectId>>,
    active: Mutex<Vec<Option<EffectId>>>,
}

/// Handle to a tracking runtime, cheap to clone
#[derive(Clone)]
pub struct Reactivity {
    inner: Arc<ReactivityInner>,
}

impl std::fmt::Debug for Reactivity {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("Reactivity")
            .field("effects", &self.inner.effects.len())
            .field("scheduler", &self.inner.scheduler)
            .finish()
    }
}

impl Default for Reactivity {
    fn default() -> Self {
        Self::new(Scheduler::default())
    }
}

impl Reactivity {
    pub fn new(scheduler: Scheduler) -> Self {
        Self {
            inner: Arc::new(ReactivityInner {
                scheduler,
                next_effect: AtomicU64::new(1),
                next_state: AtomicU64::new(1),
                effects: DashMap::new(),
                subscribers: DashMap::new(),
                active: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.inner.scheduler
    }

    pub(crate) fn next_state_id(&self) -> StateId {
        self.inner.next_state.fetch_add(1, Ordering::Relaxed)
    }

    /// Run `f` now and again whenever something it read changes.
    pub fn effect(
        &self,
        f: impl FnMut() + Send + 'static,
    ) -> EffectHandle {
        let id = self.inner.next_effect.fetch_add(1, Ordering::Relaxed);
        let cell = Arc::new(EffectCell {
            run: Mutex::new(Box::new(f)),
            deps: Mutex::new(HashSet::new()),
            stopped: AtomicBool::new(false),
        });
        self.inner.effects.insert(id, cell);
        run_effect(&self.inner, id);

        EffectHandle {
            id,
            runtime: Arc::downgrade(&self.inner),
        }
    }

    /// Run `f` without recording any dependency.
    pub fn untracked<R>(
        &self,
        f: impl FnOnce() -> R,
    ) -> R {
        let _frame = ActiveFrame::push(&self.inner, None);
        f()
    }

    /// Number of live effects.
    pub fn effect_count(&self) -> usize {
        self.inner.effects.len()
    }

    pub(crate) fn track(
        &self,
        key: DepKey,
    ) {
        let Some(Some(id)) = self.inner.active.lock().last().copied() else {
            return;
        };
        let Some(cell) = self.inner.effects.get(&id).map(|c| c.value().clone()) else {
            return;
        };
        if cell.deps.lock().insert(key.clone()) {
            self.inner.subscribers.entry(key).or_default().insert(id);
        }
    }

    pub(crate) fn trigger(
        &self,
        key: &DepKey,
    ) {
        let Some(subscribed) = self.inner.subscribers.get(key).map(|s| s.value().clone()) else {
            return;
        };
        let running: HashSet<EffectId> = self.inner.active.lock().iter().flatten().copied().collect();

        for id in subscribed {
            if running.contains(&id) {
                continue;
            }
            let runtime = Arc::downgrade(&self.inner);
            let queued = self.inner.scheduler.queue_job(id, move || {
                if let Some(runtime) = runtime.upgrade() {
                    run_effect(&runtime, id);
                }
            });
            trace!(effect = id, dep = ?key.1, queued, "effect triggered");
        }
    }
}

/// Entry on the active-effect stack, popped on drop so a panicking run
/// cannot leave it behind.
struct ActiveFrame<'a> {
    runtime: &'a ReactivityInner,
}

impl<'a> ActiveFrame<'a> {
    fn push(
        runtime: &'a ReactivityInner,
        id: Option<EffectId>,
    ) -> Self {
        runtime.active.lock().push(id);
        Self { runtime }
    }
}

impl Drop for ActiveFrame<'_> {
    fn drop(&mut self) {
        self.runtime.active.lock().pop();
    }
}

fn run_effect(
    runtime: &Arc<ReactivityInner>,
    id: EffectId,
) {
    let Some(cell) = runtime.effects.get(&id).map(|c| c.value().clone()) else {
        return;
    };
    if cell.stopped.load(Ordering::Acquire) {
        return;
    }

    clear_deps(runtime, id, &cell);

    {
        let _frame = ActiveFrame::push(runtime, Some(id));
        let mut run = cell.run.lock();
        (*run)();
    }
    trace!(effect = id, deps = cell.deps.lock().len(), "effect ran");
}

fn clear_deps(
    runtime: &ReactivityInner,
    id: EffectId,
    cell: &EffectCell,
) {
    let deps: Vec<DepKey> = cell.deps.lock().drain().collect();
    for dep in deps {
        runtime.subscribers.remove_if_mut(&dep, |_, ids| {
            ids.remove(&id);
            ids.is_empty()
        });
    }
}

/// Owner of a running effect; stopping it unsubscribes all its dependencies.
///
/// Dropping the handle does not stop the effect.
#[derive(Clone)]
pub struct EffectHandle {
    id: EffectId,
    runtime: Weak<ReactivityInner>,
}

impl std::fmt::Debug for EffectHandle {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("EffectHandle").field("id", &self.id).finish()
    }
}

impl EffectHandle {
    pub fn id(&self) -> EffectId {
        self.id
    }

    pub fn stop(&self) {
        let Some(runtime) = self.runtime.upgrade() else {
            return;
        };
        if let Some((_, cell)) = runtime.effects.remove(&self.id) {
            cell.stopped.store(true, Ordering::Release);
            clear_deps(&runtime, self.id, &cell);
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.runtime
            .upgrade()
            .map_or(true, |runtime| !runtime.effects.contains_key(&self.id))
    }
}
