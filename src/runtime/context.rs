use parking_lot::Mutex;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread::{self, ThreadId};

type ObserverFn = Arc<dyn Fn() + Send + Sync>;

/// Dependency graph shared by every signal, memo and effect of a runtime.
#[derive(Default)]
struct ReactiveContext {
    // The observer tracking reads on each thread. Keyed by thread so a read
    // on one thread is never attributed to an observer running on another.
    current_observer: HashMap<ThreadId, usize>,
    // Map from source ID to set of observer IDs that depend on it
    dependencies: HashMap<usize, HashSet<usize>>,
    // Map from observer ID to set of source IDs it depends on
    observer_deps: HashMap<usize, HashSet<usize>>,
    // Map from effect ID to the function that re-runs it
    effects: HashMap<usize, ObserverFn>,
    // Map from memo ID to dirty state
    memo_dirty: HashMap<usize, bool>,
}

impl ReactiveContext {
    fn observer(&self) -> Option<usize> {
        self.current_observer.get(&thread::current().id()).copied()
    }

    fn swap_observer(&mut self, observer: Option<usize>) -> Option<usize> {
        let thread = thread::current().id();
        match observer {
            Some(id) => self.current_observer.insert(thread, id),
            None => self.current_observer.remove(&thread),
        }
    }

    fn unlink_observer(&mut self, observer_id: usize) {
        if let Some(old_deps) = self.observer_deps.remove(&observer_id) {
            for source_id in old_deps {
                if let Some(deps) = self.dependencies.get_mut(&source_id) {
                    deps.remove(&observer_id);
                    if deps.is_empty() {
                        self.dependencies.remove(&source_id);
                    }
                }
            }
        }
    }
}

/// Reactive runtime tracking which observers read which sources.
///
/// Signals register reads while an observer (an [`Effect`](crate::Effect)
/// or a [`Memo`](crate::Memo)) is running and notify the runtime after each
/// commit. Effects re-run synchronously; memos are marked dirty and
/// recompute on their next read.
///
/// A process-wide runtime is used unless a scoped one is active on the
/// current thread.
///
/// # Examples
///
/// ```
/// use stately::runtime::Runtime;
/// use stately::create_signal;
///
/// Runtime::scope(|| {
///     let (count, _set_count) = create_signal(0);
///     assert_eq!(count.get(), 0);
/// });
/// // Runtime and all its state is dropped here
/// ```
pub struct Runtime {
    next_id: AtomicUsize,
    context: Mutex<ReactiveContext>,
}

// Thread-local stack for scoped runtimes
thread_local! {
    static RUNTIME_STACK: RefCell<Vec<Arc<Runtime>>> = const { RefCell::new(Vec::new()) };
}

struct StackGuard;

impl Drop for StackGuard {
    fn drop(&mut self) {
        RUNTIME_STACK.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

struct ObserverGuard<'a> {
    runtime: &'a Runtime,
    prev: Option<usize>,
}

impl Drop for ObserverGuard<'_> {
    fn drop(&mut self) {
        self.runtime.context.lock().swap_observer(self.prev);
    }
}

impl Runtime {
    /// Create a new isolated runtime.
    pub fn new() -> Arc<Self> {
        Arc::new(Runtime {
            next_id: AtomicUsize::new(0),
            context: Mutex::new(ReactiveContext::default()),
        })
    }

    /// Run a function with a fresh isolated runtime.
    ///
    /// Every primitive created inside `f` belongs to that runtime. The
    /// runtime's graph is dropped with the last handle that references it.
    pub fn scope<F, R>(f: F) -> R
    where
        F: FnOnce() -> R,
    {
        Self::with_runtime(Self::new(), f)
    }

    /// The process-wide runtime used when no scoped runtime is active.
    pub fn global() -> Arc<Self> {
        static RUNTIME: OnceLock<Arc<Runtime>> = OnceLock::new();
        Arc::clone(RUNTIME.get_or_init(Self::new))
    }

    /// The runtime on top of this thread's stack, or the global one.
    pub fn current() -> Arc<Self> {
        RUNTIME_STACK.with(|stack| stack.borrow().last().cloned().unwrap_or_else(Self::global))
    }

    /// Run `f` with `runtime` as the current runtime of this thread.
    pub fn with_runtime<F, R>(runtime: Arc<Self>, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        RUNTIME_STACK.with(|stack| {
            stack.borrow_mut().push(runtime);
        });
        let _guard = StackGuard;
        f()
    }

    /// Forget every observer and dependency edge.
    pub fn clear(&self) {
        *self.context.lock() = ReactiveContext::default();
    }

    /// Generate the next unique ID for a reactive primitive.
    pub fn next_id(&self) -> usize {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// The observer currently tracking reads, if any.
    pub fn current_observer(&self) -> Option<usize> {
        self.context.lock().observer()
    }

    /// Record that the running observer read `source_id`.
    pub fn track_read(&self, source_id: usize) {
        let mut ctx = self.context.lock();
        if let Some(observer) = ctx.observer() {
            if observer == source_id {
                return;
            }
            log::trace!("observer {observer} depends on {source_id}");
            ctx.dependencies.entry(source_id).or_default().insert(observer);
            ctx.observer_deps.entry(observer).or_default().insert(source_id);
        }
    }

    /// Notify every observer of `source_id` that it committed.
    pub fn notify_observers(&self, source_id: usize) {
        let observers = {
            let ctx = self.context.lock();
            ctx.dependencies
                .get(&source_id)
                .map(|obs| obs.iter().copied().collect::<Vec<_>>())
        };

        for observer_id in observers.into_iter().flatten() {
            self.mark_observer_dirty(observer_id);
        }
    }

    /// Mark a memo dirty (propagating to its dependents) or re-run an effect.
    fn mark_observer_dirty(&self, observer_id: usize) {
        let mut ctx = self.context.lock();

        if let Some(dirty) = ctx.memo_dirty.get_mut(&observer_id) {
            if *dirty {
                return;
            }
            *dirty = true;
            drop(ctx);
            self.notify_observers(observer_id);
            return;
        }

        let effect = ctx.effects.get(&observer_id).cloned();
        drop(ctx);

        if let Some(effect) = effect {
            effect();
        }
    }

    /// Register the function that re-runs effect `observer_id`.
    pub fn register_effect(&self, observer_id: usize, f: impl Fn() + Send + Sync + 'static) {
        let mut ctx = self.context.lock();
        ctx.unlink_observer(observer_id);
        ctx.effects.insert(observer_id, Arc::new(f));
    }

    /// Run `f` as `observer_id`, replacing its previous dependency set with
    /// the sources `f` reads.
    pub fn track<F, R>(&self, observer_id: usize, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let prev = {
            let mut ctx = self.context.lock();
            ctx.unlink_observer(observer_id);
            ctx.swap_observer(Some(observer_id))
        };
        let _guard = ObserverGuard { runtime: self, prev };
        f()
    }

    /// Run `f` without any observer, so its reads are not tracked.
    pub fn untrack<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let prev = self.context.lock().swap_observer(None);
        let _guard = ObserverGuard { runtime: self, prev };
        f()
    }

    /// Register a memo and mark it as dirty initially.
    pub fn register_memo(&self, memo_id: usize) {
        self.context.lock().memo_dirty.insert(memo_id, true);
    }

    /// Whether a memo needs recomputation.
    pub fn is_memo_dirty(&self, memo_id: usize) -> bool {
        self.context.lock().memo_dirty.get(&memo_id).copied().unwrap_or(true)
    }

    /// Mark a memo as clean after recomputation.
    pub fn mark_memo_clean(&self, memo_id: usize) {
        self.context.lock().memo_dirty.insert(memo_id, false);
    }

    /// Drop an observer and every edge that points to or from it.
    pub fn remove_observer(&self, observer_id: usize) {
        let mut ctx = self.context.lock();
        ctx.effects.remove(&observer_id);
        ctx.memo_dirty.remove(&observer_id);
        ctx.unlink_observer(observer_id);
        ctx.dependencies.remove(&observer_id);
    }

    /// Drop the edges of a source that no longer exists.
    pub fn release_source(&self, source_id: usize) {
        let mut ctx = self.context.lock();
        if let Some(observers) = ctx.dependencies.remove(&source_id) {
            for observer in observers {
                if let Some(deps) = ctx.observer_deps.get_mut(&observer) {
                    deps.remove(&source_id);
                }
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn observer_count(&self) -> usize {
        let ctx = self.context.lock();
        ctx.effects.len() + ctx.memo_dirty.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scoped_runtime_is_current_inside_scope() {
        let outer = Runtime::current();
        Runtime::scope(|| {
            assert!(!Arc::ptr_eq(&outer, &Runtime::current()));
        });
        assert!(Arc::ptr_eq(&outer, &Runtime::current()));
    }

    #[test]
    fn track_records_and_replaces_dependencies() {
        let rt = Runtime::new();
        rt.track(10, || rt.track_read(1));
        rt.track(10, || rt.track_read(2));

        let ctx = rt.context.lock();
        assert!(!ctx.dependencies.contains_key(&1));
        assert!(ctx.dependencies[&2].contains(&10));
    }

    #[test]
    fn reads_outside_observers_are_not_tracked() {
        let rt = Runtime::new();
        rt.track_read(1);
        rt.track(5, || rt.untrack(|| rt.track_read(1)));
        assert!(rt.context.lock().dependencies.is_empty());
    }

    #[test]
    fn remove_observer_unlinks_edges() {
        let rt = Runtime::new();
        rt.register_memo(3);
        rt.track(3, || rt.track_read(1));
        rt.remove_observer(3);
        assert_eq!(rt.observer_count(), 0);
        assert!(rt.context.lock().dependencies.is_empty());
    }

    #[test]
    fn reads_on_other_threads_are_not_attributed() {
        let rt = Runtime::new();
        rt.track(5, || {
            thread::scope(|s| {
                s.spawn(|| rt.track_read(1));
            });
            rt.track_read(2);
        });

        let ctx = rt.context.lock();
        assert!(!ctx.dependencies.contains_key(&1));
        assert!(ctx.dependencies[&2].contains(&5));
    }
}
