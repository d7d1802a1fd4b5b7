use crate::runtime::Runtime;
use parking_lot::RwLock;
use std::sync::Arc;

struct MemoInner<T> {
    id: usize,
    runtime: Arc<Runtime>,
    compute: Box<dyn Fn() -> T + Send + Sync>,
    cached: RwLock<Option<T>>,
}

impl<T> Drop for MemoInner<T> {
    fn drop(&mut self) {
        self.runtime.remove_observer(self.id);
    }
}

/// A memoized computed value that automatically tracks dependencies.
///
/// Memos only recompute when a signal (or memo) they read has committed
/// since the last read.
pub struct Memo<T> {
    inner: Arc<MemoInner<T>>,
}

impl<T> Clone for Memo<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Memo<T> {
    /// Create a new memo with the given computation function.
    pub fn new<F>(compute: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        let runtime = Runtime::current();
        let id = runtime.next_id();

        // Register this as a memo with the runtime
        runtime.register_memo(id);

        Self {
            inner: Arc::new(MemoInner {
                id,
                runtime,
                compute: Box::new(compute),
                cached: RwLock::new(None),
            }),
        }
    }

    /// Get the current value, recomputing if necessary.
    pub fn get(&self) -> T {
        self.with(T::clone)
    }

    /// Read the memoized value with a function without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let inner = &self.inner;
        inner.runtime.track_read(inner.id);

        if !inner.runtime.is_memo_dirty(inner.id) {
            if let Some(value) = inner.cached.read().as_ref() {
                return f(value);
            }
        }

        // Recompute within observer context to track dependencies
        let value = inner.runtime.track(inner.id, || (inner.compute)());
        inner.runtime.mark_memo_clean(inner.id);
        let result = f(&value);
        *inner.cached.write() = Some(value);
        result
    }

    pub fn id(&self) -> usize {
        self.inner.id
    }
}

/// Create a new memoized computation.
///
/// # Example
///
/// ```
/// use stately::{create_memo, create_signal};
///
/// let (count, set_count) = create_signal(5);
/// let doubled = create_memo(move || count.get() * 2);
/// assert_eq!(doubled.get(), 10);
/// set_count.set(6);
/// assert_eq!(doubled.get(), 12);
/// ```
pub fn create_memo<T, F>(compute: F) -> Memo<T>
where
    T: Clone + Send + Sync + 'static,
    F: Fn() -> T + Send + Sync + 'static,
{
    Memo::new(compute)
}
