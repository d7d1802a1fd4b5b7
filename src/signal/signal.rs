use crate::runtime::Runtime;
use parking_lot::{Mutex, ReentrantMutex, RwLock};
use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

type Subscriber<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// The next value of a signal: either the value itself or a function of the
/// previous one.
///
/// This is the explicit form of "set accepts a value or an updater": a value
/// of a function type is never mistaken for an updater.
pub enum Update<T> {
    Value(T),
    With(Box<dyn FnOnce(&T) -> T>),
}

impl<T> Update<T> {
    /// Build an updater variant.
    pub fn with(f: impl FnOnce(&T) -> T + 'static) -> Self {
        Update::With(Box::new(f))
    }

    /// Compute the next value from `prev`.
    pub fn resolve(self, prev: &T) -> T {
        match self {
            Update::Value(value) => value,
            Update::With(f) => f(prev),
        }
    }
}

impl<T> From<T> for Update<T> {
    fn from(value: T) -> Self {
        Update::Value(value)
    }
}

impl<T: fmt::Debug> fmt::Debug for Update<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Update::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Update::With(_) => f.write_str("With(..)"),
        }
    }
}

struct Delivery<T> {
    queue: VecDeque<T>,
    delivering: bool,
}

struct SignalInner<T> {
    id: usize,
    runtime: Arc<Runtime>,
    value: RwLock<T>,
    // Serializes read, compute and commit. Reentrant so subscribers and
    // updaters may write the signal they were called from.
    serial: ReentrantMutex<()>,
    version: AtomicU64,
    next_subscriber: AtomicUsize,
    subscribers: Mutex<Vec<(usize, Subscriber<T>)>>,
    delivery: Mutex<Delivery<T>>,
    // Keeps the source subscriptions of derived signals alive.
    dependencies: Mutex<Vec<WatchGuard>>,
}

impl<T> Drop for SignalInner<T> {
    fn drop(&mut self) {
        self.runtime.release_source(self.id);
    }
}

// Resets delivery state if a subscriber panics mid-broadcast.
struct DeliveryGuard<'a, T> {
    delivery: &'a Mutex<Delivery<T>>,
}

impl<T> Drop for DeliveryGuard<'_, T> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            let mut delivery = self.delivery.lock();
            delivery.delivering = false;
            delivery.queue.clear();
        }
    }
}

impl<T: Clone + Send + Sync + 'static> SignalInner<T> {
    fn commit(&self, next: T) {
        let deliver = {
            let _serial = self.serial.lock();
            self.stage(next)
        };
        if deliver {
            self.deliver();
        }
    }

    /// Compute the next value from the current one and commit it, unless
    /// `f` returns `None`. No other write can land between the read and the
    /// commit.
    fn commit_with(&self, f: impl FnOnce(&T) -> Option<T>) -> bool {
        let deliver = {
            let _serial = self.serial.lock();
            let prev = self.value.read().clone();
            match f(&prev) {
                Some(next) => self.stage(next),
                None => return false,
            }
        };
        if deliver {
            self.deliver();
        }
        true
    }

    // Caller holds `serial`. Returns whether the caller must run delivery.
    fn stage(&self, next: T) -> bool {
        *self.value.write() = next.clone();
        self.version.fetch_add(1, Ordering::Relaxed);

        let mut delivery = self.delivery.lock();
        delivery.queue.push_back(next);
        // A commit made while delivery is running (from a subscriber, or
        // from another thread) is delivered by that loop in commit order.
        if delivery.delivering {
            return false;
        }
        delivery.delivering = true;
        true
    }

    fn deliver(&self) {
        let _guard = DeliveryGuard {
            delivery: &self.delivery,
        };
        loop {
            let value = {
                let mut delivery = self.delivery.lock();
                match delivery.queue.pop_front() {
                    Some(value) => value,
                    None => {
                        delivery.delivering = false;
                        break;
                    }
                }
            };
            let subscribers: Vec<Subscriber<T>> = self
                .subscribers
                .lock()
                .iter()
                .map(|(_, s)| Arc::clone(s))
                .collect();
            log::trace!("signal {} delivering to {} subscribers", self.id, subscribers.len());
            for subscriber in subscribers {
                subscriber(&value);
            }
            self.runtime.notify_observers(self.id);
        }
    }

    fn unsubscribe(&self, subscriber_id: usize) {
        self.subscribers.lock().retain(|(id, _)| *id != subscriber_id);
    }
}

/// A reactive value that notifies subscribers and dependent observers on
/// every commit.
///
/// `Signal` is both the read and the write handle; [`create_signal`] splits
/// it into a [`ReadSignal`] and a [`WriteSignal`]. Clones share the value.
pub struct Signal<T> {
    inner: Arc<SignalInner<T>>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Signal<T> {
    /// Create a new signal with the given initial value.
    pub fn new(initial: T) -> Self {
        let runtime = Runtime::current();
        let id = runtime.next_id();

        Self {
            inner: Arc::new(SignalInner {
                id,
                runtime,
                value: RwLock::new(initial),
                serial: ReentrantMutex::new(()),
                version: AtomicU64::new(0),
                next_subscriber: AtomicUsize::new(0),
                subscribers: Mutex::new(Vec::new()),
                delivery: Mutex::new(Delivery {
                    queue: VecDeque::new(),
                    delivering: false,
                }),
                dependencies: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Create a signal whose initial value is computed once, now.
    pub fn new_with(init: impl FnOnce() -> T) -> Self {
        Self::new(init())
    }

    /// Get the current value of the signal.
    pub fn get(&self) -> T {
        self.inner.runtime.track_read(self.inner.id);
        self.inner.value.read().clone()
    }

    /// Get the current value without registering a dependency.
    pub fn get_untracked(&self) -> T {
        self.inner.value.read().clone()
    }

    /// Read the value with a function without cloning.
    ///
    /// The value is locked for reading while `f` runs, so `f` must not write
    /// this signal.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.inner.runtime.track_read(self.inner.id);
        let value = self.inner.value.read();
        f(&value)
    }

    /// Replace the value.
    pub fn set(&self, new_value: T) {
        self.inner.commit(new_value);
    }

    /// Replace the value with a function of the previous one.
    ///
    /// Concurrent writers are serialized, so no update is lost. If `f`
    /// panics nothing is committed.
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        self.inner.commit_with(|prev| Some(f(prev)));
    }

    /// Like [`Signal::update`], but commits only when `f` returns `Some`.
    /// Returns whether a value was committed.
    pub fn try_update(&self, f: impl FnOnce(&T) -> Option<T>) -> bool {
        self.inner.commit_with(f)
    }

    /// Edit a copy of the value in place and commit it.
    pub fn modify(&self, f: impl FnOnce(&mut T)) {
        self.inner.commit_with(|prev| {
            let mut next = prev.clone();
            f(&mut next);
            Some(next)
        });
    }

    /// Commit an [`Update`].
    pub fn apply(&self, update: impl Into<Update<T>>) {
        match update.into() {
            Update::Value(value) => self.inner.commit(value),
            Update::With(f) => self.update(f),
        }
    }

    /// Number of commits since creation.
    pub fn version(&self) -> u64 {
        self.inner.version.load(Ordering::Relaxed)
    }

    /// Get the signal's unique ID.
    pub fn id(&self) -> usize {
        self.inner.id
    }

    /// Call `callback` with every value committed from now on, in commit
    /// order. Dropping the guard unsubscribes.
    pub fn watch<F>(&self, callback: F) -> WatchGuard
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let subscriber_id = self.inner.next_subscriber.fetch_add(1, Ordering::Relaxed);
        self.inner
            .subscribers
            .lock()
            .push((subscriber_id, Arc::new(callback)));

        let weak: Weak<SignalInner<T>> = Arc::downgrade(&self.inner);
        WatchGuard {
            unsubscribe: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.unsubscribe(subscriber_id);
                }
            })),
        }
    }

    /// Number of live `watch` subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.lock().len()
    }

    /// Derive a read-only signal by applying `f` to every committed value.
    pub fn map<U, F>(&self, f: F) -> ReadSignal<U>
    where
        U: Clone + Send + Sync + 'static,
        F: Fn(&T) -> U + Send + Sync + 'static,
    {
        let derived = Signal::new(self.with(&f));
        let target = Arc::downgrade(&derived.inner);

        let guard = self.watch(move |value| {
            if let Some(inner) = target.upgrade() {
                inner.commit(f(value));
            }
        });

        derived.inner.dependencies.lock().push(guard);
        derived.read_only()
    }

    /// A read-only handle to this signal.
    pub fn read_only(&self) -> ReadSignal<T> {
        ReadSignal(self.clone())
    }

    /// A write-only handle to this signal.
    pub fn write_only(&self) -> WriteSignal<T> {
        WriteSignal(self.clone())
    }

    /// Split into read and write handles.
    pub fn split(self) -> (ReadSignal<T>, WriteSignal<T>) {
        (self.read_only(), WriteSignal(self))
    }
}

impl<T: fmt::Debug> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("id", &self.inner.id)
            .field("value", &*self.inner.value.read())
            .finish()
    }
}

/// Read half of a signal.
pub struct ReadSignal<T>(Signal<T>);

impl<T> Clone for ReadSignal<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: Clone + Send + Sync + 'static> ReadSignal<T> {
    pub fn get(&self) -> T {
        self.0.get()
    }

    pub fn get_untracked(&self) -> T {
        self.0.get_untracked()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.0.with(f)
    }

    pub fn version(&self) -> u64 {
        self.0.version()
    }

    pub fn id(&self) -> usize {
        self.0.id()
    }

    pub fn watch<F>(&self, callback: F) -> WatchGuard
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.0.watch(callback)
    }

    pub fn map<U, F>(&self, f: F) -> ReadSignal<U>
    where
        U: Clone + Send + Sync + 'static,
        F: Fn(&T) -> U + Send + Sync + 'static,
    {
        self.0.map(f)
    }
}

impl<T: fmt::Debug> fmt::Debug for ReadSignal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

/// Write half of a signal.
pub struct WriteSignal<T>(Signal<T>);

impl<T> Clone for WriteSignal<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: Clone + Send + Sync + 'static> WriteSignal<T> {
    pub fn set(&self, new_value: T) {
        self.0.set(new_value)
    }

    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        self.0.update(f)
    }

    pub fn try_update(&self, f: impl FnOnce(&T) -> Option<T>) -> bool {
        self.0.try_update(f)
    }

    pub fn modify(&self, f: impl FnOnce(&mut T)) {
        self.0.modify(f)
    }

    pub fn apply(&self, update: impl Into<Update<T>>) {
        self.0.apply(update)
    }

    /// Current value, untracked. Adapters use this to compute the next
    /// snapshot from the previous one.
    pub(crate) fn peek(&self) -> T {
        self.0.get_untracked()
    }
}

/// Create a signal and split it into read and write handles.
///
/// # Example
///
/// ```
/// use stately::create_signal;
///
/// let (count, set_count) = create_signal(5);
/// set_count.update(|n| n + 1);
/// assert_eq!(count.get(), 6);
/// ```
pub fn create_signal<T>(initial: T) -> (ReadSignal<T>, WriteSignal<T>)
where
    T: Clone + Send + Sync + 'static,
{
    Signal::new(initial).split()
}

/// Like [`create_signal`], computing the initial value once, now.
pub fn create_signal_with<T>(init: impl FnOnce() -> T) -> (ReadSignal<T>, WriteSignal<T>)
where
    T: Clone + Send + Sync + 'static,
{
    Signal::new_with(init).split()
}

/// RAII guard for signal watchers.
#[must_use = "dropping the guard unsubscribes immediately"]
pub struct WatchGuard {
    unsubscribe: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl WatchGuard {
    /// Keep the subscription for as long as the signal lives.
    pub fn detach(mut self) {
        self.unsubscribe = None;
    }
}

impl Drop for WatchGuard {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}
