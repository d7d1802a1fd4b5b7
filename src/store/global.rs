use crate::signal::{ReadSignal, Signal, Update, WriteSignal};
use parking_lot::{Mutex, ReentrantMutex, RwLock};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct Broadcast<T> {
    queue: VecDeque<T>,
    broadcasting: bool,
}

struct GlobalInner<T> {
    current: RwLock<T>,
    // Serializes read, resolve and write of `current`.
    serial: ReentrantMutex<()>,
    next_id: AtomicUsize,
    subscribers: Mutex<Vec<(usize, WriteSignal<T>)>>,
    broadcast: Mutex<Broadcast<T>>,
}

/// State shared by every component that mounts it.
///
/// The registry holds the current value and the setters of every mounted
/// [`GlobalHandle`]. A write from anywhere updates the registry and is
/// rebroadcast to all mounted handles. It is meant to live for the whole
/// process:
///
/// ```
/// use std::sync::LazyLock;
/// use stately::GlobalState;
///
/// static THEME: LazyLock<GlobalState<&'static str>> =
///     LazyLock::new(|| GlobalState::new("light"));
///
/// let header = THEME.mount();
/// let footer = THEME.mount();
/// header.set("dark");
/// assert_eq!(footer.get(), "dark");
/// ```
pub struct GlobalState<T> {
    inner: Arc<GlobalInner<T>>,
}

impl<T> Clone for GlobalState<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> GlobalState<T> {
    pub fn new(initial: T) -> Self {
        Self {
            inner: Arc::new(GlobalInner {
                current: RwLock::new(initial),
                serial: ReentrantMutex::new(()),
                next_id: AtomicUsize::new(0),
                subscribers: Mutex::new(Vec::new()),
                broadcast: Mutex::new(Broadcast {
                    queue: VecDeque::new(),
                    broadcasting: false,
                }),
            }),
        }
    }

    /// The registry's current value.
    pub fn get(&self) -> T {
        self.inner.current.read().clone()
    }

    /// Write the registry and rebroadcast to every mounted handle.
    ///
    /// Writes issued by a handle while a broadcast is running are queued and
    /// broadcast afterwards, so every handle sees values in write order.
    pub fn set(&self, update: impl Into<Update<T>>) {
        {
            let _serial = self.inner.serial.lock();
            let prev = self.get();
            let next = update.into().resolve(&prev);
            *self.inner.current.write() = next.clone();

            let mut broadcast = self.inner.broadcast.lock();
            broadcast.queue.push_back(next);
            if broadcast.broadcasting {
                return;
            }
            broadcast.broadcasting = true;
        }

        let _guard = BroadcastGuard {
            broadcast: &self.inner.broadcast,
        };
        loop {
            let value = {
                let mut broadcast = self.inner.broadcast.lock();
                match broadcast.queue.pop_front() {
                    Some(value) => value,
                    None => {
                        broadcast.broadcasting = false;
                        break;
                    }
                }
            };
            // Handles may mount or unmount from inside a setter.
            let subscribers: Vec<WriteSignal<T>> = self
                .inner
                .subscribers
                .lock()
                .iter()
                .map(|(_, setter)| setter.clone())
                .collect();
            for setter in subscribers {
                setter.set(value.clone());
            }
        }
    }

    /// Register a component-local signal seeded with the current value.
    ///
    /// The returned handle deregisters itself when dropped.
    pub fn mount(&self) -> GlobalHandle<T> {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let (state, setter) = Signal::new(self.get()).split();
        self.inner.subscribers.lock().push((id, setter));
        log::debug!("global state: mounted subscriber {id}");

        GlobalHandle {
            id,
            state,
            global: self.clone(),
        }
    }

    /// Number of mounted handles.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.lock().len()
    }

    fn unmount(&self, id: usize) {
        self.inner.subscribers.lock().retain(|(sub, _)| *sub != id);
        log::debug!("global state: unmounted subscriber {id}");
    }
}

struct BroadcastGuard<'a, T> {
    broadcast: &'a Mutex<Broadcast<T>>,
}

impl<T> Drop for BroadcastGuard<'_, T> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            let mut broadcast = self.broadcast.lock();
            broadcast.broadcasting = false;
            broadcast.queue.clear();
        }
    }
}

/// One component's view of a [`GlobalState`].
pub struct GlobalHandle<T: Clone + Send + Sync + 'static> {
    id: usize,
    state: ReadSignal<T>,
    global: GlobalState<T>,
}

impl<T: Clone + Send + Sync + 'static> GlobalHandle<T> {
    /// The local signal that follows the registry.
    pub fn state(&self) -> &ReadSignal<T> {
        &self.state
    }

    pub fn get(&self) -> T {
        self.state.get()
    }

    /// Write through to the registry; every mounted handle receives the value.
    pub fn set(&self, update: impl Into<Update<T>>) {
        self.global.set(update);
    }

    pub fn update(&self, f: impl FnOnce(&T) -> T + 'static) {
        self.global.set(Update::with(f));
    }
}

impl<T: Clone + Send + Sync + 'static> Drop for GlobalHandle<T> {
    fn drop(&mut self) {
        self.global.unmount(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_reach_every_mounted_handle() {
        let global = GlobalState::new(0);
        let a = global.mount();
        let b = global.mount();

        a.set(5);
        assert_eq!(a.get(), 5);
        assert_eq!(b.get(), 5);

        b.update(|n| n + 1);
        assert_eq!(a.get(), 6);
        assert_eq!(global.get(), 6);
    }

    #[test]
    fn new_handles_start_from_current_value() {
        let global = GlobalState::new("a");
        global.set("b");
        let late = global.mount();
        assert_eq!(late.get(), "b");
    }

    #[test]
    fn dropping_handle_deregisters() {
        let global = GlobalState::new(0);
        let a = global.mount();
        {
            let _b = global.mount();
            assert_eq!(global.subscriber_count(), 2);
        }
        assert_eq!(global.subscriber_count(), 1);
        a.set(1);
        assert_eq!(a.get(), 1);
    }

    #[test]
    fn reentrant_write_during_broadcast_lands_last() {
        let global = GlobalState::new(0);
        let a = global.mount();
        let b = global.mount();

        let _echo = a.state().watch({
            let global = global.clone();
            move |v| {
                if *v == 1 {
                    global.set(2);
                }
            }
        });

        global.set(1);
        assert_eq!(a.get(), 2);
        assert_eq!(b.get(), 2);
        assert_eq!(global.get(), 2);
    }

    #[test]
    fn panicking_handle_does_not_stop_later_broadcasts() {
        let global = GlobalState::new(0);
        let a = global.mount();
        let b = global.mount();
        let _fragile = a.state().watch(|v| {
            if *v == 1 {
                panic!("consumer failed");
            }
        });

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| global.set(1)));
        assert!(result.is_err());
        assert_eq!(global.get(), 1);

        global.set(2);
        assert_eq!(a.get(), 2);
        assert_eq!(b.get(), 2);
    }

    #[test]
    fn concurrent_updates_are_not_lost() {
        let global = GlobalState::new(0u32);
        let handle = global.mount();
        let threads: Vec<_> = (0..4)
            .map(|_| {
                let global = global.clone();
                std::thread::spawn(move || {
                    for _ in 0..1_000 {
                        global.set(Update::with(|n| n + 1));
                    }
                })
            })
            .collect();
        for thread in threads {
            thread.join().unwrap();
        }

        assert_eq!(global.get(), 4_000);
        assert_eq!(handle.get(), 4_000);
    }
}
