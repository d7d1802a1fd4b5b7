use super::scheduler::{Scheduler, TimerId};
use crate::signal::WriteSignal;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::Duration;

struct ThrottleState<T> {
    cooldown: Option<TimerId>,
    next: Option<T>,
    generation: u64,
}

struct ThrottleInner<T> {
    scheduler: Arc<dyn Scheduler>,
    window: Duration,
    commit: Box<dyn Fn(T) + Send + Sync>,
    state: Mutex<ThrottleState<T>>,
}

impl<T: Send + 'static> ThrottleInner<T> {
    // Caller holds the state lock.
    fn start_cooldown(self: &Arc<Self>, state: &mut ThrottleState<T>) {
        state.generation += 1;
        let generation = state.generation;
        let weak: Weak<Self> = Arc::downgrade(self);
        state.cooldown = Some(self.scheduler.set_timeout(
            self.window,
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.cooldown_elapsed(generation);
                }
            }),
        ));
    }

    fn cooldown_elapsed(self: &Arc<Self>, generation: u64) {
        let next = {
            let mut state = self.state.lock();
            if state.generation != generation {
                return;
            }
            match state.next.take() {
                Some(value) => {
                    self.start_cooldown(&mut state);
                    value
                }
                None => {
                    state.cooldown = None;
                    return;
                }
            }
        };
        log::debug!("throttle: trailing commit");
        (self.commit)(next);
    }
}

/// Leading-edge throttle with a coalesced trailing commit.
///
/// The first call commits at once and opens a cooldown window. Calls inside
/// the window only replace the queued value; when the window closes the
/// queued value (if any) is committed and a new window opens. With nothing
/// queued the gate goes idle.
pub struct Throttled<T> {
    inner: Arc<ThrottleInner<T>>,
}

impl<T: Send + 'static> Throttled<T> {
    pub fn new<F>(scheduler: Arc<dyn Scheduler>, window: Duration, commit: F) -> Self
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(ThrottleInner {
                scheduler,
                window,
                commit: Box::new(commit),
                state: Mutex::new(ThrottleState {
                    cooldown: None,
                    next: None,
                    generation: 0,
                }),
            }),
        }
    }

    pub fn set(&self, value: T) {
        {
            let mut state = self.inner.state.lock();
            if state.cooldown.is_some() {
                state.next = Some(value);
                return;
            }
            // The window opens before committing so a write made by a
            // subscriber of this commit is queued, not committed.
            self.inner.start_cooldown(&mut state);
        }
        (self.inner.commit)(value);
    }

    /// Drop the queued value and close the window.
    pub fn cancel(&self) {
        let mut state = self.inner.state.lock();
        if let Some(timer) = state.cooldown.take() {
            self.inner.scheduler.clear_timeout(timer);
        }
        state.next = None;
        state.generation += 1;
    }

    pub fn is_cooling_down(&self) -> bool {
        self.inner.state.lock().cooldown.is_some()
    }
}

impl<T: Clone + Send + Sync + 'static> Throttled<T> {
    /// Throttle writes to a signal.
    pub fn signal(scheduler: Arc<dyn Scheduler>, window: Duration, target: WriteSignal<T>) -> Self {
        Self::new(scheduler, window, move |value| target.set(value))
    }
}

impl<T> Drop for Throttled<T> {
    fn drop(&mut self) {
        if let Some(timer) = self.inner.state.lock().cooldown.take() {
            self.inner.scheduler.clear_timeout(timer);
        }
    }
}
