use super::scheduler::Scheduler;
use super::timeout::{Readiness, Timeout};
use crate::signal::WriteSignal;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Trailing-edge debounce: each call replaces the pending value and restarts
/// the delay; the value is committed once calls stop for a full `delay`.
pub struct Debounced<T> {
    pending: Arc<Mutex<Option<T>>>,
    timeout: Timeout,
}

impl<T: Send + 'static> Debounced<T> {
    /// Debounce calls to `commit`.
    pub fn new<F>(scheduler: Arc<dyn Scheduler>, delay: Duration, commit: F) -> Self
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        let pending: Arc<Mutex<Option<T>>> = Arc::new(Mutex::new(None));
        let timeout = Timeout::idle(scheduler, delay, {
            let pending = Arc::clone(&pending);
            move || {
                let value = pending.lock().take();
                if let Some(value) = value {
                    commit(value);
                }
            }
        });
        Self { pending, timeout }
    }

    /// Queue `value`, dropping any value still waiting.
    pub fn set(&self, value: T) {
        *self.pending.lock() = Some(value);
        self.timeout.reset();
        log::debug!("debounce: rescheduled");
    }

    /// Commit the waiting value now.
    pub fn flush(&self) {
        self.timeout.flush();
    }

    /// Drop the waiting value.
    pub fn cancel(&self) {
        self.timeout.cancel();
        self.pending.lock().take();
    }

    pub fn readiness(&self) -> Readiness {
        self.timeout.readiness()
    }

    pub fn is_pending(&self) -> bool {
        self.readiness() == Readiness::Pending
    }
}

impl<T: Clone + Send + Sync + 'static> Debounced<T> {
    /// Debounce writes to a signal.
    pub fn signal(scheduler: Arc<dyn Scheduler>, delay: Duration, target: WriteSignal<T>) -> Self {
        Self::new(scheduler, delay, move |value| target.set(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::EventLoop;
    use crate::signal::create_signal;

    const DELAY: Duration = Duration::from_millis(100);

    #[test]
    fn only_the_last_value_commits() {
        let event_loop = EventLoop::new();
        let (value, set_value) = create_signal(0);
        let debounced = Debounced::signal(event_loop.clone(), DELAY, set_value);

        for n in 1..=5 {
            debounced.set(n);
            event_loop.advance(Duration::from_millis(60));
        }
        assert_eq!(value.get(), 0);
        assert!(debounced.is_pending());

        event_loop.advance(Duration::from_millis(40));
        assert_eq!(value.get(), 5);
        assert_eq!(value.version(), 1);
        assert_eq!(debounced.readiness(), Readiness::Fired);
    }

    #[test]
    fn flush_commits_immediately() {
        let event_loop = EventLoop::new();
        let (value, set_value) = create_signal("");
        let debounced = Debounced::signal(event_loop.clone(), DELAY, set_value);

        debounced.set("typed");
        debounced.flush();
        assert_eq!(value.get(), "typed");

        event_loop.advance(DELAY);
        assert_eq!(value.version(), 1);
    }

    #[test]
    fn cancel_drops_pending_value() {
        let event_loop = EventLoop::new();
        let (value, set_value) = create_signal(0);
        let debounced = Debounced::signal(event_loop.clone(), DELAY, set_value);

        debounced.set(1);
        debounced.cancel();
        assert_eq!(debounced.readiness().as_option(), None);

        event_loop.advance(DELAY * 2);
        assert_eq!(value.get(), 0);
    }
}
