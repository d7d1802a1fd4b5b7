use super::scheduler::{Scheduler, TimerId};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::Duration;

/// State of a single pending fire.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Readiness {
    Pending,
    Fired,
    Cancelled,
}

impl Readiness {
    /// `Some(false)` pending, `Some(true)` fired, `None` cancelled.
    pub fn as_option(self) -> Option<bool> {
        match self {
            Readiness::Pending => Some(false),
            Readiness::Fired => Some(true),
            Readiness::Cancelled => None,
        }
    }
}

struct TimeoutState {
    readiness: Readiness,
    timer: Option<TimerId>,
    // Bumped on every reschedule or cancel; a task carrying an older value
    // is inert even if the host failed to cancel it.
    generation: u64,
}

struct TimeoutInner {
    scheduler: Arc<dyn Scheduler>,
    delay: Duration,
    callback: Box<dyn Fn() + Send + Sync>,
    state: Mutex<TimeoutState>,
}

impl TimeoutInner {
    fn schedule(self: &Arc<Self>) {
        let mut state = self.state.lock();
        if let Some(timer) = state.timer.take() {
            self.scheduler.clear_timeout(timer);
        }
        state.generation += 1;
        state.readiness = Readiness::Pending;

        let generation = state.generation;
        let weak: Weak<TimeoutInner> = Arc::downgrade(self);
        state.timer = Some(self.scheduler.set_timeout(
            self.delay,
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.fire(generation);
                }
            }),
        ));
    }

    fn fire(&self, generation: u64) {
        {
            let mut state = self.state.lock();
            if state.generation != generation || state.readiness != Readiness::Pending {
                return;
            }
            state.readiness = Readiness::Fired;
            state.timer = None;
        }
        (self.callback)();
    }

    fn cancel(&self) {
        let mut state = self.state.lock();
        if let Some(timer) = state.timer.take() {
            self.scheduler.clear_timeout(timer);
        }
        state.generation += 1;
        if state.readiness == Readiness::Pending {
            state.readiness = Readiness::Cancelled;
        }
    }
}

/// One pending call of `callback`, `delay` after the last (re)start.
///
/// Dropping the handle cancels the pending call.
pub struct Timeout {
    inner: Arc<TimeoutInner>,
}

impl Timeout {
    /// Schedule `callback` to run once after `delay`.
    pub fn new<F>(scheduler: Arc<dyn Scheduler>, delay: Duration, callback: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        let timeout = Self::idle(scheduler, delay, callback);
        timeout.reset();
        timeout
    }

    /// Like [`Timeout::new`], but nothing is scheduled until
    /// [`Timeout::reset`]. An idle timeout reports [`Readiness::Fired`]:
    /// nothing is waiting.
    pub fn idle<F>(scheduler: Arc<dyn Scheduler>, delay: Duration, callback: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(TimeoutInner {
                scheduler,
                delay,
                callback: Box::new(callback),
                state: Mutex::new(TimeoutState {
                    readiness: Readiness::Fired,
                    timer: None,
                    generation: 0,
                }),
            }),
        }
    }

    pub fn readiness(&self) -> Readiness {
        self.inner.state.lock().readiness
    }

    /// Cancel the pending call. No-op once it has run.
    pub fn cancel(&self) {
        self.inner.cancel();
        log::debug!("timeout cancelled");
    }

    /// Cancel any pending call and schedule a fresh one.
    pub fn reset(&self) {
        self.inner.schedule();
    }

    /// Run the pending call now, if there is one.
    pub fn flush(&self) {
        let generation = {
            let mut state = self.inner.state.lock();
            if let Some(timer) = state.timer.take() {
                self.inner.scheduler.clear_timeout(timer);
            }
            state.generation
        };
        self.inner.fire(generation);
    }
}

impl Drop for Timeout {
    fn drop(&mut self) {
        self.inner.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::EventLoop;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn setup() -> (Arc<EventLoop>, Arc<AtomicUsize>, Timeout) {
        let event_loop = EventLoop::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let timeout = Timeout::new(event_loop.clone(), Duration::from_millis(50), {
            let calls = calls.clone();
            move || {
                calls.fetch_add(1, Ordering::SeqCst);
            }
        });
        (event_loop, calls, timeout)
    }

    #[test]
    fn fires_once_after_delay() {
        let (event_loop, calls, timeout) = setup();
        assert_eq!(timeout.readiness().as_option(), Some(false));

        event_loop.advance(Duration::from_millis(50));
        assert_eq!(timeout.readiness().as_option(), Some(true));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        event_loop.advance(Duration::from_millis(500));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn cancel_makes_pending_call_inert() {
        let (event_loop, calls, timeout) = setup();
        timeout.cancel();
        assert_eq!(timeout.readiness().as_option(), None);

        event_loop.advance(Duration::from_secs(1));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn cancel_after_fire_is_noop() {
        let (event_loop, calls, timeout) = setup();
        event_loop.advance(Duration::from_millis(50));
        timeout.cancel();
        assert_eq!(timeout.readiness(), Readiness::Fired);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn reset_restarts_the_delay() {
        let (event_loop, calls, timeout) = setup();
        event_loop.advance(Duration::from_millis(40));
        timeout.reset();
        event_loop.advance(Duration::from_millis(40));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        event_loop.advance(Duration::from_millis(10));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dropping_cancels() {
        let (event_loop, calls, timeout) = setup();
        drop(timeout);
        event_loop.advance(Duration::from_secs(1));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(event_loop.pending_timers(), 0);
    }
}
