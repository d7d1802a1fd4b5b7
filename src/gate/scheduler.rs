use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

/// A unit of deferred work.
pub type Task = Box<dyn FnOnce() + Send>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameId(u64);

/// The host's timer and animation-frame facilities.
///
/// Gates only ever hold one pending handle at a time and cancel it before
/// scheduling another. Cancelling a handle that already ran must be a no-op.
pub trait Scheduler: Send + Sync {
    /// Time elapsed on the scheduler's clock.
    fn now(&self) -> Duration;

    /// Run `task` once, `delay` from now.
    fn set_timeout(&self, delay: Duration, task: Task) -> TimerId;

    fn clear_timeout(&self, id: TimerId);

    /// Run `task` on the next animation frame.
    fn request_frame(&self, task: Task) -> FrameId;

    fn cancel_frame(&self, id: FrameId);
}

#[derive(Default)]
struct LoopState {
    now: Duration,
    next_id: u64,
    timers: BTreeMap<(Duration, u64), Task>,
    deadlines: HashMap<u64, Duration>,
    frames: Vec<(u64, Task)>,
}

/// Host-driven event loop with a virtual clock.
///
/// Nothing runs on its own: the host (or a test) moves time forward with
/// [`EventLoop::advance`] and paints with [`EventLoop::render_frame`].
/// Timers due at the same instant run in the order they were scheduled.
/// Tasks run with no lock held, so they may schedule or cancel work.
#[derive(Default)]
pub struct EventLoop {
    state: Mutex<LoopState>,
}

impl EventLoop {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Move the clock forward by `by`, running every timer that falls due on
    /// the way. Returns how many timers ran.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.state.lock().now + by;
        let mut ran = 0;

        loop {
            let task = {
                let mut state = self.state.lock();
                let due = match state.timers.keys().next() {
                    Some(&(deadline, id)) if deadline <= target => (deadline, id),
                    _ => break,
                };
                state.now = due.0;
                state.deadlines.remove(&due.1);
                state.timers.remove(&due)
            };
            if let Some(task) = task {
                task();
                ran += 1;
            }
        }

        self.state.lock().now = target;
        ran
    }

    /// Run timers until none are left, jumping the clock to each deadline.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        loop {
            let task = {
                let mut state = self.state.lock();
                let Some(&(deadline, id)) = state.timers.keys().next() else {
                    break;
                };
                state.now = state.now.max(deadline);
                state.deadlines.remove(&id);
                state.timers.remove(&(deadline, id))
            };
            if let Some(task) = task {
                task();
                ran += 1;
            }
        }
        ran
    }

    /// Run the callbacks requested before this call. Callbacks requested
    /// while rendering wait for the next frame.
    pub fn render_frame(&self) -> usize {
        let frames = std::mem::take(&mut self.state.lock().frames);
        let ran = frames.len();
        for (_, task) in frames {
            task();
        }
        ran
    }

    pub fn pending_timers(&self) -> usize {
        self.state.lock().timers.len()
    }

    pub fn pending_frames(&self) -> usize {
        self.state.lock().frames.len()
    }
}

impl Scheduler for EventLoop {
    fn now(&self) -> Duration {
        self.state.lock().now
    }

    fn set_timeout(&self, delay: Duration, task: Task) -> TimerId {
        let mut state = self.state.lock();
        let id = state.next_id;
        state.next_id += 1;
        let deadline = state.now + delay;
        state.timers.insert((deadline, id), task);
        state.deadlines.insert(id, deadline);
        TimerId(id)
    }

    fn clear_timeout(&self, TimerId(id): TimerId) {
        let mut state = self.state.lock();
        if let Some(deadline) = state.deadlines.remove(&id) {
            state.timers.remove(&(deadline, id));
        }
    }

    fn request_frame(&self, task: Task) -> FrameId {
        let mut state = self.state.lock();
        let id = state.next_id;
        state.next_id += 1;
        state.frames.push((id, task));
        FrameId(id)
    }

    fn cancel_frame(&self, FrameId(id): FrameId) {
        self.state.lock().frames.retain(|(frame, _)| *frame != id);
    }
}
