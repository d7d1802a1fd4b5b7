use super::scheduler::{FrameId, Scheduler};
use crate::signal::WriteSignal;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};

struct FrameState {
    frame: Option<FrameId>,
    generation: u64,
}

struct FrameInner<T> {
    scheduler: Arc<dyn Scheduler>,
    commit: Box<dyn Fn(T) + Send + Sync>,
    state: Mutex<FrameState>,
}

/// Commits on the next animation frame; a burst of calls within one frame
/// collapses into a single commit of the last value.
pub struct FrameGated<T> {
    inner: Arc<FrameInner<T>>,
}

impl<T: Send + 'static> FrameGated<T> {
    pub fn new<F>(scheduler: Arc<dyn Scheduler>, commit: F) -> Self
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(FrameInner {
                scheduler,
                commit: Box::new(commit),
                state: Mutex::new(FrameState {
                    frame: None,
                    generation: 0,
                }),
            }),
        }
    }

    pub fn set(&self, value: T) {
        let mut state = self.inner.state.lock();
        if let Some(frame) = state.frame.take() {
            self.inner.scheduler.cancel_frame(frame);
        }
        state.generation += 1;

        let generation = state.generation;
        let weak: Weak<FrameInner<T>> = Arc::downgrade(&self.inner);
        state.frame = Some(self.inner.scheduler.request_frame(Box::new(move || {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            {
                let mut state = inner.state.lock();
                if state.generation != generation {
                    return;
                }
                state.frame = None;
            }
            (inner.commit)(value);
        })));
    }

    /// Drop the value waiting for the next frame.
    pub fn cancel(&self) {
        let mut state = self.inner.state.lock();
        if let Some(frame) = state.frame.take() {
            self.inner.scheduler.cancel_frame(frame);
        }
        state.generation += 1;
    }

    pub fn is_pending(&self) -> bool {
        self.inner.state.lock().frame.is_some()
    }
}

impl<T: Clone + Send + Sync + 'static> FrameGated<T> {
    /// Gate writes to a signal on animation frames.
    pub fn signal(scheduler: Arc<dyn Scheduler>, target: WriteSignal<T>) -> Self {
        Self::new(scheduler, move |value| target.set(value))
    }
}

impl<T> Drop for FrameGated<T> {
    fn drop(&mut self) {
        if let Some(frame) = self.inner.state.lock().frame.take() {
            self.inner.scheduler.cancel_frame(frame);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::EventLoop;
    use crate::signal::create_signal;

    #[test]
    fn burst_within_frame_commits_once() {
        let event_loop = EventLoop::new();
        let (position, set_position) = create_signal((0, 0));
        let gated = FrameGated::signal(event_loop.clone(), set_position);

        gated.set((1, 1));
        gated.set((2, 4));
        gated.set((3, 9));
        assert_eq!(position.get(), (0, 0));
        assert_eq!(event_loop.pending_frames(), 1);

        event_loop.render_frame();
        assert_eq!(position.get(), (3, 9));
        assert_eq!(position.version(), 1);
        assert!(!gated.is_pending());
    }

    #[test]
    fn cancel_before_render() {
        let event_loop = EventLoop::new();
        let (position, set_position) = create_signal(0);
        let gated = FrameGated::signal(event_loop.clone(), set_position);

        gated.set(1);
        gated.cancel();
        event_loop.render_frame();
        assert_eq!(position.get(), 0);
    }
}
