//! Last-write-wins ticketing for asynchronous results.
//!
//! Each call stamps a [`Ticket`] from a monotonically increasing counter.
//! When a result arrives it is committed only if its ticket is still the
//! newest one issued; results of superseded calls are dropped silently.

use crate::signal::{ReadSignal, Signal, WriteSignal};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// State of the most recent asynchronous call.
#[derive(Clone, Debug, PartialEq)]
pub struct AsyncState<T, E> {
    pub loading: bool,
    pub value: Option<T>,
    pub error: Option<E>,
}

impl<T, E> Default for AsyncState<T, E> {
    fn default() -> Self {
        Self {
            loading: false,
            value: None,
            error: None,
        }
    }
}

/// Proof of which call a result belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

/// Issues tickets and commits results into an [`AsyncState`] signal.
pub struct AsyncTracker<T, E> {
    state: WriteSignal<AsyncState<T, E>>,
    latest: Arc<AtomicU64>,
}

impl<T, E> Clone for AsyncTracker<T, E> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            latest: Arc::clone(&self.latest),
        }
    }
}

impl<T, E> AsyncTracker<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Start a call: issue a new ticket and mark the state loading. The
    /// previous value and error stay visible while loading.
    pub fn start(&self) -> Ticket {
        let ticket = Ticket(self.latest.fetch_add(1, Ordering::SeqCst) + 1);
        self.state.modify(|state| state.loading = true);
        ticket
    }

    /// Whether `ticket` is still the newest one issued.
    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }

    /// Commit the outcome of the call stamped with `ticket`.
    ///
    /// Returns `false`, committing nothing, when a newer call has started.
    pub fn resolve(&self, ticket: Ticket, outcome: Result<T, E>) -> bool {
        if !self.is_current(ticket) {
            log::debug!("async: dropping stale result of ticket {}", ticket.0);
            return false;
        }
        self.state.set(match outcome {
            Ok(value) => AsyncState {
                loading: false,
                value: Some(value),
                error: None,
            },
            Err(error) => AsyncState {
                loading: false,
                value: None,
                error: Some(error),
            },
        });
        true
    }

    /// Run `f` as a call that completes immediately.
    pub fn call(&self, f: impl FnOnce() -> Result<T, E>) -> bool {
        let ticket = self.start();
        self.resolve(ticket, f())
    }
}

/// Create an async state signal and its tracker.
pub fn create_async<T, E>() -> (ReadSignal<AsyncState<T, E>>, AsyncTracker<T, E>)
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    let (state, write) = Signal::new(AsyncState::default()).split();
    (
        state,
        AsyncTracker {
            state: write,
            latest: Arc::new(AtomicU64::new(0)),
        },
    )
}
