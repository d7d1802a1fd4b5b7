//! # Stately
//!
//! Observable state cells and the update strategies that component hooks
//! build on.
//!
//! ## Signals (the cell)
//!
//! - `Signal<T>` - a value that notifies subscribers and observers on commit
//! - `Update<T>` - a write: either a value or a function of the previous one
//! - `Memo<T>` - Computed values that automatically track dependencies
//! - `Effect` - Side effects that run when dependencies change
//!
//! ## Adapters
//!
//! - `PatchStore<T>` - shallow-merge setter over a [`Merge`] value
//! - list, map, set and queue stores whose operations commit new snapshots
//! - `GlobalState<T>` - one value shared by every component that mounts it
//! - `AsyncTracker` - last-write-wins ticketing for asynchronous results
//!
//! ## Gated setters
//!
//! Debounced, throttled, frame-gated, mediated and validated writes. Timers
//! and frames come from a [`Scheduler`]; [`EventLoop`] is a host-driven
//! implementation with a virtual clock.
//!
//! ```
//! use stately::{create_signal, Throttled, EventLoop};
//! use std::time::Duration;
//!
//! let event_loop = EventLoop::new();
//! let (scroll, set_scroll) = create_signal(0);
//! let throttled = Throttled::signal(event_loop.clone(), Duration::from_millis(100), set_scroll);
//!
//! throttled.set(10);
//! throttled.set(20);
//! assert_eq!(scroll.get(), 10);
//!
//! event_loop.advance(Duration::from_millis(100));
//! assert_eq!(scroll.get(), 20);
//! ```

pub mod collection;
pub mod error;
pub mod gate;
pub mod hooks;
pub mod runtime;
pub mod signal;
pub mod store;
pub mod ticket;

// Re-export main types for convenience
pub use collection::{
    create_list, create_list_with, create_map, create_queue, create_set, ListActions, MapActions,
    QueueActions, SetActions,
};
pub use error::{Error, Result};
pub use gate::{
    create_mediated, create_validator, Commit, Debounced, EventLoop, FrameGated, MediatedSetter,
    Mediator, Readiness, Scheduler, SetValidity, Throttled, Timeout, Validator, Validity,
};
pub use hooks::{
    create_counter, create_cycle, create_history, create_toggle, Counter, CounterBounds, Cycle,
    History, HistoryOptions, Toggle,
};
pub use signal::{
    create_effect, create_memo, create_signal, create_signal_with, Effect, Memo, ReadSignal,
    Signal, Update, WatchGuard, WriteSignal,
};
pub use store::{create_patch_store, GlobalHandle, GlobalState, Merge, PatchStore};
pub use ticket::{create_async, AsyncState, AsyncTracker, Ticket};
