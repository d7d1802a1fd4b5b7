//! Gated setters.
//!
//! Wrappers that delay, coalesce, transform or validate writes before they
//! reach a signal. Time-based gates run on a [`Scheduler`], hold at most one
//! pending timer or frame, and cancel it on `cancel()` and on drop.

mod debounce;
mod frame;
mod mediated;
mod scheduler;
mod throttle;
mod timeout;
mod validated;

pub use debounce::Debounced;
pub use frame::FrameGated;
pub use mediated::{create_mediated, Commit, MediatedSetter, Mediator};
pub use scheduler::{EventLoop, FrameId, Scheduler, Task, TimerId};
pub use throttle::Throttled;
pub use timeout::{Readiness, Timeout};
pub use validated::{create_validator, SetValidity, Validator, Validity};
