//! Small stateful patterns built on signals.

mod counter;
mod cycle;
mod history;
mod toggle;

pub use counter::{create_counter, Counter, CounterBounds};
pub use cycle::{create_cycle, Cycle};
pub use history::{create_history, History, HistoryOptions};
pub use toggle::{create_toggle, Toggle};
