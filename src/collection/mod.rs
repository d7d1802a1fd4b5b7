//! Collection stores.
//!
//! Each store is a signal holding an immutable snapshot behind an `Arc`,
//! plus an actions handle whose operations commit a new snapshot. Consumers
//! can use `Arc::ptr_eq` to tell whether anything changed.

mod list;
mod map;
mod queue;
mod set;

pub use list::{create_list, create_list_with, ListActions};
pub use map::{create_map, MapActions};
pub use queue::{create_queue, QueueActions};
pub use set::{create_set, SetActions};
