//! Errors for structural operations that refuse their input.
//!
//! Panics raised by caller-supplied closures (updaters, predicates,
//! comparators, mediators, validators) are not represented here; they
//! unwind to the caller unchanged.

use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A list write would leave a hole between the last element and `index`.
    #[error("index {index} is past the end of a list of length {len}")]
    SparseIndex { index: usize, len: usize },

    /// A cycling list was asked to select a value it does not contain.
    #[error("value is not an element of the cycling list")]
    NotInList,

    /// A cycling list operation on an empty list.
    #[error("cycling list is empty")]
    EmptyList,

    /// A history position outside the recorded entries.
    #[error("history position {position} is out of range for {len} entries")]
    HistoryOutOfRange { position: usize, len: usize },

    /// Counter bounds with `min > max`.
    #[error("counter bounds are inverted: min {min} > max {max}")]
    InvertedBounds { min: i64, max: i64 },
}
