//! Object-shaped state.
//!
//! A [`PatchStore`] shallow-merges partial updates into a signal; a
//! [`GlobalState`] shares one value between every component that mounts it.

mod global;
mod patch;

pub use global::{GlobalHandle, GlobalState};
pub use patch::{create_patch_store, Merge, PatchStore};
