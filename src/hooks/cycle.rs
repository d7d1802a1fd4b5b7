use crate::error::{Error, Result};
use crate::signal::{ReadSignal, Signal, WriteSignal};
use std::sync::Arc;

/// Selection over a fixed list of values that wraps around at both ends.
pub struct Cycle<T> {
    state: WriteSignal<T>,
    index: WriteSignal<usize>,
    values: Arc<Vec<T>>,
}

impl<T> Clone for Cycle<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            index: self.index.clone(),
            values: Arc::clone(&self.values),
        }
    }
}

impl<T: Clone + PartialEq + Send + Sync + 'static> Cycle<T> {
    fn select(&self, index: usize) {
        self.step(|_| index);
    }

    // The index is read and advanced in one commit, so concurrent steps
    // never pick the same slot.
    fn step(&self, f: impl FnOnce(usize) -> usize) {
        let mut selected = 0;
        self.index.update(|current| {
            selected = f(*current);
            selected
        });
        self.state.set(self.values[selected].clone());
    }

    /// Select the element at `index`, wrapping modulo the list length.
    pub fn set_state_at(&self, index: usize) {
        self.select(index % self.values.len());
    }

    /// Select `value`; it must be an element of the list.
    pub fn set_state(&self, value: &T) -> Result<()> {
        let index = self
            .values
            .iter()
            .position(|v| v == value)
            .ok_or(Error::NotInList)?;
        self.select(index);
        Ok(())
    }

    pub fn next(&self) {
        let len = self.values.len();
        self.step(|current| (current + 1) % len);
    }

    pub fn prev(&self) {
        let len = self.values.len();
        self.step(|current| (current + len - 1) % len);
    }
}

/// Create a cycling selection starting at the first value.
///
/// Returns the selected value, its index, and the controls.
#[allow(clippy::type_complexity)]
pub fn create_cycle<T>(values: Vec<T>) -> Result<(ReadSignal<T>, ReadSignal<usize>, Cycle<T>)>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    let first = values.first().cloned().ok_or(Error::EmptyList)?;
    let (state, write) = Signal::new(first).split();
    let (index, write_index) = Signal::new(0).split();
    Ok((
        state,
        index,
        Cycle {
            state: write,
            index: write_index,
            values: Arc::new(values),
        },
    ))
}
