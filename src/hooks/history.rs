use crate::error::{Error, Result};
use crate::signal::{ReadSignal, Signal, WriteSignal};
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HistoryOptions {
    /// Most entries kept; the oldest are dropped first. At least one entry
    /// is always kept.
    pub capacity: usize,
}

impl Default for HistoryOptions {
    fn default() -> Self {
        Self { capacity: 10 }
    }
}

struct HistoryLog<T> {
    entries: Vec<T>,
    position: usize,
}

/// Setter that records every value and can travel back and forth.
pub struct History<T> {
    state: WriteSignal<T>,
    log: Arc<Mutex<HistoryLog<T>>>,
    capacity: usize,
}

impl<T> Clone for History<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            log: Arc::clone(&self.log),
            capacity: self.capacity,
        }
    }
}

impl<T: Clone + Send + Sync + 'static> History<T> {
    /// Commit `value` as a new entry. Entries ahead of the current position
    /// are discarded.
    pub fn set(&self, value: T) {
        {
            let mut log = self.log.lock();
            let keep = log.position + 1;
            log.entries.truncate(keep);
            log.entries.push(value.clone());
            let overflow = log.entries.len().saturating_sub(self.capacity);
            log.entries.drain(..overflow);
            log.position = log.entries.len() - 1;
        }
        self.state.set(value);
    }

    /// Step back `steps` entries, stopping at the oldest.
    pub fn back(&self, steps: usize) {
        let position = self.log.lock().position.saturating_sub(steps);
        self.travel(position);
    }

    /// Step forward `steps` entries, stopping at the newest.
    pub fn forward(&self, steps: usize) {
        let position = {
            let log = self.log.lock();
            (log.position + steps).min(log.entries.len() - 1)
        };
        self.travel(position);
    }

    /// Jump to the entry at `position` (0 is the oldest kept entry).
    pub fn go(&self, position: usize) -> Result<()> {
        let len = self.log.lock().entries.len();
        if position >= len {
            return Err(Error::HistoryOutOfRange { position, len });
        }
        self.travel(position);
        Ok(())
    }

    pub fn position(&self) -> usize {
        self.log.lock().position
    }

    pub fn entries(&self) -> Vec<T> {
        self.log.lock().entries.clone()
    }

    fn travel(&self, position: usize) {
        let value = {
            let mut log = self.log.lock();
            if log.position == position {
                return;
            }
            log.position = position;
            log.entries[position].clone()
        };
        self.state.set(value);
    }
}

/// Create a signal whose writes are recorded for undo/redo.
pub fn create_history<T>(initial: T, options: HistoryOptions) -> (ReadSignal<T>, History<T>)
where
    T: Clone + Send + Sync + 'static,
{
    let (state, write) = Signal::new(initial.clone()).split();
    (
        state,
        History {
            state: write,
            log: Arc::new(Mutex::new(HistoryLog {
                entries: vec![initial],
                position: 0,
            })),
            capacity: options.capacity.max(1),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn back_and_forward() {
        let (state, history) = create_history("a", HistoryOptions::default());
        history.set("b");
        history.set("c");

        history.back(1);
        assert_eq!(state.get(), "b");
        history.back(5);
        assert_eq!(state.get(), "a");
        history.forward(1);
        assert_eq!(state.get(), "b");
        history.forward(9);
        assert_eq!(state.get(), "c");
    }

    #[test]
    fn set_after_back_discards_redo_entries() {
        let (state, history) = create_history(1, HistoryOptions::default());
        history.set(2);
        history.set(3);
        history.back(2);
        history.set(4);

        assert_eq!(history.entries(), vec![1, 4]);
        assert_eq!(history.position(), 1);
        assert_eq!(state.get(), 4);
    }

    #[test]
    fn capacity_drops_oldest() {
        let (_state, history) = create_history(0, HistoryOptions { capacity: 3 });
        for n in 1..=4 {
            history.set(n);
        }
        assert_eq!(history.entries(), vec![2, 3, 4]);
        assert_eq!(history.position(), 2);
    }

    #[test]
    fn go_checks_range() {
        let (state, history) = create_history('x', HistoryOptions::default());
        history.set('y');
        history.go(0).unwrap();
        assert_eq!(state.get(), 'x');
        assert_eq!(
            history.go(2),
            Err(Error::HistoryOutOfRange { position: 2, len: 2 })
        );
    }
}
