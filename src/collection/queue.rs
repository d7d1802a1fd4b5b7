use crate::signal::{ReadSignal, Signal, WriteSignal};
use std::collections::VecDeque;
use std::sync::Arc;

/// FIFO operations over a signal holding an `Arc<VecDeque<T>>` snapshot.
pub struct QueueActions<T> {
    state: WriteSignal<Arc<VecDeque<T>>>,
}

impl<T> Clone for QueueActions<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> QueueActions<T> {
    /// Append at the tail.
    pub fn add(&self, item: T) {
        self.state.update(|prev| {
            let mut next = VecDeque::clone(prev);
            next.push_back(item);
            Arc::new(next)
        });
    }

    /// Pop the head. Returns `None`, and commits nothing, when empty.
    pub fn remove(&self) -> Option<T> {
        let mut head = None;
        self.state.try_update(|prev| {
            let mut next = VecDeque::clone(prev);
            head = Some(next.pop_front()?);
            Some(Arc::new(next))
        });
        head
    }

    pub fn first(&self) -> Option<T> {
        self.state.peek().front().cloned()
    }

    pub fn last(&self) -> Option<T> {
        self.state.peek().back().cloned()
    }

    pub fn size(&self) -> usize {
        self.state.peek().len()
    }
}

/// Create a FIFO queue store.
pub fn create_queue<T>(initial: Vec<T>) -> (ReadSignal<Arc<VecDeque<T>>>, QueueActions<T>)
where
    T: Clone + Send + Sync + 'static,
{
    let (state, write) = Signal::new(Arc::new(VecDeque::from(initial))).split();
    (state, QueueActions { state: write })
}
