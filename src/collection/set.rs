use crate::signal::{ReadSignal, Signal, WriteSignal};
use std::collections::HashSet;
use std::hash::Hash;
use std::sync::Arc;

/// Membership operations over a signal holding an `Arc<HashSet<T>>` snapshot.
pub struct SetActions<T> {
    state: WriteSignal<Arc<HashSet<T>>>,
    initial: Arc<HashSet<T>>,
}

impl<T> Clone for SetActions<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            initial: Arc::clone(&self.initial),
        }
    }
}

impl<T: Eq + Hash + Clone + Send + Sync + 'static> SetActions<T> {
    fn commit(&self, f: impl FnOnce(&mut HashSet<T>)) {
        self.state.update(|prev| {
            let mut next = HashSet::clone(prev);
            f(&mut next);
            Arc::new(next)
        });
    }

    pub fn has(&self, item: &T) -> bool {
        self.state.peek().contains(item)
    }

    pub fn add(&self, item: T) {
        self.commit(|set| {
            set.insert(item);
        });
    }

    pub fn remove(&self, item: &T) {
        self.commit(|set| {
            set.remove(item);
        });
    }

    /// Add `item` if absent, remove it if present.
    pub fn toggle(&self, item: T) {
        self.commit(|set| {
            if !set.remove(&item) {
                set.insert(item);
            }
        });
    }

    pub fn clear(&self) {
        self.state.set(Arc::new(HashSet::new()));
    }

    pub fn reset(&self) {
        self.state.set(Arc::new(HashSet::clone(&self.initial)));
    }
}

/// Create a set store.
pub fn create_set<T>(initial: HashSet<T>) -> (ReadSignal<Arc<HashSet<T>>>, SetActions<T>)
where
    T: Eq + Hash + Clone + Send + Sync + 'static,
{
    let initial = Arc::new(initial);
    let (state, write) = Signal::new(Arc::new(HashSet::clone(&initial))).split();
    (
        state,
        SetActions {
            state: write,
            initial,
        },
    )
}
