use crate::error::{Error, Result};
use crate::signal::{ReadSignal, Signal, Update, WriteSignal};
use std::cmp::Ordering;
use std::sync::Arc;

type Initial<T> = Arc<dyn Fn() -> Vec<T> + Send + Sync>;

/// Structural operations over a signal holding an `Arc<Vec<T>>` snapshot.
///
/// Every operation builds a new vector and commits it as a new `Arc`; the
/// previous snapshot is never touched.
pub struct ListActions<T> {
    state: WriteSignal<Arc<Vec<T>>>,
    initial: Initial<T>,
}

impl<T> Clone for ListActions<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            initial: Arc::clone(&self.initial),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> ListActions<T> {
    fn commit(&self, f: impl FnOnce(&[T]) -> Vec<T>) {
        self.state.update(|prev| Arc::new(f(prev.as_slice())));
    }

    /// Replace the whole list.
    pub fn set(&self, list: Vec<T>) {
        self.state.set(Arc::new(list));
    }

    /// Replace the whole list with a value or a function of the previous one.
    pub fn apply(&self, update: impl Into<Update<Vec<T>>>) {
        match update.into() {
            Update::Value(list) => self.set(list),
            Update::With(f) => self.state.update(|prev| Arc::new(f(&**prev))),
        }
    }

    /// Replace the whole list with a function of the previous one.
    pub fn set_with(&self, f: impl FnOnce(&[T]) -> Vec<T>) {
        self.commit(f);
    }

    /// Append items at the end. Nothing is committed for an empty batch.
    pub fn push(&self, items: impl IntoIterator<Item = T>) {
        let items: Vec<T> = items.into_iter().collect();
        if items.is_empty() {
            return;
        }
        self.commit(|prev| {
            let mut next = Vec::with_capacity(prev.len() + items.len());
            next.extend_from_slice(prev);
            next.extend(items);
            next
        });
    }

    /// Replace the element at `index`, or append when `index == len`.
    ///
    /// This is the one operation that differs from an array with holes: an
    /// index past the end is refused with [`Error::SparseIndex`] and the list
    /// is left untouched, since a `Vec` has no empty slots to fill.
    pub fn update_at(&self, index: usize, item: T) -> Result<()> {
        let mut outcome = Ok(());
        self.state.try_update(|prev| {
            let len = prev.len();
            if index > len {
                log::debug!("list: refusing update at {index}, length {len}");
                outcome = Err(Error::SparseIndex { index, len });
                return None;
            }

            let mut next = prev.to_vec();
            if index == len {
                next.push(item);
            } else {
                next[index] = item;
            }
            Some(Arc::new(next))
        });
        outcome
    }

    /// Insert at `index`, shifting later elements right.
    ///
    /// Like [`ListActions::update_at`], an index past the end is refused with
    /// [`Error::SparseIndex`].
    pub fn insert_at(&self, index: usize, item: T) -> Result<()> {
        let mut outcome = Ok(());
        self.state.try_update(|prev| {
            let len = prev.len();
            if index > len {
                log::debug!("list: refusing insert at {index}, length {len}");
                outcome = Err(Error::SparseIndex { index, len });
                return None;
            }

            let mut next = prev.to_vec();
            next.insert(index, item);
            Some(Arc::new(next))
        });
        outcome
    }

    /// Replace every element for which `predicate(element, &new_item)` holds.
    pub fn update(&self, predicate: impl Fn(&T, &T) -> bool, new_item: T) {
        self.commit(|prev| {
            prev.iter()
                .map(|item| {
                    if predicate(item, &new_item) {
                        new_item.clone()
                    } else {
                        item.clone()
                    }
                })
                .collect()
        });
    }

    /// Replace the first matching element. No-op when nothing matches.
    pub fn update_first(&self, predicate: impl Fn(&T, &T) -> bool, new_item: T) {
        self.state.try_update(|prev| {
            let index = prev.iter().position(|item| predicate(item, &new_item))?;
            let mut next = prev.to_vec();
            next[index] = new_item;
            Some(Arc::new(next))
        });
    }

    /// Replace the first matching element, or append `new_item`.
    pub fn upsert(&self, predicate: impl Fn(&T, &T) -> bool, new_item: T) {
        self.commit(|prev| {
            let mut next = prev.to_vec();
            match prev.iter().position(|item| predicate(item, &new_item)) {
                Some(index) => next[index] = new_item,
                None => next.push(new_item),
            }
            next
        });
    }

    /// Stable sort by the natural order.
    pub fn sort(&self)
    where
        T: Ord,
    {
        self.sort_by(Ord::cmp);
    }

    /// Stable sort with a comparator.
    pub fn sort_by(&self, compare: impl FnMut(&T, &T) -> Ordering) {
        self.commit(|prev| {
            let mut next = prev.to_vec();
            next.sort_by(compare);
            next
        });
    }

    /// Keep only the elements matching `predicate`.
    pub fn filter(&self, mut predicate: impl FnMut(&T) -> bool) {
        self.commit(|prev| prev.iter().filter(|&item| predicate(item)).cloned().collect());
    }

    /// Remove the element at `index`, shifting later elements left.
    pub fn remove_at(&self, index: usize) {
        self.commit(|prev| {
            let mut next = prev.to_vec();
            if index < next.len() {
                next.remove(index);
            }
            next
        });
    }

    pub fn clear(&self) {
        self.set(Vec::new());
    }

    /// Restore the initial list, re-running the initializer if one was given.
    pub fn reset(&self) {
        self.set((self.initial)());
    }
}

/// Create a list store from an initial list.
///
/// ```
/// use stately::create_list;
///
/// let (list, actions) = create_list(vec![10, 20, 30]);
/// actions.remove_at(1);
/// assert_eq!(*list.get(), vec![10, 30]);
/// ```
pub fn create_list<T>(initial: Vec<T>) -> (ReadSignal<Arc<Vec<T>>>, ListActions<T>)
where
    T: Clone + Send + Sync + 'static,
{
    create_list_with(move || initial.clone())
}

/// Create a list store whose initial list is produced by `init`, called now
/// and again on every [`ListActions::reset`].
pub fn create_list_with<T, F>(init: F) -> (ReadSignal<Arc<Vec<T>>>, ListActions<T>)
where
    T: Clone + Send + Sync + 'static,
    F: Fn() -> Vec<T> + Send + Sync + 'static,
{
    let (state, write) = Signal::new(Arc::new(init())).split();
    (
        state,
        ListActions {
            state: write,
            initial: Arc::new(init),
        },
    )
}
