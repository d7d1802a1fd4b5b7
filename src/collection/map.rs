use crate::signal::{ReadSignal, Signal, WriteSignal};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Keyed operations over a signal holding an `Arc<BTreeMap<K, V>>` snapshot.
///
/// Entries are ordered by key, not by insertion. Removing an entry keeps
/// the others in key order, and iteration never reflects when a key was
/// first set.
pub struct MapActions<K, V> {
    state: WriteSignal<Arc<BTreeMap<K, V>>>,
    initial: Arc<BTreeMap<K, V>>,
}

impl<K, V> Clone for MapActions<K, V> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            initial: Arc::clone(&self.initial),
        }
    }
}

impl<K, V> MapActions<K, V>
where
    K: Ord + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// The value stored under `key`.
    pub fn get(&self, key: &K) -> Option<V> {
        self.state.peek().get(key).cloned()
    }

    /// Insert or replace one entry.
    pub fn set(&self, key: K, value: V) {
        self.state.update(|prev| {
            let mut next = BTreeMap::clone(prev);
            next.insert(key, value);
            Arc::new(next)
        });
    }

    /// Replace the whole map.
    pub fn set_all(&self, map: BTreeMap<K, V>) {
        self.state.set(Arc::new(map));
    }

    /// Drop `key`, keeping every other entry.
    pub fn remove(&self, key: &K) {
        self.state.update(|prev| {
            let mut next = BTreeMap::clone(prev);
            next.remove(key);
            Arc::new(next)
        });
    }

    /// Restore the initial entries.
    pub fn reset(&self) {
        self.state.set(Arc::new(BTreeMap::clone(&self.initial)));
    }
}

/// Create a map store.
#[allow(clippy::type_complexity)]
pub fn create_map<K, V>(
    initial: BTreeMap<K, V>,
) -> (ReadSignal<Arc<BTreeMap<K, V>>>, MapActions<K, V>)
where
    K: Ord + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    let initial = Arc::new(initial);
    let (state, write) = Signal::new(Arc::new(BTreeMap::clone(&initial))).split();
    (
        state,
        MapActions {
            state: write,
            initial,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_upserts_single_entry() {
        let (map, actions) = create_map(BTreeMap::from([("hello", "there")]));
        actions.set("key", "value");
        actions.set("hello", "world");

        assert_eq!(actions.get(&"hello"), Some("world"));
        assert_eq!(map.get().len(), 2);
    }

    #[test]
    fn remove_keeps_other_entries() {
        let (map, actions) = create_map(BTreeMap::from([(1, 'a'), (2, 'b'), (3, 'c')]));
        let before = map.get();
        actions.remove(&2);

        assert_eq!(
            map.get().iter().collect::<Vec<_>>(),
            vec![(&1, &'a'), (&3, &'c')]
        );
        assert_eq!(before.len(), 3);
        assert_eq!(actions.get(&2), None);
    }

    #[test]
    fn set_all_and_reset() {
        let (map, actions) = create_map(BTreeMap::from([("a", 1)]));
        actions.set_all(BTreeMap::from([("b", 2), ("c", 3)]));
        assert_eq!(*map.get(), BTreeMap::from([("b", 2), ("c", 3)]));

        actions.reset();
        assert_eq!(*map.get(), BTreeMap::from([("a", 1)]));
    }

    #[test]
    fn entries_iterate_in_key_order() {
        let (map, actions) = create_map(BTreeMap::new());
        actions.set("c", 3);
        actions.set("a", 1);
        actions.set("b", 2);
        actions.remove(&"b");

        assert_eq!(map.get().keys().copied().collect::<Vec<_>>(), vec!["a", "c"]);
    }
}
