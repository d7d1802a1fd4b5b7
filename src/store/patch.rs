use crate::signal::{ReadSignal, Signal, WriteSignal};
use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};

/// Shallow merge of a partial value into a whole one.
///
/// `merge` returns a new value: fields present in the patch replace the
/// current ones wholesale, fields absent from it are carried over. Nothing is
/// merged recursively.
///
/// Structs implement this with a patch type whose fields are `Option`s:
///
/// ```
/// use stately::Merge;
///
/// #[derive(Clone)]
/// struct Form { name: String, age: u32 }
///
/// #[derive(Default)]
/// struct FormPatch { name: Option<String>, age: Option<u32> }
///
/// impl Merge for Form {
///     type Patch = FormPatch;
///
///     fn merge(&self, patch: FormPatch) -> Self {
///         Form {
///             name: patch.name.unwrap_or_else(|| self.name.clone()),
///             age: patch.age.unwrap_or(self.age),
///         }
///     }
/// }
/// ```
pub trait Merge: Clone {
    type Patch;

    fn merge(&self, patch: Self::Patch) -> Self;
}

impl<K, V, S> Merge for HashMap<K, V, S>
where
    K: Eq + Hash + Clone,
    V: Clone,
    S: BuildHasher + Clone,
{
    type Patch = HashMap<K, V, S>;

    fn merge(&self, patch: Self::Patch) -> Self {
        let mut merged = self.clone();
        merged.extend(patch);
        merged
    }
}

impl<K: Ord + Clone, V: Clone> Merge for BTreeMap<K, V> {
    type Patch = BTreeMap<K, V>;

    fn merge(&self, patch: Self::Patch) -> Self {
        let mut merged = self.clone();
        merged.extend(patch);
        merged
    }
}

/// Merge-style setter over a signal holding a [`Merge`] value.
pub struct PatchStore<T> {
    state: WriteSignal<T>,
}

impl<T> Clone for PatchStore<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<T: Merge + Send + Sync + 'static> PatchStore<T> {
    /// Merge `patch` into the current state.
    pub fn patch(&self, patch: T::Patch) {
        self.state.update(|prev| prev.merge(patch));
    }

    /// Merge the patch computed from the current state.
    pub fn patch_with(&self, f: impl FnOnce(&T) -> T::Patch) {
        self.state.update(|prev| prev.merge(f(prev)));
    }

    /// Replace the whole state.
    pub fn replace(&self, state: T) {
        self.state.set(state);
    }
}

/// Create a signal holding `initial` together with its merge setter.
pub fn create_patch_store<T>(initial: T) -> (ReadSignal<T>, PatchStore<T>)
where
    T: Merge + Send + Sync + 'static,
{
    let (state, write) = Signal::new(initial).split();
    (state, PatchStore { state: write })
}
