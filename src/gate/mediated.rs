use crate::signal::{ReadSignal, Signal, WriteSignal};
use std::sync::Arc;

/// How a mediated setter turns its input into a commit.
pub enum Mediator<R, T> {
    /// Commit the transformed input.
    Map(Box<dyn Fn(R) -> T + Send + Sync>),
    /// Hand the input and a [`Commit`] handle to the mediator, which decides
    /// whether, when and what to commit.
    Commit(Box<dyn Fn(R, Commit<T>) + Send + Sync>),
}

impl<R, T> Mediator<R, T> {
    pub fn map(f: impl Fn(R) -> T + Send + Sync + 'static) -> Self {
        Mediator::Map(Box::new(f))
    }

    pub fn commit(f: impl Fn(R, Commit<T>) + Send + Sync + 'static) -> Self {
        Mediator::Commit(Box::new(f))
    }
}

/// Deferred commit handed to a [`Mediator::Commit`]. It may be kept and
/// used later, used several times, or dropped.
pub struct Commit<T>(WriteSignal<T>);

impl<T> Clone for Commit<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: Clone + Send + Sync + 'static> Commit<T> {
    pub fn set(&self, value: T) {
        self.0.set(value);
    }
}

/// Setter whose input passes through a [`Mediator`] before reaching the
/// signal.
pub struct MediatedSetter<R, T> {
    state: WriteSignal<T>,
    mediator: Arc<Mediator<R, T>>,
}

impl<R, T> Clone for MediatedSetter<R, T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            mediator: Arc::clone(&self.mediator),
        }
    }
}

impl<R, T: Clone + Send + Sync + 'static> MediatedSetter<R, T> {
    pub fn set(&self, input: R) {
        match &*self.mediator {
            Mediator::Map(f) => self.state.set(f(input)),
            Mediator::Commit(f) => f(input, Commit(self.state.clone())),
        }
    }
}

/// Create a signal whose writes go through `mediator`.
pub fn create_mediated<R, T>(
    initial: T,
    mediator: Mediator<R, T>,
) -> (ReadSignal<T>, MediatedSetter<R, T>)
where
    T: Clone + Send + Sync + 'static,
{
    let (state, write) = Signal::new(initial).split();
    (
        state,
        MediatedSetter {
            state: write,
            mediator: Arc::new(mediator),
        },
    )
}
