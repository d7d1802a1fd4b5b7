use crate::error::{Error, Result};
use crate::signal::{ReadSignal, Signal, WriteSignal};

/// Inclusive bounds for a [`Counter`]; `None` leaves that side open.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CounterBounds {
    pub min: Option<i64>,
    pub max: Option<i64>,
}

impl CounterBounds {
    pub fn new(min: i64, max: i64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    fn clamp(&self, value: i64) -> i64 {
        let value = self.min.map_or(value, |min| value.max(min));
        self.max.map_or(value, |max| value.min(max))
    }
}

/// Integer signal kept within [`CounterBounds`].
#[derive(Clone)]
pub struct Counter {
    state: WriteSignal<i64>,
    initial: i64,
    bounds: CounterBounds,
}

impl Counter {
    fn commit(&self, f: impl FnOnce(i64) -> i64) {
        let bounds = self.bounds;
        self.state.update(|current| {
            let next = f(*current);
            let clamped = bounds.clamp(next);
            if clamped != next {
                log::warn!("counter: {next} clamped to {clamped}");
            }
            clamped
        });
    }

    pub fn inc(&self, delta: i64) {
        self.commit(|n| n.saturating_add(delta));
    }

    pub fn dec(&self, delta: i64) {
        self.commit(|n| n.saturating_sub(delta));
    }

    pub fn set(&self, value: i64) {
        self.commit(|_| value);
    }

    /// Back to the (clamped) initial value.
    pub fn reset(&self) {
        let initial = self.initial;
        self.commit(|_| initial);
    }
}

/// Create a counter. The initial value is clamped into `bounds`.
pub fn create_counter(
    initial: i64,
    bounds: CounterBounds,
) -> Result<(ReadSignal<i64>, Counter)> {
    if let (Some(min), Some(max)) = (bounds.min, bounds.max) {
        if min > max {
            return Err(Error::InvertedBounds { min, max });
        }
    }

    let initial = bounds.clamp(initial);
    let (state, write) = Signal::new(initial).split();
    Ok((
        state,
        Counter {
            state: write,
            initial,
            bounds,
        },
    ))
}
