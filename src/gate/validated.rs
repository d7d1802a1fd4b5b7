use crate::signal::{create_effect, Effect, ReadSignal, Signal, WriteSignal};
use std::sync::Arc;

/// How validity is computed from the signals the validator reads.
pub enum Validator<V> {
    /// Return the validity.
    Sync(Box<dyn Fn() -> V + Send + Sync>),
    /// Report the validity through a [`SetValidity`] handle, possibly later.
    Deferred(Box<dyn Fn(SetValidity<V>) + Send + Sync>),
}

impl<V> Validator<V> {
    pub fn sync(f: impl Fn() -> V + Send + Sync + 'static) -> Self {
        Validator::Sync(Box::new(f))
    }

    pub fn deferred(f: impl Fn(SetValidity<V>) + Send + Sync + 'static) -> Self {
        Validator::Deferred(Box::new(f))
    }
}

/// Handle through which a deferred validator reports its result.
pub struct SetValidity<V>(WriteSignal<V>);

impl<V> Clone for SetValidity<V> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<V: Clone + Send + Sync + 'static> SetValidity<V> {
    pub fn set(&self, validity: V) {
        self.0.set(validity);
    }
}

/// Read-only validity derived from one or more source signals.
///
/// The validator runs on creation and again whenever any signal it read on
/// its previous run commits.
pub struct Validity<V> {
    state: ReadSignal<V>,
    effect: Effect,
}

impl<V: Clone + Send + Sync + 'static> Validity<V> {
    pub fn get(&self) -> V {
        self.state.get()
    }

    pub fn state(&self) -> &ReadSignal<V> {
        &self.state
    }

    /// Run the validator now.
    pub fn revalidate(&self) {
        self.effect.run();
    }
}

/// Create a validity signal starting at `initial`.
pub fn create_validator<V>(initial: V, validator: Validator<V>) -> Validity<V>
where
    V: Clone + Send + Sync + 'static,
{
    let (state, write) = Signal::new(initial).split();
    let validator = Arc::new(validator);

    let effect = create_effect(move || match &*validator {
        Validator::Sync(f) => write.set(f()),
        Validator::Deferred(f) => f(SetValidity(write.clone())),
    });

    Validity { state, effect }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::Runtime;
    use crate::signal::create_signal;
    use parking_lot::Mutex;

    #[test]
    fn sync_validator_follows_source() {
        Runtime::scope(|| {
            let (password, set_password) = create_signal(String::from("abc"));
            let validity = create_validator(
                (false, None::<String>),
                Validator::sync(move || {
                    let long_enough = password.with(|p| p.len() >= 8);
                    let reason = (!long_enough).then(|| "too short".to_string());
                    (long_enough, reason)
                }),
            );

            assert_eq!(validity.get(), (false, Some("too short".to_string())));
            set_password.set("correct horse".to_string());
            assert_eq!(validity.get(), (true, None));
        });
    }

    #[test]
    fn validator_over_several_sources() {
        Runtime::scope(|| {
            let (low, set_low) = create_signal(1);
            let (high, set_high) = create_signal(5);
            let validity =
                create_validator(false, Validator::sync(move || low.get() <= high.get()));

            assert!(validity.get());
            set_low.set(9);
            assert!(!validity.get());
            set_high.set(10);
            assert!(validity.get());
        });
    }

    #[test]
    fn deferred_validator_reports_later() {
        Runtime::scope(|| {
            let parked: Arc<Mutex<Option<(i32, SetValidity<bool>)>>> = Arc::new(Mutex::new(None));
            let (value, set_value) = create_signal(1);
            let validity = create_validator(
                false,
                Validator::deferred({
                    let parked = parked.clone();
                    move |report| *parked.lock() = Some((value.get(), report))
                }),
            );
            assert!(!validity.get());

            let (seen, report) = parked.lock().take().unwrap();
            report.set(seen > 0);
            assert!(validity.get());

            set_value.set(-1);
            let (seen, report) = parked.lock().take().unwrap();
            report.set(seen > 0);
            assert!(!validity.get());
        });
    }

    #[test]
    fn revalidate_runs_again() {
        Runtime::scope(|| {
            let runs = Arc::new(Mutex::new(0));
            let validity = create_validator(0, Validator::sync({
                let runs = runs.clone();
                move || {
                    let mut runs = runs.lock();
                    *runs += 1;
                    *runs
                }
            }));
            assert_eq!(validity.get(), 1);
            validity.revalidate();
            assert_eq!(validity.get(), 2);
        });
    }
}
