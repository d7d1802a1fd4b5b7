use crate::runtime::Runtime;
use std::sync::{Arc, Weak};

/// A side effect that runs when its dependencies change.
///
/// The effect runs immediately on creation and again after every commit of
/// a signal or memo it read during its previous run. Dependencies are
/// re-tracked on every run. Dropping the handle disposes the effect.
#[must_use = "dropping an Effect disposes it"]
pub struct Effect {
    id: usize,
    runtime: Weak<Runtime>,
    run: Arc<dyn Fn() + Send + Sync>,
}

impl Effect {
    fn new<F>(effect: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        let runtime = Runtime::current();
        let id = runtime.next_id();
        let effect: Arc<dyn Fn() + Send + Sync> = Arc::new(effect);
        let weak = Arc::downgrade(&runtime);

        let run: Arc<dyn Fn() + Send + Sync> = Arc::new({
            let effect = Arc::clone(&effect);
            move || {
                if let Some(runtime) = weak.upgrade() {
                    runtime.track(id, || effect());
                }
            }
        });

        // Register the effect with the runtime
        runtime.register_effect(id, {
            let run = Arc::clone(&run);
            move || run()
        });

        // Run immediately within the observer context to track dependencies
        runtime.track(id, || effect());

        Self {
            id,
            runtime: Arc::downgrade(&runtime),
            run,
        }
    }

    /// Manually trigger the effect.
    pub fn run(&self) {
        (self.run)();
    }

    pub fn id(&self) -> usize {
        self.id
    }
}

impl Drop for Effect {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.upgrade() {
            runtime.remove_observer(self.id);
        }
    }
}

/// Create a new effect that runs when dependencies change.
///
/// The effect runs immediately and then again whenever any signal
/// it reads changes.
///
/// # Example
///
/// ```
/// use stately::{create_effect, create_signal};
///
/// let (count, set_count) = create_signal(0);
///
/// let _effect = create_effect(move || {
///     println!("Count is: {}", count.get());
/// });
/// set_count.set(1);
/// ```
pub fn create_effect<F>(effect: F) -> Effect
where
    F: Fn() + Send + Sync + 'static,
{
    Effect::new(effect)
}
