use crate::signal::{ReadSignal, Signal, WriteSignal};

/// Setter for a boolean signal.
#[derive(Clone)]
pub struct Toggle {
    state: WriteSignal<bool>,
}

impl Toggle {
    /// Flip the value.
    pub fn toggle(&self) {
        self.state.update(|on| !on);
    }

    pub fn set(&self, on: bool) {
        self.state.set(on);
    }
}

pub fn create_toggle(initial: bool) -> (ReadSignal<bool>, Toggle) {
    let (state, write) = Signal::new(initial).split();
    (state, Toggle { state: write })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_flips() {
        let (on, toggle) = create_toggle(false);
        toggle.toggle();
        assert!(on.get());
        toggle.toggle();
        assert!(!on.get());
        toggle.set(true);
        assert!(on.get());
    }
}
