//! Desktop input: key and mouse state mapped to camera controls and actions.
//!
//! # Invariants
//! - Movement is level-triggered (held keys); actions are edge-triggered.
//! - Mouse motion only accumulates while look is active.

pub mod action;
mod state;

pub use action::{Action, Binding, MoveDirection};
pub use state::{CameraInput, InputState, Key, KeyBindings};

pub fn crate_info() -> &'static str {
    "prism-input v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("input"));
    }
}
