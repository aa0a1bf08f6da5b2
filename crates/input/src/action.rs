use serde::{Deserialize, Serialize};

/// A discrete command raised on a key press.
///
/// The application consumes actions, never raw key codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Show or hide the entity inspector.
    ToggleInspector,
    /// Switch between solid and wireframe rasterization.
    ToggleWireframe,
    /// Close the application.
    Quit,
}

/// One of the six camera translation axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveDirection {
    Forward,
    Backward,
    Left,
    Right,
    Up,
    Down,
}

/// What a key does when held or pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Binding {
    /// Held keys move the camera every frame.
    Move(MoveDirection),
    /// Fires once on press.
    Action(Action),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bindings_compare_by_value() {
        assert_eq!(
            Binding::Move(MoveDirection::Up),
            Binding::Move(MoveDirection::Up)
        );
        assert_ne!(
            Binding::Action(Action::Quit),
            Binding::Action(Action::ToggleWireframe)
        );
    }
}
