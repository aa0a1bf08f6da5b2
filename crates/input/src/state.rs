use crate::action::{Action, Binding, MoveDirection};
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Keys the application reacts to. Platform key codes are mapped onto these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    W,
    A,
    S,
    D,
    Q,
    E,
    F1,
    F2,
    Escape,
}

/// Key to binding table.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyBindings {
    map: HashMap<Key, Binding>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        let map = HashMap::from([
            (Key::W, Binding::Move(MoveDirection::Forward)),
            (Key::S, Binding::Move(MoveDirection::Backward)),
            (Key::A, Binding::Move(MoveDirection::Left)),
            (Key::D, Binding::Move(MoveDirection::Right)),
            (Key::E, Binding::Move(MoveDirection::Up)),
            (Key::Q, Binding::Move(MoveDirection::Down)),
            (Key::F1, Binding::Action(Action::ToggleInspector)),
            (Key::F2, Binding::Action(Action::ToggleWireframe)),
            (Key::Escape, Binding::Action(Action::Quit)),
        ]);
        Self { map }
    }
}

impl KeyBindings {
    pub fn get(&self, key: Key) -> Option<Binding> {
        self.map.get(&key).copied()
    }

    /// Rebind `key`, returning its previous binding.
    pub fn bind(&mut self, key: Key, binding: Binding) -> Option<Binding> {
        self.map.insert(key, binding)
    }

    pub fn unbind(&mut self, key: Key) -> Option<Binding> {
        self.map.remove(&key)
    }
}

/// Per-frame camera controls: held movement flags plus accumulated mouse-look.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CameraInput {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    /// Pixels moved while look was active.
    pub look_delta: Vec2,
}

impl CameraInput {
    pub fn is_idle(&self) -> bool {
        !(self.forward || self.backward || self.left || self.right || self.up || self.down)
            && self.look_delta == Vec2::ZERO
    }
}

/// Raw key and mouse state collected between frames.
#[derive(Debug, Default)]
pub struct InputState {
    bindings: KeyBindings,
    held: HashSet<Key>,
    look_active: bool,
    look_delta: Vec2,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bindings(bindings: KeyBindings) -> Self {
        Self {
            bindings,
            ..Self::default()
        }
    }

    pub fn bindings(&self) -> &KeyBindings {
        &self.bindings
    }

    /// Record a key transition. Returns the bound action on the press edge.
    pub fn key_event(&mut self, key: Key, pressed: bool) -> Option<Action> {
        let newly_pressed = if pressed {
            self.held.insert(key)
        } else {
            self.held.remove(&key);
            false
        };
        match self.bindings.get(key) {
            Some(Binding::Action(action)) if newly_pressed => {
                tracing::debug!(?key, ?action, "action triggered");
                Some(action)
            }
            _ => None,
        }
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    /// Enable or disable mouse-look. Disabling drops any pending delta.
    pub fn set_look_active(&mut self, active: bool) {
        self.look_active = active;
        if !active {
            self.look_delta = Vec2::ZERO;
        }
    }

    pub fn look_active(&self) -> bool {
        self.look_active
    }

    /// Accumulate raw mouse motion. Ignored unless look is active.
    pub fn mouse_motion(&mut self, dx: f32, dy: f32) {
        if self.look_active {
            self.look_delta += Vec2::new(dx, dy);
        }
    }

    /// Release every held key, e.g. when the window loses focus.
    pub fn clear(&mut self) {
        self.held.clear();
        self.look_active = false;
        self.look_delta = Vec2::ZERO;
    }

    /// Snapshot held movement and drain the accumulated look delta.
    pub fn take_camera_input(&mut self) -> CameraInput {
        let mut input = CameraInput {
            look_delta: std::mem::take(&mut self.look_delta),
            ..CameraInput::default()
        };
        for key in &self.held {
            if let Some(Binding::Move(direction)) = self.bindings.get(*key) {
                match direction {
                    MoveDirection::Forward => input.forward = true,
                    MoveDirection::Backward => input.backward = true,
                    MoveDirection::Left => input.left = true,
                    MoveDirection::Right => input.right = true,
                    MoveDirection::Up => input.up = true,
                    MoveDirection::Down => input.down = true,
                }
            }
        }
        input
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn held_keys_map_to_movement() {
        let mut input = InputState::new();
        input.key_event(Key::W, true);
        input.key_event(Key::E, true);
        let camera = input.take_camera_input();
        assert!(camera.forward);
        assert!(camera.up);
        assert!(!camera.backward);
        assert!(!camera.down);
    }

    #[test]
    fn released_keys_stop_movement() {
        let mut input = InputState::new();
        input.key_event(Key::A, true);
        input.key_event(Key::A, false);
        assert!(input.take_camera_input().is_idle());
    }

    #[test]
    fn actions_fire_on_press_edge_only() {
        let mut input = InputState::new();
        assert_eq!(input.key_event(Key::F2, true), Some(Action::ToggleWireframe));
        // key repeat while held
        assert_eq!(input.key_event(Key::F2, true), None);
        assert_eq!(input.key_event(Key::F2, false), None);
        assert_eq!(input.key_event(Key::F2, true), Some(Action::ToggleWireframe));
    }

    #[test]
    fn movement_keys_raise_no_action() {
        let mut input = InputState::new();
        assert_eq!(input.key_event(Key::W, true), None);
    }

    #[test]
    fn mouse_motion_requires_look() {
        let mut input = InputState::new();
        input.mouse_motion(5.0, 5.0);
        assert_eq!(input.take_camera_input().look_delta, Vec2::ZERO);

        input.set_look_active(true);
        input.mouse_motion(3.0, -1.0);
        input.mouse_motion(2.0, 4.0);
        assert_eq!(input.take_camera_input().look_delta, Vec2::new(5.0, 3.0));
        // drained
        assert_eq!(input.take_camera_input().look_delta, Vec2::ZERO);
    }

    #[test]
    fn rebinding_changes_mapping() {
        let mut bindings = KeyBindings::default();
        bindings.bind(Key::Q, Binding::Move(MoveDirection::Up));
        let mut input = InputState::with_bindings(bindings);
        input.key_event(Key::Q, true);
        let camera = input.take_camera_input();
        assert!(camera.up);
        assert!(!camera.down);
    }

    #[test]
    fn clear_releases_everything() {
        let mut input = InputState::new();
        input.key_event(Key::D, true);
        input.set_look_active(true);
        input.mouse_motion(1.0, 1.0);
        input.clear();
        assert!(!input.is_held(Key::D));
        assert!(!input.look_active());
        assert!(input.take_camera_input().is_idle());
    }
}
