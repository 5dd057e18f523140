use std::collections::HashSet;

use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Tracks keyboard state across frames.
///
/// Both games act on edges: the cannon on key press, the maze on key
/// release. Edge sets hold only what happened since the last
/// [`begin_frame`](Self::begin_frame); `keys_down` holds what is held now.
#[derive(Debug, Default)]
pub struct Input {
    keys_down: HashSet<KeyCode>,
    keys_pressed: HashSet<KeyCode>,
    keys_released: HashSet<KeyCode>,
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call at the end of each frame to reset per-frame state.
    pub fn begin_frame(&mut self) {
        self.keys_pressed.clear();
        self.keys_released.clear();
    }

    /// Process a window event and update input state.
    pub fn handle_event(&mut self, event: &WindowEvent) {
        if let WindowEvent::KeyboardInput { event, .. } = event
            && let PhysicalKey::Code(key) = event.physical_key
        {
            self.handle_key(key, event.state);
        }
    }

    pub(crate) fn handle_key(&mut self, key: KeyCode, state: ElementState) {
        match state {
            ElementState::Pressed => {
                // Auto-repeat arrives as repeated presses while held.
                if self.keys_down.insert(key) {
                    self.keys_pressed.insert(key);
                }
            }
            ElementState::Released => {
                self.keys_down.remove(&key);
                self.keys_released.insert(key);
            }
        }
    }

    /// Returns true if the key is currently held down.
    pub fn key_down(&self, key: KeyCode) -> bool {
        self.keys_down.contains(&key)
    }

    /// Returns true if the key was pressed this frame.
    pub fn key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    /// Returns true if the key was released this frame.
    pub fn key_released(&self, key: KeyCode) -> bool {
        self.keys_released.contains(&key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_is_reported_once_while_held() {
        let mut input = Input::new();
        input.handle_key(KeyCode::KeyN, ElementState::Pressed);
        assert!(input.key_pressed(KeyCode::KeyN));
        assert!(input.key_down(KeyCode::KeyN));

        input.begin_frame();
        input.handle_key(KeyCode::KeyN, ElementState::Pressed);
        assert!(!input.key_pressed(KeyCode::KeyN));
        assert!(input.key_down(KeyCode::KeyN));
    }

    #[test]
    fn release_clears_down_and_is_reported_for_one_frame() {
        let mut input = Input::new();
        input.handle_key(KeyCode::KeyW, ElementState::Pressed);
        input.handle_key(KeyCode::KeyW, ElementState::Released);
        assert!(!input.key_down(KeyCode::KeyW));
        assert!(input.key_released(KeyCode::KeyW));

        input.begin_frame();
        assert!(!input.key_released(KeyCode::KeyW));
    }
}
