//! Input snapshot delivered to input layers
//!
//! The platform host owns the event loop. It feeds key and mouse changes into
//! an [`InputState`], which the engine hands to every input receiver once per
//! frame.

use std::collections::HashSet;

use glam::Vec2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

#[derive(Clone, Debug, Default)]
pub struct InputState {
    keys: HashSet<String>,
    previous_keys: HashSet<String>,
    buttons: HashSet<MouseButton>,
    mouse_position: Vec2,
    mouse_delta: Vec2,
    scroll: f32,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, key: impl Into<String>) {
        self.keys.insert(key.into());
    }

    pub fn release(&mut self, key: &str) {
        self.keys.remove(key);
    }

    pub fn is_down(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    /// Down this frame, up the previous one
    pub fn just_pressed(&self, key: &str) -> bool {
        self.keys.contains(key) && !self.previous_keys.contains(key)
    }

    pub fn set_button(&mut self, button: MouseButton, down: bool) {
        if down {
            self.buttons.insert(button);
        } else {
            self.buttons.remove(&button);
        }
    }

    pub fn is_button_down(&self, button: MouseButton) -> bool {
        self.buttons.contains(&button)
    }

    pub fn move_mouse(&mut self, position: Vec2) {
        self.mouse_delta += position - self.mouse_position;
        self.mouse_position = position;
    }

    pub fn mouse_position(&self) -> Vec2 {
        self.mouse_position
    }

    pub fn mouse_delta(&self) -> Vec2 {
        self.mouse_delta
    }

    pub fn scroll(&mut self, amount: f32) {
        self.scroll += amount;
    }

    pub fn scroll_delta(&self) -> f32 {
        self.scroll
    }

    /// Roll per-frame deltas over; called after input layers ran
    pub fn end_frame(&mut self) {
        self.previous_keys.clone_from(&self.keys);
        self.mouse_delta = Vec2::ZERO;
        self.scroll = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_just_pressed_lasts_one_frame() {
        let mut input = InputState::new();
        input.press("Space");
        assert!(input.just_pressed("Space"));
        input.end_frame();
        assert!(input.is_down("Space"));
        assert!(!input.just_pressed("Space"));
    }

    #[test]
    fn test_mouse_delta_resets() {
        let mut input = InputState::new();
        input.move_mouse(Vec2::new(10.0, 5.0));
        input.move_mouse(Vec2::new(12.0, 5.0));
        assert_eq!(input.mouse_delta(), Vec2::new(12.0, 5.0));
        input.end_frame();
        assert_eq!(input.mouse_delta(), Vec2::ZERO);
    }
}
