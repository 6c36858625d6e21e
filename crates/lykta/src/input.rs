//! Keyboard and pointer input state.
//!
//! [`InputState`] is written by the host's event handler and read by camera
//! controllers during the frame loop. Pointer motion accumulates between
//! ticks: controllers drain it with [`take_drag`](InputState::take_drag) and
//! [`take_wheel`](InputState::take_wheel), so several motion events that
//! arrive before one frame still add up to the full gesture.

use std::collections::HashSet;
use std::hash::Hash;

pub use winit::event::MouseButton;
pub use winit::keyboard::KeyCode;

use crate::math::Vec2;

/// Tracks the state of a set of inputs (keys or mouse buttons).
///
/// - `pressed`: currently held down
/// - `just_pressed`: pressed since the last frame
/// - `just_released`: released since the last frame
#[derive(Debug, Clone)]
pub struct Input<T: Eq + Hash + Copy> {
    pressed: HashSet<T>,
    just_pressed: HashSet<T>,
    just_released: HashSet<T>,
}

impl<T: Eq + Hash + Copy> Input<T> {
    pub fn new() -> Self {
        Self {
            pressed: HashSet::new(),
            just_pressed: HashSet::new(),
            just_released: HashSet::new(),
        }
    }

    pub fn pressed(&self, input: T) -> bool {
        self.pressed.contains(&input)
    }

    pub fn just_pressed(&self, input: T) -> bool {
        self.just_pressed.contains(&input)
    }

    pub fn just_released(&self, input: T) -> bool {
        self.just_released.contains(&input)
    }

    pub fn press(&mut self, input: T) {
        if self.pressed.insert(input) {
            self.just_pressed.insert(input);
        }
    }

    pub fn release(&mut self, input: T) {
        if self.pressed.remove(&input) {
            self.just_released.insert(input);
        }
    }

    fn clear_just(&mut self) {
        self.just_pressed.clear();
        self.just_released.clear();
    }
}

impl<T: Eq + Hash + Copy> Default for Input<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything a controller can read about the user's input.
#[derive(Debug, Clone)]
pub struct InputState {
    pub keys: Input<KeyCode>,
    pub mouse: Input<MouseButton>,
    cursor_px: Option<Vec2>,
    viewport: (u32, u32),
    drag: Vec2,
    wheel: f32,
}

impl InputState {
    /// `viewport` is the logical surface size used to normalize the cursor.
    pub fn new(viewport: (u32, u32)) -> Self {
        Self {
            keys: Input::new(),
            mouse: Input::new(),
            cursor_px: None,
            viewport,
            drag: Vec2::ZERO,
            wheel: 0.0,
        }
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport = (width, height);
    }

    /// Record a cursor position in logical pixels. While the primary button
    /// is held the motion also accumulates as drag.
    pub fn cursor_moved(&mut self, x: f32, y: f32) {
        let position = Vec2::new(x, y);
        if let Some(previous) = self.cursor_px
            && self.mouse.pressed(MouseButton::Left)
        {
            self.drag += position - previous;
        }
        self.cursor_px = Some(position);
    }

    pub fn cursor_left(&mut self) {
        self.cursor_px = None;
    }

    /// Cursor position in window pixels, if the cursor is over the window.
    pub fn cursor_px(&self) -> Option<Vec2> {
        self.cursor_px
    }

    /// Cursor position normalized to `-0.5..0.5` on both axes, with +Y up.
    /// The center of the viewport (or a cursor outside it) is `(0, 0)`.
    pub fn cursor(&self) -> Vec2 {
        let (w, h) = self.viewport;
        match self.cursor_px {
            Some(p) if w > 0 && h > 0 => Vec2::new(p.x / w as f32 - 0.5, -(p.y / h as f32 - 0.5)),
            _ => Vec2::ZERO,
        }
    }

    /// Add a pointer drag directly, in pixels. Hosts that track drag
    /// themselves, and tests, use this.
    pub fn add_drag(&mut self, dx: f32, dy: f32) {
        self.drag += Vec2::new(dx, dy);
    }

    /// Add scroll, in lines. Positive scrolls away from the user.
    pub fn add_wheel(&mut self, lines: f32) {
        self.wheel += lines;
    }

    /// Drag accumulated since the last call.
    pub fn take_drag(&mut self) -> Vec2 {
        std::mem::take(&mut self.drag)
    }

    /// Scroll accumulated since the last call.
    pub fn take_wheel(&mut self) -> f32 {
        std::mem::take(&mut self.wheel)
    }

    /// Clear per-frame key and button edges. Called by the frame loop once
    /// controllers have run.
    pub fn end_frame(&mut self) {
        self.keys.clear_just();
        self.mouse.clear_just();
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::new((1, 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_and_release_edges() {
        let mut keys = Input::new();
        keys.press(KeyCode::KeyF);
        assert!(keys.pressed(KeyCode::KeyF));
        assert!(keys.just_pressed(KeyCode::KeyF));
        keys.clear_just();
        assert!(!keys.just_pressed(KeyCode::KeyF));
        keys.release(KeyCode::KeyF);
        assert!(keys.just_released(KeyCode::KeyF));
        assert!(!keys.pressed(KeyCode::KeyF));
    }

    #[test]
    fn cursor_normalizes_with_y_up() {
        let mut input = InputState::new((800, 600));
        input.cursor_moved(800.0, 0.0);
        assert_eq!(input.cursor(), Vec2::new(0.5, 0.5));
        input.cursor_moved(400.0, 450.0);
        assert_eq!(input.cursor(), Vec2::new(0.0, -0.25));
    }

    #[test]
    fn drag_only_while_button_held() {
        let mut input = InputState::new((800, 600));
        input.cursor_moved(10.0, 10.0);
        input.cursor_moved(20.0, 10.0);
        assert_eq!(input.take_drag(), Vec2::ZERO);

        input.mouse.press(MouseButton::Left);
        input.cursor_moved(30.0, 15.0);
        input.cursor_moved(50.0, 15.0);
        assert_eq!(input.take_drag(), Vec2::new(30.0, 5.0));
        assert_eq!(input.take_drag(), Vec2::ZERO);
    }

    #[test]
    fn wheel_accumulates_until_taken() {
        let mut input = InputState::default();
        input.add_wheel(1.0);
        input.add_wheel(2.0);
        assert_eq!(input.take_wheel(), 3.0);
        assert_eq!(input.take_wheel(), 0.0);
    }
}
