// Input state tracking for keyboard, pointer, touch and the on-screen pad
// Folds winit events into a queryable per-frame snapshot

use glam::Vec2;
use winit::event::{ElementState, MouseButton, TouchPhase, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use super::picking::cursor_to_ndc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

    fn from_key(key: KeyCode) -> Option<Self> {
        match key {
            KeyCode::KeyW | KeyCode::ArrowUp => Some(Direction::Up),
            KeyCode::KeyS | KeyCode::ArrowDown => Some(Direction::Down),
            KeyCode::KeyA | KeyCode::ArrowLeft => Some(Direction::Left),
            KeyCode::KeyD | KeyCode::ArrowRight => Some(Direction::Right),
            _ => None,
        }
    }
}

/// Four independent held flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirectionFlags {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl DirectionFlags {
    pub fn get(&self, dir: Direction) -> bool {
        match dir {
            Direction::Up => self.up,
            Direction::Down => self.down,
            Direction::Left => self.left,
            Direction::Right => self.right,
        }
    }

    pub fn set(&mut self, dir: Direction, held: bool) {
        match dir {
            Direction::Up => self.up = held,
            Direction::Down => self.down = held,
            Direction::Left => self.left = held,
            Direction::Right => self.right = held,
        }
    }

    pub fn any(&self) -> bool {
        self.up || self.down || self.left || self.right
    }
}

/// A gesture that asks the picker to resolve what is under the pointer or gaze.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    /// Desktop click at a pointer position (NDC).
    Click(Vec2),
    /// Finger lifted at a position (NDC).
    TouchEnd(Vec2),
    /// Headset select action; resolves along the view centre.
    Select,
}

pub struct InputState {
    directions: DirectionFlags,
    /// Last pad state reported by the UI, for edge detection.
    pad: DirectionFlags,

    respawn_requested: bool,
    gestures: Vec<Gesture>,
    /// A touch-end already fired for the gesture the next click belongs to.
    touch_happened: bool,

    // Mouse
    pub mouse_position: (f32, f32),
    mouse_prev_position: (f32, f32),
    pub mouse_delta: (f32, f32),

    pub window_size: (u32, u32),
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}

impl InputState {
    pub fn new() -> Self {
        Self {
            directions: DirectionFlags::default(),
            pad: DirectionFlags::default(),
            respawn_requested: false,
            gestures: Vec::new(),
            touch_happened: false,
            mouse_position: (0.0, 0.0),
            mouse_prev_position: (0.0, 0.0),
            mouse_delta: (0.0, 0.0),
            window_size: (0, 0),
        }
    }

    /// Feed a winit WindowEvent into the input state.
    /// `ui_consumed` is true when the overlay already handled a pointer event.
    pub fn process_event(&mut self, event: &WindowEvent, ui_consumed: bool) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key {
                    self.key(key, event.state, event.repeat);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.mouse_position = (position.x as f32, position.y as f32);
                self.touch_happened = false;
            }
            WindowEvent::MouseInput {
                state: ElementState::Released,
                button: MouseButton::Left,
                ..
            } if !ui_consumed => self.click(),
            WindowEvent::Touch(touch) if touch.phase == TouchPhase::Ended && !ui_consumed => {
                self.mouse_position = (touch.location.x as f32, touch.location.y as f32);
                self.touch_end();
            }
            WindowEvent::Focused(false) => self.clear_directions(),
            WindowEvent::Resized(size) => {
                self.window_size = (size.width, size.height);
            }
            _ => {}
        }
    }

    fn key(&mut self, key: KeyCode, state: ElementState, repeat: bool) {
        let pressed = state == ElementState::Pressed;
        if let Some(dir) = Direction::from_key(key) {
            self.directions.set(dir, pressed);
            return;
        }
        match key {
            KeyCode::KeyR if pressed && !repeat => self.respawn_requested = true,
            KeyCode::Space if pressed && !repeat => self.select(),
            _ => {}
        }
    }

    pub fn press(&mut self, dir: Direction) {
        self.directions.set(dir, true);
    }

    pub fn release(&mut self, dir: Direction) {
        self.directions.set(dir, false);
    }

    /// Apply the on-screen pad's held state, pressing and releasing only on change.
    pub fn apply_pad(&mut self, held: DirectionFlags) {
        for dir in Direction::ALL {
            match (self.pad.get(dir), held.get(dir)) {
                (false, true) => self.press(dir),
                (true, false) => self.release(dir),
                _ => {}
            }
        }
        self.pad = held;
    }

    /// Window lost focus: no key-up will arrive, so nothing may stay held.
    pub fn clear_directions(&mut self) {
        self.directions = DirectionFlags::default();
        self.pad = DirectionFlags::default();
    }

    pub fn directions(&self) -> DirectionFlags {
        self.directions
    }

    pub fn pointer_ndc(&self) -> Vec2 {
        cursor_to_ndc(self.mouse_position, self.window_size)
    }

    pub fn click(&mut self) {
        if self.touch_happened {
            // The touch-end already resolved this gesture.
            self.touch_happened = false;
            return;
        }
        self.gestures.push(Gesture::Click(self.pointer_ndc()));
    }

    pub fn touch_end(&mut self) {
        self.touch_happened = true;
        self.gestures.push(Gesture::TouchEnd(self.pointer_ndc()));
    }

    /// Headset controller select.
    pub fn select(&mut self) {
        self.gestures.push(Gesture::Select);
    }

    pub fn request_respawn(&mut self) {
        self.respawn_requested = true;
    }

    pub fn take_respawn_request(&mut self) -> bool {
        std::mem::take(&mut self.respawn_requested)
    }

    pub fn take_gestures(&mut self) -> Vec<Gesture> {
        std::mem::take(&mut self.gestures)
    }

    /// Call once per frame after update() and render() have consumed input.
    pub fn end_frame(&mut self) {
        self.mouse_delta = (
            self.mouse_position.0 - self.mouse_prev_position.0,
            self.mouse_position.1 - self.mouse_prev_position.1,
        );
        self.mouse_prev_position = self.mouse_position;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn focus_loss_clears_every_flag() {
        let mut input = InputState::new();
        input.key(KeyCode::KeyW, ElementState::Pressed, false);
        input.key(KeyCode::ArrowRight, ElementState::Pressed, false);
        input.apply_pad(DirectionFlags { left: true, ..Default::default() });
        assert!(input.directions().any());

        input.process_event(&WindowEvent::Focused(false), false);
        assert_eq!(input.directions(), DirectionFlags::default());
    }

    #[test]
    fn keys_and_arrows_share_flags() {
        let mut input = InputState::new();
        input.key(KeyCode::ArrowUp, ElementState::Pressed, false);
        assert!(input.directions().up);
        input.key(KeyCode::KeyW, ElementState::Released, false);
        assert!(!input.directions().up);
    }

    #[test]
    fn pad_only_acts_on_edges() {
        let mut input = InputState::new();
        input.key(KeyCode::KeyA, ElementState::Pressed, false);
        // Pad reports left released but it was never pressed: keyboard hold survives.
        input.apply_pad(DirectionFlags::default());
        assert!(input.directions().left);

        input.apply_pad(DirectionFlags { down: true, ..Default::default() });
        assert!(input.directions().down);
        input.apply_pad(DirectionFlags::default());
        assert!(!input.directions().down);
    }

    #[test]
    fn touch_end_swallows_the_following_click() {
        let mut input = InputState::new();
        input.window_size = (100, 100);
        input.mouse_position = (50.0, 50.0);

        input.touch_end();
        input.click();
        assert_eq!(input.take_gestures(), vec![Gesture::TouchEnd(Vec2::ZERO)]);

        input.click();
        assert_eq!(input.take_gestures(), vec![Gesture::Click(Vec2::ZERO)]);
    }

    #[test]
    fn respawn_request_is_taken_once() {
        let mut input = InputState::new();
        input.key(KeyCode::KeyR, ElementState::Pressed, false);
        input.key(KeyCode::KeyR, ElementState::Pressed, true);
        assert!(input.take_respawn_request());
        assert!(!input.take_respawn_request());
    }
}
