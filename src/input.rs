//! Input handling.
//!
//! Window events are first reduced to a small [`InputEvent`] vocabulary, then
//! [`Input`] turns them into [`InputAction`]s for the session and camera.
//!
//! Pointer mapping:
//!
//! - Left button / touch down: manual scatter press. Up, cursor leaving the
//!   window, or touch end/cancel: release.
//! - While gesture control is active the left button is free, so a left drag
//!   orbits the camera instead. A right drag always orbits.
//! - Wheel: zoom.
//!
//! Keys: `Space` holds scatter like the pointer, `R` retries detection, `M`
//! proceeds with manual controls, `Escape` quits.

use crate::mode::ManualSignal;
use glam::Vec2;
use std::collections::HashSet;
use winit::event::{ElementState, MouseButton as WinitMouseButton, MouseScrollDelta, TouchPhase, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl MouseButton {
    fn from_winit(button: WinitMouseButton) -> Option<Self> {
        match button {
            WinitMouseButton::Left => Some(MouseButton::Left),
            WinitMouseButton::Right => Some(MouseButton::Right),
            WinitMouseButton::Middle => Some(MouseButton::Middle),
            _ => None,
        }
    }
}

/// Keys the app responds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Space,
    R,
    M,
    Escape,
}

impl Key {
    fn from_winit(code: KeyCode) -> Option<Self> {
        match code {
            KeyCode::Space => Some(Key::Space),
            KeyCode::KeyR => Some(Key::R),
            KeyCode::KeyM => Some(Key::M),
            KeyCode::Escape => Some(Key::Escape),
            _ => None,
        }
    }
}

/// Touch lifecycle, without winit's force/id payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchStage {
    Start,
    Move,
    End,
}

/// Input events the app cares about.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    Button { button: MouseButton, pressed: bool },
    CursorMoved(Vec2),
    CursorLeft,
    Scroll(f32),
    Touch { stage: TouchStage, position: Vec2 },
    Key { key: Key, pressed: bool, repeat: bool },
}

impl InputEvent {
    /// Reduce a winit window event. `None` for events the app ignores.
    pub fn from_window_event(event: &WindowEvent) -> Option<Self> {
        match event {
            WindowEvent::MouseInput { state, button, .. } => Some(InputEvent::Button {
                button: MouseButton::from_winit(*button)?,
                pressed: *state == ElementState::Pressed,
            }),
            WindowEvent::CursorMoved { position, .. } => {
                Some(InputEvent::CursorMoved(Vec2::new(position.x as f32, position.y as f32)))
            }
            WindowEvent::CursorLeft { .. } => Some(InputEvent::CursorLeft),
            WindowEvent::MouseWheel { delta, .. } => Some(InputEvent::Scroll(match delta {
                MouseScrollDelta::LineDelta(_, y) => *y,
                MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 100.0,
            })),
            WindowEvent::Touch(touch) => Some(InputEvent::Touch {
                stage: match touch.phase {
                    TouchPhase::Started => TouchStage::Start,
                    TouchPhase::Moved => TouchStage::Move,
                    TouchPhase::Ended | TouchPhase::Cancelled => TouchStage::End,
                },
                position: Vec2::new(touch.location.x as f32, touch.location.y as f32),
            }),
            WindowEvent::KeyboardInput { event, .. } => {
                let PhysicalKey::Code(code) = event.physical_key else {
                    return None;
                };
                Some(InputEvent::Key {
                    key: Key::from_winit(code)?,
                    pressed: event.state == ElementState::Pressed,
                    repeat: event.repeat,
                })
            }
            _ => None,
        }
    }
}

/// What an input event asks for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputAction {
    Manual(ManualSignal),
    /// Orbit the camera by a pixel delta.
    Orbit(Vec2),
    /// Zoom by wheel steps; positive zooms in.
    Zoom(f32),
    Retry,
    Dismiss,
    Quit,
}

/// What is holding a manual scatter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Hold {
    /// Left button or touch.
    Pointer,
    /// Space bar.
    Key,
}

/// Pointer and key state between events.
#[derive(Debug, Default)]
pub struct Input {
    /// Buttons currently dragging the camera.
    dragging: HashSet<MouseButton>,
    /// Scatter stays pressed until every hold ends.
    holds: HashSet<Hold>,
    last_position: Option<Vec2>,
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a manual scatter hold is in progress.
    pub fn is_holding(&self) -> bool {
        !self.holds.is_empty()
    }

    /// Process one event. `gesture_active` frees the left button for
    /// camera drags.
    pub fn handle(&mut self, event: InputEvent, gesture_active: bool) -> Option<InputAction> {
        match event {
            InputEvent::Button { button, pressed: true } => {
                if button == MouseButton::Left && !gesture_active {
                    return self.press(Hold::Pointer);
                }
                self.dragging.insert(button);
                None
            }
            InputEvent::Button { button, pressed: false } => {
                let was_dragging = self.dragging.remove(&button);
                if button == MouseButton::Left && !was_dragging {
                    return self.release(Hold::Pointer);
                }
                None
            }
            InputEvent::CursorMoved(position) => {
                let delta = self.last_position.map(|last| position - last);
                self.last_position = Some(position);
                match delta {
                    Some(delta) if self.is_orbiting() => Some(InputAction::Orbit(delta)),
                    _ => None,
                }
            }
            InputEvent::CursorLeft => {
                self.dragging.clear();
                self.last_position = None;
                self.release(Hold::Pointer)
            }
            InputEvent::Scroll(steps) => Some(InputAction::Zoom(steps)),
            InputEvent::Touch { stage, position } => match stage {
                TouchStage::Start => {
                    self.last_position = Some(position);
                    self.press(Hold::Pointer)
                }
                TouchStage::Move => {
                    let delta = self.last_position.map(|last| position - last);
                    self.last_position = Some(position);
                    match delta {
                        Some(delta) if gesture_active => Some(InputAction::Orbit(delta)),
                        _ => None,
                    }
                }
                TouchStage::End => {
                    self.last_position = None;
                    self.release(Hold::Pointer)
                }
            },
            InputEvent::Key { key, pressed, repeat } => {
                if repeat {
                    return None;
                }
                match (key, pressed) {
                    (Key::Space, true) => self.press(Hold::Key),
                    (Key::Space, false) => self.release(Hold::Key),
                    (Key::R, true) => Some(InputAction::Retry),
                    (Key::M, true) => Some(InputAction::Dismiss),
                    (Key::Escape, true) => Some(InputAction::Quit),
                    _ => None,
                }
            }
        }
    }

    fn is_orbiting(&self) -> bool {
        !self.dragging.is_empty()
    }

    fn press(&mut self, hold: Hold) -> Option<InputAction> {
        let was_holding = self.is_holding();
        self.holds.insert(hold);
        if was_holding {
            return None;
        }
        Some(InputAction::Manual(ManualSignal::Press))
    }

    fn release(&mut self, hold: Hold) -> Option<InputAction> {
        if !self.holds.remove(&hold) || self.is_holding() {
            return None;
        }
        Some(InputAction::Manual(ManualSignal::Release))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn button(button: MouseButton, pressed: bool) -> InputEvent {
        InputEvent::Button { button, pressed }
    }

    #[test]
    fn test_left_button_holds_scatter() {
        let mut input = Input::new();
        assert_eq!(
            input.handle(button(MouseButton::Left, true), false),
            Some(InputAction::Manual(ManualSignal::Press))
        );
        assert!(input.is_holding());
        assert_eq!(
            input.handle(button(MouseButton::Left, false), false),
            Some(InputAction::Manual(ManualSignal::Release))
        );
        assert!(!input.is_holding());
    }

    #[test]
    fn test_cursor_leaving_releases() {
        let mut input = Input::new();
        input.handle(button(MouseButton::Left, true), false);
        assert_eq!(
            input.handle(InputEvent::CursorLeft, false),
            Some(InputAction::Manual(ManualSignal::Release))
        );
        // Nothing left to release.
        assert_eq!(input.handle(button(MouseButton::Left, false), false), None);
    }

    #[test]
    fn test_touch_holds_scatter() {
        let mut input = Input::new();
        let at = Vec2::new(10.0, 10.0);
        assert_eq!(
            input.handle(InputEvent::Touch { stage: TouchStage::Start, position: at }, false),
            Some(InputAction::Manual(ManualSignal::Press))
        );
        assert_eq!(
            input.handle(InputEvent::Touch { stage: TouchStage::End, position: at }, false),
            Some(InputAction::Manual(ManualSignal::Release))
        );
    }

    #[test]
    fn test_left_drag_orbits_in_gesture_mode() {
        let mut input = Input::new();
        input.handle(InputEvent::CursorMoved(Vec2::new(100.0, 100.0)), true);
        assert_eq!(input.handle(button(MouseButton::Left, true), true), None);
        assert_eq!(
            input.handle(InputEvent::CursorMoved(Vec2::new(110.0, 95.0)), true),
            Some(InputAction::Orbit(Vec2::new(10.0, -5.0)))
        );
        assert_eq!(input.handle(button(MouseButton::Left, false), true), None);
        assert!(!input.is_holding());
    }

    #[test]
    fn test_right_drag_always_orbits() {
        let mut input = Input::new();
        input.handle(InputEvent::CursorMoved(Vec2::ZERO), false);
        input.handle(button(MouseButton::Right, true), false);
        assert_eq!(
            input.handle(InputEvent::CursorMoved(Vec2::new(3.0, 4.0)), false),
            Some(InputAction::Orbit(Vec2::new(3.0, 4.0)))
        );
        input.handle(button(MouseButton::Right, false), false);
        assert_eq!(input.handle(InputEvent::CursorMoved(Vec2::new(5.0, 5.0)), false), None);
    }

    #[test]
    fn test_keys() {
        let mut input = Input::new();
        let key = |key, pressed, repeat| InputEvent::Key { key, pressed, repeat };
        assert_eq!(
            input.handle(key(Key::Space, true, false), false),
            Some(InputAction::Manual(ManualSignal::Press))
        );
        assert_eq!(input.handle(key(Key::Space, true, true), false), None);
        assert_eq!(
            input.handle(key(Key::Space, false, false), false),
            Some(InputAction::Manual(ManualSignal::Release))
        );
        assert_eq!(input.handle(key(Key::R, true, false), false), Some(InputAction::Retry));
        assert_eq!(input.handle(key(Key::M, true, false), false), Some(InputAction::Dismiss));
        assert_eq!(input.handle(key(Key::Escape, true, false), false), Some(InputAction::Quit));
        assert_eq!(input.handle(key(Key::R, false, false), false), None);
    }

    #[test]
    fn test_pointer_and_key_holds_are_independent() {
        let mut input = Input::new();
        let space = |pressed| InputEvent::Key { key: Key::Space, pressed, repeat: false };

        assert_eq!(input.handle(space(true), false), Some(InputAction::Manual(ManualSignal::Press)));
        assert_eq!(input.handle(button(MouseButton::Left, true), false), None);
        // The pointer leaving does not end the space bar's hold.
        assert_eq!(input.handle(InputEvent::CursorLeft, false), None);
        assert!(input.is_holding());
        assert_eq!(input.handle(space(false), false), Some(InputAction::Manual(ManualSignal::Release)));

        input.handle(button(MouseButton::Left, true), false);
        input.handle(space(true), false);
        assert_eq!(input.handle(space(false), false), None);
        assert!(input.is_holding());
        assert_eq!(
            input.handle(button(MouseButton::Left, false), false),
            Some(InputAction::Manual(ManualSignal::Release))
        );
        assert!(!input.is_holding());
    }

    #[test]
    fn test_scroll_zooms() {
        let mut input = Input::new();
        assert_eq!(input.handle(InputEvent::Scroll(1.5), false), Some(InputAction::Zoom(1.5)));
    }
}
