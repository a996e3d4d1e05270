//! Input handling (winit -> panel events).
//!
//! Keeps `Windowing` focused on window lifecycle while this module owns the
//! steering keymap. Key auto-repeat is passed through on purpose: holding a
//! key keeps steering, and the coordinator's throttle bounds the rate.

use winit::event::{ElementState, KeyEvent};
use winit::keyboard::{Key, NamedKey};

use crate::panel::camera::{Axis, PoseField, Steer};

/// What a keyboard event means to the panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// A steering key went down (or repeated).
    Steer(Steer),
    /// Some key (any key) was released: the interaction settled.
    Settle,
}

/// Maps one winit keyboard event onto the panel's vocabulary.
///
/// Releases always settle, even for keys outside the steering map; presses
/// of unmapped keys are ignored.
pub fn interpret(event: &KeyEvent) -> Option<InputEvent> {
    match event.state {
        ElementState::Released => Some(InputEvent::Settle),
        ElementState::Pressed => steer_for_key(&event.logical_key).map(InputEvent::Steer),
    }
}

/// The steering keymap, case-insensitive:
/// `w`/`s` eye Z, `a`/`d` eye X, `q`/`e` eye Y,
/// arrows look-at X/Z, `.`/`,` look-at Y.
fn steer_for_key(key: &Key) -> Option<Steer> {
    let steer = |field, sign| Some(Steer { field, sign });

    match key {
        Key::Named(NamedKey::ArrowUp) => steer(PoseField::LookAt(Axis::Z), 1.0),
        Key::Named(NamedKey::ArrowDown) => steer(PoseField::LookAt(Axis::Z), -1.0),
        Key::Named(NamedKey::ArrowLeft) => steer(PoseField::LookAt(Axis::X), -1.0),
        Key::Named(NamedKey::ArrowRight) => steer(PoseField::LookAt(Axis::X), 1.0),
        Key::Character(ch) => match ch.to_lowercase().as_str() {
            "w" => steer(PoseField::Eye(Axis::Z), 1.0),
            "s" => steer(PoseField::Eye(Axis::Z), -1.0),
            "a" => steer(PoseField::Eye(Axis::X), -1.0),
            "d" => steer(PoseField::Eye(Axis::X), 1.0),
            "q" => steer(PoseField::Eye(Axis::Y), -1.0),
            "e" => steer(PoseField::Eye(Axis::Y), 1.0),
            "." => steer(PoseField::LookAt(Axis::Y), 1.0),
            "," => steer(PoseField::LookAt(Axis::Y), -1.0),
            _ => None,
        },
        _ => None,
    }
}
