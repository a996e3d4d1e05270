//! Executes console commands against panel state.
//!
//! This runs on the event-loop thread after lines are received from the
//! stdin thread. Printing happens here; state changes are handed back as
//! [`ConsoleAction`]s for the shell to apply, so the coordinator stays the
//! single writer of pose state.

use crate::panel::camera::{Axis, CameraPose, PoseField};

/// A state change requested by a console command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConsoleAction {
    /// Edit one pose field; goes through the coordinator's per-field
    /// debounce, like a numeric input box would.
    EditField { field: PoseField, value: f64 },
    /// Change the per-press step unit.
    SetStep(f64),
    /// Close the panel.
    Quit,
}

pub struct ConsoleBackend;

impl ConsoleBackend {
    pub fn new() -> Self {
        Self
    }

    /// Execute a single console line.
    ///
    /// Malformed input prints a hint and produces no action.
    pub fn exec(&mut self, pose: &CameraPose, step: f64, line: &str) -> Option<ConsoleAction> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let mut it = line.split_whitespace();
        let verb = it.next()?;

        match verb {
            "help" => {
                println!("commands:");
                println!("  eye x|y|z <value>    set an eye coordinate");
                println!("  look x|y|z <value>   set a look-at coordinate");
                println!("  step <value>         set the per-press step unit");
                println!("  pose                 print the current pose");
                println!("  quit                 close the panel");
                None
            }
            "pose" => {
                println!("eye     ({:.3}, {:.3}, {:.3})", pose.eye.x, pose.eye.y, pose.eye.z);
                println!(
                    "look-at ({:.3}, {:.3}, {:.3})",
                    pose.look_at.x, pose.look_at.y, pose.look_at.z
                );
                println!("step    {step:.3}");
                None
            }
            "step" => match it.next().and_then(|v| v.parse::<f64>().ok()) {
                Some(value) if value.is_finite() => Some(ConsoleAction::SetStep(value)),
                _ => {
                    println!("usage: step <value>");
                    None
                }
            },
            "eye" | "look" => {
                let axis = it.next().and_then(parse_axis);
                let value = it.next().and_then(|v| v.parse::<f64>().ok());
                match (axis, value) {
                    (Some(axis), Some(value)) if value.is_finite() => {
                        let field = if verb == "eye" {
                            PoseField::Eye(axis)
                        } else {
                            PoseField::LookAt(axis)
                        };
                        Some(ConsoleAction::EditField { field, value })
                    }
                    _ => {
                        println!("usage: {verb} x|y|z <value>");
                        None
                    }
                }
            }
            "quit" | "exit" => Some(ConsoleAction::Quit),
            _ => {
                println!("unknown command: {verb} (try 'help')");
                None
            }
        }
    }
}

fn parse_axis(s: &str) -> Option<Axis> {
    match s {
        "x" => Some(Axis::X),
        "y" => Some(Axis::Y),
        "z" => Some(Axis::Z),
        _ => None,
    }
}
