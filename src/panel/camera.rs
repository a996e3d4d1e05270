//! Camera pose state: the eye position and look-at point steered by the user.
//!
//! The pose is plain data. All mutation goes through [`CameraPose::set`] and
//! [`CameraPose::nudge`] so the coordinator stays the single writer.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// The virtual camera: where it sits and what it points at.
///
/// This is the last locally-applied pose, not necessarily the last pose the
/// render service acknowledged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub eye: Vec3,
    pub look_at: Vec3,
}

impl Default for CameraPose {
    fn default() -> Self {
        Self {
            eye: Vec3::new(-1.4, 0.3, 7.0),
            look_at: Vec3::new(-0.5, 0.7, -12.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// One editable scalar of the pose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoseField {
    Eye(Axis),
    LookAt(Axis),
}

/// A steering impulse: which field a key moves, and in which direction.
/// The magnitude comes from the coordinator's step unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Steer {
    pub field: PoseField,
    pub sign: f64,
}

impl CameraPose {
    pub fn get(&self, field: PoseField) -> f64 {
        match field {
            PoseField::Eye(axis) => axis_of(&self.eye, axis),
            PoseField::LookAt(axis) => axis_of(&self.look_at, axis),
        }
    }

    pub fn set(&mut self, field: PoseField, value: f64) {
        match field {
            PoseField::Eye(axis) => *axis_of_mut(&mut self.eye, axis) = value,
            PoseField::LookAt(axis) => *axis_of_mut(&mut self.look_at, axis) = value,
        }
    }

    pub fn nudge(&mut self, field: PoseField, amount: f64) {
        let value = self.get(field) + amount;
        self.set(field, value);
    }
}

fn axis_of(v: &Vec3, axis: Axis) -> f64 {
    match axis {
        Axis::X => v.x,
        Axis::Y => v.y,
        Axis::Z => v.z,
    }
}

fn axis_of_mut(v: &mut Vec3, axis: Axis) -> &mut f64 {
    match axis {
        Axis::X => &mut v.x,
        Axis::Y => &mut v.y,
        Axis::Z => &mut v.z,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_pose_matches_service_scene() {
        let pose = CameraPose::default();
        assert_eq!(pose.eye, Vec3::new(-1.4, 0.3, 7.0));
        assert_eq!(pose.look_at, Vec3::new(-0.5, 0.7, -12.0));
    }

    #[test]
    fn set_touches_only_the_named_field() {
        let mut pose = CameraPose::default();
        pose.set(PoseField::Eye(Axis::X), 3.5);

        assert_eq!(pose.eye.x, 3.5);
        assert_eq!(pose.eye.y, 0.3);
        assert_eq!(pose.eye.z, 7.0);
        assert_eq!(pose.look_at, CameraPose::default().look_at);
    }

    #[test]
    fn nudge_accumulates() {
        let mut pose = CameraPose::default();
        pose.nudge(PoseField::LookAt(Axis::Z), 0.5);
        pose.nudge(PoseField::LookAt(Axis::Z), 0.5);

        assert_eq!(pose.get(PoseField::LookAt(Axis::Z)), -11.0);
    }
}
