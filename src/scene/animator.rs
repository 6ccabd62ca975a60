use std::f32::consts::TAU;

use cgmath::{Euler, Point3, Quaternion, Rad, Vector3};

use crate::{data_structures::instance::Instance, scene::config::Role};

/// A solid that tumbles by a fixed amount around x and y every frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Spinner {
    pub role: Role,
    pub position: Point3<f32>,
    pub orientation: Euler<Rad<f32>>,
    pub delta: f32,
}

impl Spinner {
    pub fn new(role: Role, position: Point3<f32>, delta: f32) -> Self {
        Self {
            role,
            position,
            orientation: Euler::new(Rad(0.0), Rad(0.0), Rad(0.0)),
            delta,
        }
    }

    /// z is never touched and the angles are not wrapped.
    pub fn step(&mut self) {
        self.orientation.x.0 += self.delta;
        self.orientation.y.0 += self.delta;
    }

    pub fn rotation(&self) -> Quaternion<f32> {
        Quaternion::from(self.orientation)
    }

    pub fn instance(&self) -> Instance {
        Instance::from(Vector3::new(self.position.x, self.position.y, self.position.z))
            .with_rotation(self.rotation())
    }
}

/// Where the sun is `elapsed_ms` into the day.
///
/// y and z both follow `sin`, which tilts the orbit out of any axis plane.
pub fn orbit_position(elapsed_ms: f32, period_ms: f32, radius: f32) -> Point3<f32> {
    let angle = TAU * elapsed_ms / period_ms;
    let (sin, cos) = angle.sin_cos();
    Point3::new(radius * cos, radius * sin, radius * sin)
}

/// A body circling the origin once per `period_ms`.
#[derive(Clone, Debug, PartialEq)]
pub struct Orbit {
    pub radius: f32,
    pub period_ms: f32,
    pub position: Point3<f32>,
}

impl Orbit {
    pub fn new(radius: f32, period_ms: f32) -> Self {
        Self {
            radius,
            period_ms,
            position: orbit_position(0.0, period_ms, radius),
        }
    }

    /// Recompute the position from the total time since start.
    pub fn set_elapsed(&mut self, elapsed_ms: f32) {
        self.position = orbit_position(elapsed_ms, self.period_ms, self.radius);
    }
}
