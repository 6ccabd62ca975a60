//! Camera, projection, orbit controls and pointer rays.
//!
//! The camera always looks at a target point. [`OrbitController`] moves the
//! camera on a sphere around that target (rotate, pan, zoom) and eases every
//! input out over several frames. [`Camera::cast_ray_from_mouse`] turns a
//! cursor position into a world space [`Ray`] for hit testing.

use std::f32::consts::{PI, TAU};

use cgmath::{InnerSpace, Matrix4, Point3, Rad, SquareMatrix, Vector2, Vector3};
use winit::{
    dpi::PhysicalPosition,
    event::{MouseScrollDelta, WindowEvent},
};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

const MIN_POLAR: f32 = 1e-3;

#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
}

impl Camera {
    pub fn new<P: Into<Point3<f32>>, T: Into<Point3<f32>>>(position: P, target: T) -> Self {
        Self {
            position: position.into(),
            target: target.into(),
        }
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position, self.target, Vector3::unit_y())
    }

    /// Build a world space ray from the camera through a viewport pixel.
    ///
    /// Pixel coordinates have their origin in the top left corner. They are
    /// mapped to normalized device coordinates with x growing to the right and
    /// y growing upwards.
    pub fn cast_ray_from_mouse(
        &self,
        coords: PhysicalPosition<f64>,
        width: u32,
        height: u32,
        projection: &Projection,
    ) -> Ray {
        let ndc_x = (coords.x as f32 / width.max(1) as f32) * 2.0 - 1.0;
        let ndc_y = -(coords.y as f32 / height.max(1) as f32) * 2.0 + 1.0;

        let half_height = (projection.fovy.0 / 2.0).tan();
        let half_width = half_height * projection.aspect;

        let (forward, right, up) = self.basis();
        let direction = forward + right * (ndc_x * half_width) + up * (ndc_y * half_height);
        Ray::new(self.position, direction)
    }

    /// Forward, right and up unit vectors of the view.
    pub fn basis(&self) -> (Vector3<f32>, Vector3<f32>, Vector3<f32>) {
        let forward = (self.target - self.position).normalize();
        let right = forward.cross(Vector3::unit_y()).normalize();
        let up = right.cross(forward);
        (forward, right, up)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Projection {
    pub aspect: f32,
    pub fovy: Rad<f32>,
    pub znear: f32,
    pub zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width.max(1) as f32 / height.max(1) as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width.max(1) as f32 / height.max(1) as f32;
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * cgmath::perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_position: [f32; 4],
    pub view_proj: [[f32; 4]; 4],
    // used by the sky shader to turn clip space back into view rays
    pub inv_view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::identity().into(),
            inv_view_proj: Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera, projection: &Projection) {
        self.view_position = camera.position.to_homogeneous().into();
        let view_proj = projection.calc_matrix() * camera.calc_matrix();
        self.view_proj = view_proj.into();
        self.inv_view_proj = view_proj.invert().unwrap_or(Matrix4::identity()).into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct CameraResources {
    pub camera: Camera,
    pub controller: OrbitController,
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

/// Orbit style camera controls with damping.
///
/// Input is accumulated as pending spherical and pan deltas. Every
/// [`update`](Self::update) applies a `damping` fraction of what is pending and
/// keeps the rest for the following frames. Zoom is applied in full.
#[derive(Clone, Debug)]
pub struct OrbitController {
    pub damping: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    delta_theta: f32,
    delta_phi: f32,
    // viewport-relative pan, converted to world units against the current view
    pending_pan: Vector2<f32>,
    scale: f32,
}

impl OrbitController {
    pub fn new(damping: f32) -> Self {
        Self {
            damping: damping.clamp(0.0, 1.0),
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            min_distance: 0.5,
            max_distance: 2000.0,
            delta_theta: 0.0,
            delta_phi: 0.0,
            pending_pan: Vector2::new(0.0, 0.0),
            scale: 1.0,
        }
    }

    /// Rotate by a cursor drag of `dx`/`dy` pixels. A drag across the full
    /// viewport height turns the camera once around the target.
    pub fn handle_rotate(&mut self, dx: f64, dy: f64, viewport_height: u32) {
        let height = viewport_height.max(1) as f32;
        self.delta_theta -= TAU * dx as f32 / height * self.rotate_speed;
        self.delta_phi -= TAU * dy as f32 / height * self.rotate_speed;
    }

    pub fn handle_pan(&mut self, dx: f64, dy: f64, viewport_height: u32) {
        let height = viewport_height.max(1) as f32;
        self.pending_pan += Vector2::new(dx as f32, dy as f32) / height * self.pan_speed;
    }

    pub fn handle_zoom(&mut self, steps: f32) {
        self.scale *= 0.95f32.powf(steps * self.zoom_speed);
    }

    pub fn handle_window_events(&mut self, event: &WindowEvent) {
        if let WindowEvent::MouseWheel { delta, .. } = event {
            let steps = match delta {
                MouseScrollDelta::LineDelta(_, y) => *y,
                MouseScrollDelta::PixelDelta(PhysicalPosition { y, .. }) => *y as f32 / 50.0,
            };
            self.handle_zoom(steps);
        }
    }

    pub fn is_idle(&self) -> bool {
        self.delta_theta.abs() < f32::EPSILON
            && self.delta_phi.abs() < f32::EPSILON
            && self.pending_pan.magnitude2() < f32::EPSILON * f32::EPSILON
            && (self.scale - 1.0).abs() < f32::EPSILON
    }

    pub fn update(&mut self, camera: &mut Camera, projection: &Projection) {
        if self.is_idle() {
            return;
        }

        let offset = camera.position - camera.target;
        let radius = offset.magnitude().max(f32::EPSILON);

        if self.pending_pan.magnitude2() > 0.0 {
            let (_, right, up) = camera.basis();
            let extent = 2.0 * radius * (projection.fovy.0 / 2.0).tan();
            let step = self.pending_pan * self.damping;
            camera.target += -right * (step.x * extent) + up * (step.y * extent);
            self.pending_pan *= 1.0 - self.damping;
        }

        let mut theta = offset.x.atan2(offset.z);
        let mut phi = (offset.y / radius).clamp(-1.0, 1.0).acos();
        theta += self.delta_theta * self.damping;
        phi = (phi + self.delta_phi * self.damping).clamp(MIN_POLAR, PI - MIN_POLAR);
        self.delta_theta *= 1.0 - self.damping;
        self.delta_phi *= 1.0 - self.damping;

        let radius = (radius * self.scale).clamp(self.min_distance, self.max_distance);
        self.scale = 1.0;

        let (sin_phi, cos_phi) = phi.sin_cos();
        let (sin_theta, cos_theta) = theta.sin_cos();
        camera.position = camera.target
            + Vector3::new(
                radius * sin_phi * sin_theta,
                radius * cos_phi,
                radius * sin_phi * cos_theta,
            );
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: Point3<f32>,
    pub direction: Vector3<f32>,
}

impl Ray {
    /// `direction` is normalized on construction.
    pub fn new(origin: Point3<f32>, direction: Vector3<f32>) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    pub fn at(&self, distance: f32) -> Point3<f32> {
        self.origin + self.direction * distance
    }

    /// Distance to the nearest non-negative hit with a sphere, if any.
    ///
    /// A ray starting inside the sphere hits the far side.
    pub fn intersect_sphere(&self, center: Point3<f32>, radius: f32) -> Option<f32> {
        let oc = self.origin - center;
        let a = self.direction.dot(self.direction);
        let half_b = oc.dot(self.direction);
        let c = oc.dot(oc) - radius * radius;

        let discriminant = half_b * half_b - a * c;
        if discriminant < 0.0 {
            return None;
        }

        let sqrt_d = discriminant.sqrt();
        let near = (-half_b - sqrt_d) / a;
        if near >= 0.0 {
            return Some(near);
        }
        let far = (-half_b + sqrt_d) / a;
        (far >= 0.0).then_some(far)
    }
}
