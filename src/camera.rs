//! Camera, projection and the damped orbit controller.
//!
//! The [`Camera`] is a plain look-at camera. [`Projection`] owns the perspective
//! parameters and has to be resized together with the surface. The
//! [`OrbitController`] translates pointer, wheel and touch input into orbit, zoom and
//! pan deltas which are applied (and decayed) once per frame in
//! [`OrbitController::update`].

use std::{collections::HashMap, f32::consts::PI};

use cgmath::{EuclideanSpace, InnerSpace, Matrix4, Point3, Rad, Vector3, Zero, perspective};
use wgpu::util::DeviceExt;
use winit::{
    dpi::PhysicalPosition,
    event::{ElementState, MouseButton, MouseScrollDelta, TouchPhase, WindowEvent},
};

use crate::config::ControlsConfig;

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

const EPS: f32 = 0.000001;

#[derive(Clone, Debug)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
}

impl Camera {
    pub fn new<P: Into<Point3<f32>>>(position: P, target: P) -> Self {
        Self {
            position: position.into(),
            target: target.into(),
            up: Vector3::unit_y(),
        }
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn forward(&self) -> Vector3<f32> {
        (self.target - self.position).normalize()
    }

    /// Camera-space X axis expressed in world space.
    pub fn right(&self) -> Vector3<f32> {
        self.forward().cross(self.up).normalize()
    }

    /// Camera-space Y axis expressed in world space.
    pub fn camera_up(&self) -> Vector3<f32> {
        self.right().cross(self.forward()).normalize()
    }
}

#[derive(Clone, Debug)]
pub struct Projection {
    pub aspect: f32,
    pub fovy: Rad<f32>,
    pub znear: f32,
    pub zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width as f32 / height.max(1) as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    /// Keeps the aspect ratio in sync with the surface. Zero heights are ignored as
    /// they would produce an infinite aspect.
    pub fn resize(&mut self, width: u32, height: u32) {
        if height == 0 {
            return;
        }
        self.aspect = width as f32 / height as f32;
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        use cgmath::SquareMatrix;
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera, projection: &Projection) {
        self.view_position = camera.position.to_homogeneous().into();
        self.view_proj = (projection.calc_matrix() * camera.calc_matrix()).into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// GPU side of the camera together with the controller that drives it.
#[derive(Debug)]
pub struct CameraResources {
    pub camera: Camera,
    pub controller: OrbitController,
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl CameraResources {
    pub fn new(
        device: &wgpu::Device,
        camera: Camera,
        controller: OrbitController,
        projection: &Projection,
    ) -> Self {
        let mut uniform = CameraUniform::new();
        uniform.update_view_proj(&camera, projection);

        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
            label: Some("camera_bind_group_layout"),
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });

        Self {
            camera,
            controller,
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }
}

/// Spherical coordinates around the orbit pivot. `phi` is the polar angle from +Y,
/// `theta` the azimuth around +Y starting at +Z.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Spherical {
    pub radius: f32,
    pub phi: f32,
    pub theta: f32,
}

impl Spherical {
    pub fn from_vector(v: Vector3<f32>) -> Self {
        let radius = v.magnitude();
        if radius == 0.0 {
            return Self::default();
        }
        Self {
            radius,
            theta: v.x.atan2(v.z),
            phi: (v.y / radius).clamp(-1.0, 1.0).acos(),
        }
    }

    pub fn to_vector(&self) -> Vector3<f32> {
        let sin_phi_radius = self.phi.sin() * self.radius;
        Vector3::new(
            sin_phi_radius * self.theta.sin(),
            self.phi.cos() * self.radius,
            sin_phi_radius * self.theta.cos(),
        )
    }

    /// Keeps the polar angle away from the poles where `look_at` degenerates.
    fn make_safe(&mut self) {
        self.phi = self.phi.clamp(EPS, PI - EPS);
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Gesture {
    None,
    Rotate,
    Pan,
    Dolly,
}

#[derive(Debug)]
struct PointerState {
    gesture: Gesture,
    cursor: Option<PhysicalPosition<f64>>,
    touches: HashMap<u64, PhysicalPosition<f64>>,
    pan_modifier: bool,
}

/// Damped orbit controls around a pivot point.
///
/// Input handlers only accumulate deltas. [`update`](Self::update) applies them to
/// the camera; with damping enabled only `damping_factor` of the pending rotation
/// and pan is consumed per call and the rest decays, so the camera keeps gliding
/// after the input stops. Zoom is applied in full and the resulting distance is
/// clamped to `[min_distance, max_distance]`.
#[derive(Debug)]
pub struct OrbitController {
    pub target: Point3<f32>,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    spherical_delta: Spherical,
    scale: f32,
    pan_offset: Vector3<f32>,
    pointer: PointerState,
}

impl OrbitController {
    pub fn new(settings: &ControlsConfig) -> Self {
        Self {
            target: settings.target,
            enable_damping: settings.enable_damping,
            damping_factor: settings.damping_factor,
            min_distance: settings.min_distance,
            max_distance: settings.max_distance,
            min_polar_angle: 0.0,
            max_polar_angle: PI,
            rotate_speed: settings.rotate_speed,
            zoom_speed: settings.zoom_speed,
            pan_speed: settings.pan_speed,
            spherical_delta: Spherical::default(),
            scale: 1.0,
            pan_offset: Vector3::zero(),
            pointer: PointerState {
                gesture: Gesture::None,
                cursor: None,
                touches: HashMap::new(),
                pan_modifier: false,
            },
        }
    }

    pub fn rotate_left(&mut self, angle: f32) {
        self.spherical_delta.theta -= angle;
    }

    pub fn rotate_up(&mut self, angle: f32) {
        self.spherical_delta.phi -= angle;
    }

    /// Moves the camera towards the pivot. `dolly_scale` is expected in `(0, 1)`.
    pub fn dolly_in(&mut self, dolly_scale: f32) {
        self.scale *= dolly_scale;
    }

    pub fn dolly_out(&mut self, dolly_scale: f32) {
        self.scale /= dolly_scale;
    }

    pub fn zoom_scale(&self) -> f32 {
        0.95f32.powf(self.zoom_speed)
    }

    /// Screen-space pan by a pixel delta. The world distance moved matches the
    /// visible extent at the pivot's depth.
    pub fn pan(
        &mut self,
        delta_x: f32,
        delta_y: f32,
        camera: &Camera,
        projection: &Projection,
        viewport_height: f32,
    ) {
        if viewport_height <= 0.0 {
            return;
        }
        let offset = camera.position - self.target;
        let target_distance = offset.magnitude() * (projection.fovy.0 / 2.0).tan();
        let left = 2.0 * delta_x * self.pan_speed * target_distance / viewport_height;
        let up = 2.0 * delta_y * self.pan_speed * target_distance / viewport_height;
        self.pan_offset += camera.right() * -left;
        self.pan_offset += camera.camera_up() * up;
    }

    fn rotate_by_pixels(&mut self, delta_x: f32, delta_y: f32, viewport_height: f32) {
        if viewport_height <= 0.0 {
            return;
        }
        self.rotate_left(2.0 * PI * delta_x / viewport_height * self.rotate_speed);
        self.rotate_up(2.0 * PI * delta_y / viewport_height * self.rotate_speed);
    }

    /// Applies pending input to `camera`. Returns whether the camera moved.
    pub fn update(&mut self, camera: &mut Camera) -> bool {
        let offset = camera.position - self.target;
        let mut spherical = Spherical::from_vector(offset);

        if self.enable_damping {
            spherical.theta += self.spherical_delta.theta * self.damping_factor;
            spherical.phi += self.spherical_delta.phi * self.damping_factor;
        } else {
            spherical.theta += self.spherical_delta.theta;
            spherical.phi += self.spherical_delta.phi;
        }
        spherical.phi = spherical
            .phi
            .clamp(self.min_polar_angle, self.max_polar_angle);
        spherical.make_safe();

        if self.enable_damping {
            self.target += self.pan_offset * self.damping_factor;
        } else {
            self.target += self.pan_offset;
        }

        spherical.radius = self.clamp_distance(spherical.radius * self.scale);

        let previous = camera.position;
        camera.position = self.target + spherical.to_vector();
        camera.target = self.target;

        if self.enable_damping {
            let decay = 1.0 - self.damping_factor;
            self.spherical_delta.theta *= decay;
            self.spherical_delta.phi *= decay;
            self.pan_offset *= decay;
        } else {
            self.spherical_delta = Spherical::default();
            self.pan_offset = Vector3::zero();
        }
        self.scale = 1.0;

        (camera.position - previous).magnitude2() > EPS
    }

    fn clamp_distance(&self, distance: f32) -> f32 {
        distance.clamp(self.min_distance, self.max_distance)
    }

    pub fn distance(&self, camera: &Camera) -> f32 {
        (camera.position - self.target).magnitude()
    }

    /// Feeds a window event into the controller. Events that are not pointer, wheel,
    /// touch or modifier related are ignored.
    pub fn handle_window_events(
        &mut self,
        event: &WindowEvent,
        camera: &Camera,
        projection: &Projection,
        viewport_height: f32,
    ) {
        match event {
            WindowEvent::ModifiersChanged(modifiers) => {
                let state = modifiers.state();
                self.pointer.pan_modifier =
                    state.shift_key() || state.control_key() || state.super_key();
            }
            WindowEvent::MouseInput { state, button, .. } => {
                self.pointer.gesture = match (state, button) {
                    (ElementState::Pressed, MouseButton::Left) if self.pointer.pan_modifier => {
                        Gesture::Pan
                    }
                    (ElementState::Pressed, MouseButton::Left) => Gesture::Rotate,
                    (ElementState::Pressed, MouseButton::Right) => Gesture::Pan,
                    (ElementState::Pressed, MouseButton::Middle) => Gesture::Dolly,
                    (ElementState::Released, _) => Gesture::None,
                    _ => self.pointer.gesture,
                };
            }
            WindowEvent::CursorMoved { position, .. } => {
                if let Some(last) = self.pointer.cursor {
                    let dx = (position.x - last.x) as f32;
                    let dy = (position.y - last.y) as f32;
                    match self.pointer.gesture {
                        Gesture::Rotate => self.rotate_by_pixels(dx, dy, viewport_height),
                        Gesture::Pan => self.pan(dx, dy, camera, projection, viewport_height),
                        Gesture::Dolly if dy > 0.0 => self.dolly_out(self.zoom_scale()),
                        Gesture::Dolly if dy < 0.0 => self.dolly_in(self.zoom_scale()),
                        _ => (),
                    }
                }
                self.pointer.cursor = Some(*position);
            }
            WindowEvent::CursorLeft { .. } => {
                self.pointer.cursor = None;
                self.pointer.gesture = Gesture::None;
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(PhysicalPosition { y, .. }) => *y as f32,
                };
                if scroll > 0.0 {
                    self.dolly_in(self.zoom_scale());
                } else if scroll < 0.0 {
                    self.dolly_out(self.zoom_scale());
                }
            }
            WindowEvent::Touch(touch) => match touch.phase {
                TouchPhase::Started => {
                    self.pointer.touches.insert(touch.id, touch.location);
                }
                TouchPhase::Moved => {
                    self.handle_touch_move(touch.id, touch.location, camera, projection, viewport_height)
                }
                TouchPhase::Ended | TouchPhase::Cancelled => {
                    self.pointer.touches.remove(&touch.id);
                }
            },
            _ => (),
        }
    }

    fn handle_touch_move(
        &mut self,
        id: u64,
        location: PhysicalPosition<f64>,
        camera: &Camera,
        projection: &Projection,
        viewport_height: f32,
    ) {
        let Some(previous) = self.pointer.touches.get(&id).copied() else {
            return;
        };
        match self.pointer.touches.len() {
            1 => {
                let dx = (location.x - previous.x) as f32;
                let dy = (location.y - previous.y) as f32;
                self.rotate_by_pixels(dx, dy, viewport_height);
            }
            2 => {
                let other = self
                    .pointer
                    .touches
                    .iter()
                    .find(|(other_id, _)| **other_id != id)
                    .map(|(_, position)| *position);
                if let Some(other) = other {
                    let distance = |a: PhysicalPosition<f64>| {
                        ((a.x - other.x).powi(2) + (a.y - other.y).powi(2)).sqrt() as f32
                    };
                    let start = distance(previous);
                    let end = distance(location);
                    if start > 0.0 {
                        let dolly = (end / start).powf(self.zoom_speed);
                        self.dolly_out(dolly);
                    }
                    // the midpoint moves by half of the moving finger's delta
                    let dx = ((location.x - previous.x) / 2.0) as f32;
                    let dy = ((location.y - previous.y) / 2.0) as f32;
                    self.pan(dx, dy, camera, projection, viewport_height);
                }
            }
            _ => (),
        }
        self.pointer.touches.insert(id, location);
    }
}

/// Convenience for tests and callers that only care about the pivot distance.
pub fn orbit_distance(camera: &Camera) -> f32 {
    (camera.position.to_vec() - camera.target.to_vec()).magnitude()
}
