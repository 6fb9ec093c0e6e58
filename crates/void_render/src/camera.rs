//! Perspective camera
//!
//! View, projection and frustum are derived lazily. Every mutation drops the
//! cached matrices; the next getter recomputes them, so readers always see
//! values consistent with the latest change.
//!
//! ```ignore
//! let mut camera = Camera::perspective(60.0, 16.0 / 9.0, 0.1, 500.0);
//! camera.set_position(Vec3::new(0.0, 2.0, 10.0));
//! camera.look_at(Vec3::ZERO);
//! let visible = camera.frustum().intersects_sphere(&sphere);
//! ```

use std::cell::Cell;

use glam::{Mat4, Quat, Vec3};

use crate::frustum::Frustum;

/// Matrices derived from the camera state
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraMatrices {
    pub view: Mat4,
    pub projection: Mat4,
    pub view_projection: Mat4,
    pub frustum: Frustum,
}

#[derive(Clone, Debug)]
pub struct Camera {
    position: Vec3,
    rotation: Quat,
    target: Vec3,
    /// Vertical field of view in radians
    fov_y: f32,
    aspect: f32,
    near: f32,
    far: f32,
    cache: Cell<Option<CameraMatrices>>,
}

impl Camera {
    /// Create a camera at the origin looking down -Z. `fov_y_degrees` is vertical
    pub fn perspective(fov_y_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            target: Vec3::NEG_Z,
            fov_y: fov_y_degrees.to_radians(),
            aspect: aspect.max(f32::EPSILON),
            near,
            far,
            cache: Cell::new(None),
        }
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    #[inline]
    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    #[inline]
    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn fov_y(&self) -> f32 {
        self.fov_y
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn near(&self) -> f32 {
        self.near
    }

    pub fn far(&self) -> f32 {
        self.far
    }

    /// Direction the camera looks along
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    /// Move the camera, keeping its orientation. The target moves with it
    pub fn set_position(&mut self, position: Vec3) {
        self.target += position - self.position;
        self.position = position;
        self.invalidate();
    }

    pub fn set_rotation(&mut self, rotation: Quat) {
        let distance = self.target.distance(self.position).max(1.0);
        self.rotation = rotation.normalize();
        self.target = self.position + self.forward() * distance;
        self.invalidate();
    }

    /// Orient the camera towards `target`
    pub fn look_at(&mut self, target: Vec3) {
        let dir = target - self.position;
        if dir.length_squared() <= f32::EPSILON {
            return;
        }
        let up = if dir.normalize().dot(Vec3::Y).abs() > 0.999 {
            Vec3::Z
        } else {
            Vec3::Y
        };
        let view = Mat4::look_at_rh(self.position, target, up);
        let (_, rotation, _) = view.inverse().to_scale_rotation_translation();
        self.rotation = rotation.normalize();
        self.target = target;
        self.invalidate();
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect.max(f32::EPSILON);
        self.invalidate();
    }

    /// Update the aspect ratio from a framebuffer size
    pub fn set_viewport_size(&mut self, width: u32, height: u32) {
        if height > 0 {
            self.set_aspect(width as f32 / height as f32);
        }
    }

    pub fn set_fov_y_degrees(&mut self, degrees: f32) {
        self.fov_y = degrees.to_radians();
        self.invalidate();
    }

    pub fn set_clip_planes(&mut self, near: f32, far: f32) {
        self.near = near;
        self.far = far;
        self.invalidate();
    }

    /// True when the next getter will recompute
    pub fn is_dirty(&self) -> bool {
        self.cache.get().is_none()
    }

    pub fn view(&self) -> Mat4 {
        self.matrices().view
    }

    pub fn projection(&self) -> Mat4 {
        self.matrices().projection
    }

    pub fn view_projection(&self) -> Mat4 {
        self.matrices().view_projection
    }

    pub fn frustum(&self) -> Frustum {
        self.matrices().frustum
    }

    /// All derived matrices, recomputed if stale
    pub fn matrices(&self) -> CameraMatrices {
        if let Some(cached) = self.cache.get() {
            return cached;
        }
        let view = Mat4::from_rotation_translation(self.rotation, self.position).inverse();
        let projection = Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far);
        let view_projection = projection * view;
        let matrices = CameraMatrices {
            view,
            projection,
            view_projection,
            frustum: Frustum::from_view_projection(&view_projection),
        };
        self.cache.set(Some(matrices));
        matrices
    }

    #[inline]
    fn invalidate(&mut self) {
        self.cache.set(None);
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::perspective(60.0, 16.0 / 9.0, 0.1, 1000.0)
    }
}
