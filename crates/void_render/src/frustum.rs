//! View frustum for culling
//!
//! Planes are extracted from a view-projection matrix (Gribb/Hartmann) using
//! the 0..1 clip depth range that `glam`'s `*_rh` projections produce. Normals
//! point into the frustum.

use glam::{Mat4, Vec3, Vec4};

use crate::bounds::{Aabb, BoundingSphere};

/// A plane `dot(normal, p) + d = 0`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub d: f32,
}

impl Plane {
    /// Build from unnormalized coefficients `(a, b, c, d)`
    pub fn from_coefficients(v: Vec4) -> Self {
        let normal = v.truncate();
        let len = normal.length();
        if len <= f32::EPSILON {
            return Self { normal, d: v.w };
        }
        Self {
            normal: normal / len,
            d: v.w / len,
        }
    }

    #[inline]
    pub fn signed_distance(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.d
    }
}

/// Result of a containment test
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Containment {
    Outside,
    Intersecting,
    Inside,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Frustum {
    /// left, right, bottom, top, near, far
    pub planes: [Plane; 6],
}

impl Frustum {
    pub fn from_view_projection(view_proj: &Mat4) -> Self {
        let r0 = view_proj.row(0);
        let r1 = view_proj.row(1);
        let r2 = view_proj.row(2);
        let r3 = view_proj.row(3);

        Self {
            planes: [
                Plane::from_coefficients(r3 + r0),
                Plane::from_coefficients(r3 - r0),
                Plane::from_coefficients(r3 + r1),
                Plane::from_coefficients(r3 - r1),
                Plane::from_coefficients(r2),
                Plane::from_coefficients(r3 - r2),
            ],
        }
    }

    pub fn contains_point(&self, point: Vec3) -> bool {
        self.planes.iter().all(|p| p.signed_distance(point) >= 0.0)
    }

    pub fn test_sphere(&self, sphere: &BoundingSphere) -> Containment {
        let mut result = Containment::Inside;
        for plane in &self.planes {
            let distance = plane.signed_distance(sphere.center);
            if distance < -sphere.radius {
                return Containment::Outside;
            }
            if distance < sphere.radius {
                result = Containment::Intersecting;
            }
        }
        result
    }

    #[inline]
    pub fn intersects_sphere(&self, sphere: &BoundingSphere) -> bool {
        self.test_sphere(sphere) != Containment::Outside
    }

    /// Conservative box test using the positive vertex per plane
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        self.planes.iter().all(|plane| {
            let positive = Vec3::select(plane.normal.cmpge(Vec3::ZERO), aabb.max, aabb.min);
            plane.signed_distance(positive) >= 0.0
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frustum() -> Frustum {
        let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y);
        let proj = Mat4::perspective_rh(60f32.to_radians(), 1.0, 0.1, 100.0);
        Frustum::from_view_projection(&(proj * view))
    }

    #[test]
    fn test_point_containment() {
        let f = frustum();
        assert!(f.contains_point(Vec3::ZERO));
        assert!(!f.contains_point(Vec3::new(0.0, 0.0, 10.0)));
        assert!(!f.contains_point(Vec3::new(0.0, 0.0, -200.0)));
    }

    #[test]
    fn test_sphere() {
        let f = frustum();
        assert_eq!(
            f.test_sphere(&BoundingSphere::new(Vec3::ZERO, 0.5)),
            Containment::Inside
        );
        assert!(!f.intersects_sphere(&BoundingSphere::new(Vec3::new(0.0, 0.0, -500.0), 1.0)));
        // straddles the far plane at z = -95
        assert_eq!(
            f.test_sphere(&BoundingSphere::new(Vec3::new(0.0, 0.0, -95.0), 2.0)),
            Containment::Intersecting
        );
    }

    #[test]
    fn test_aabb() {
        let f = frustum();
        assert!(f.intersects_aabb(&Aabb::unit()));
        let far_left = Aabb::from_center_half_extents(Vec3::new(-500.0, 0.0, 0.0), Vec3::ONE);
        assert!(!f.intersects_aabb(&far_left));
    }
}
