//! Bounding volumes used for culling and debug drawing

use glam::{Mat4, Vec3};

/// Axis-aligned bounding box
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// Unit cube centered at the origin
    pub fn unit() -> Self {
        Self::from_center_half_extents(Vec3::ZERO, Vec3::splat(0.5))
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// The eight corners, bottom face first
    pub fn corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Vec3::new(a.x, a.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(a.x, a.y, b.z),
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(b.x, b.y, b.z),
            Vec3::new(a.x, b.y, b.z),
        ]
    }

    /// Box enclosing this box after an affine transform
    pub fn transformed(&self, matrix: &Mat4) -> Aabb {
        let corners = self.corners();
        let first = matrix.transform_point3(corners[0]);
        let (min, max) = corners[1..]
            .iter()
            .map(|c| matrix.transform_point3(*c))
            .fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Aabb { min, max }
    }

    pub fn bounding_sphere(&self) -> BoundingSphere {
        BoundingSphere::new(self.center(), self.half_extents().length())
    }
}

/// Bounding sphere
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius: f32,
}

impl BoundingSphere {
    pub const fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Conservative sphere around an object of the given scale: `0.5 * |scale|`
    pub fn from_scale(position: Vec3, scale: Vec3) -> Self {
        Self::new(position, 0.5 * scale.length())
    }
}

/// World-space bounds of a renderable
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Bounds {
    Box(Aabb),
    Sphere(BoundingSphere),
}

impl Bounds {
    pub fn sphere(&self) -> BoundingSphere {
        match self {
            Bounds::Box(aabb) => aabb.bounding_sphere(),
            Bounds::Sphere(sphere) => *sphere,
        }
    }

    /// Box enclosing the bounds
    pub fn aabb(&self) -> Aabb {
        match self {
            Bounds::Box(aabb) => *aabb,
            Bounds::Sphere(s) => Aabb::from_center_half_extents(s.center, Vec3::splat(s.radius)),
        }
    }
}
