//! Debug line geometry
//!
//! Produces line-list vertices (two per segment) for the overlay. Physics is
//! not simulated here; entities only describe their collision shape.

use std::f32::consts::TAU;

use glam::{Mat4, Vec3};

use crate::bounds::Aabb;
use crate::context::LineVertex;

/// Segments per circle outline
const CIRCLE_SEGMENTS: usize = 24;

/// Box edges as corner index pairs (see [`Aabb::corners`])
const BOX_EDGES: [(usize, usize); 12] = [
    (0, 1),
    (1, 2),
    (2, 3),
    (3, 0),
    (4, 5),
    (5, 6),
    (6, 7),
    (7, 4),
    (0, 4),
    (1, 5),
    (2, 6),
    (3, 7),
];

/// Collision shape in the entity's local space
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PhysicsShape {
    Box { half_extents: Vec3 },
    Sphere { radius: f32 },
    /// Y-aligned capsule; `half_height` excludes the caps
    Capsule { radius: f32, half_height: f32 },
}

/// Append the 12 edges of a box
pub fn aabb_lines(aabb: &Aabb, color: [f32; 4], out: &mut Vec<LineVertex>) {
    box_edges(&aabb.corners(), color, out);
}

/// Append the outline of `shape` placed by `world`
pub fn shape_lines(shape: &PhysicsShape, world: &Mat4, color: [f32; 4], out: &mut Vec<LineVertex>) {
    match *shape {
        PhysicsShape::Box { half_extents } => {
            let corners = Aabb::from_center_half_extents(Vec3::ZERO, half_extents)
                .corners()
                .map(|c| world.transform_point3(c));
            box_edges(&corners, color, out);
        }
        PhysicsShape::Sphere { radius } => {
            circle(world, Vec3::ZERO, Vec3::X, Vec3::Y, radius, color, out);
            circle(world, Vec3::ZERO, Vec3::Y, Vec3::Z, radius, color, out);
            circle(world, Vec3::ZERO, Vec3::X, Vec3::Z, radius, color, out);
        }
        PhysicsShape::Capsule {
            radius,
            half_height,
        } => {
            let top = Vec3::Y * half_height;
            let bottom = -top;
            circle(world, top, Vec3::X, Vec3::Z, radius, color, out);
            circle(world, bottom, Vec3::X, Vec3::Z, radius, color, out);
            circle(world, top, Vec3::X, Vec3::Y, radius, color, out);
            circle(world, bottom, Vec3::X, Vec3::Y, radius, color, out);
            for side in [Vec3::X, Vec3::NEG_X, Vec3::Z, Vec3::NEG_Z] {
                let offset = side * radius;
                segment(
                    world.transform_point3(top + offset),
                    world.transform_point3(bottom + offset),
                    color,
                    out,
                );
            }
        }
    }
}

fn box_edges(corners: &[Vec3; 8], color: [f32; 4], out: &mut Vec<LineVertex>) {
    for (a, b) in BOX_EDGES {
        segment(corners[a], corners[b], color, out);
    }
}

fn circle(
    world: &Mat4,
    center: Vec3,
    u: Vec3,
    v: Vec3,
    radius: f32,
    color: [f32; 4],
    out: &mut Vec<LineVertex>,
) {
    let point = |i: usize| {
        let angle = TAU * i as f32 / CIRCLE_SEGMENTS as f32;
        world.transform_point3(center + (u * angle.cos() + v * angle.sin()) * radius)
    };
    for i in 0..CIRCLE_SEGMENTS {
        segment(point(i), point(i + 1), color, out);
    }
}

#[inline]
fn segment(a: Vec3, b: Vec3, color: [f32; 4], out: &mut Vec<LineVertex>) {
    out.push(LineVertex::new(a, color));
    out.push(LineVertex::new(b, color));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_has_twelve_edges() {
        let mut out = Vec::new();
        aabb_lines(&Aabb::unit(), [1.0; 4], &mut out);
        assert_eq!(out.len(), 24);
    }

    #[test]
    fn test_sphere_outline_is_on_radius() {
        let mut out = Vec::new();
        let world = Mat4::from_translation(Vec3::new(5.0, 0.0, 0.0));
        shape_lines(&PhysicsShape::Sphere { radius: 2.0 }, &world, [1.0; 4], &mut out);
        assert_eq!(out.len(), 3 * CIRCLE_SEGMENTS * 2);
        for v in &out {
            let r = v.position.distance(Vec3::new(5.0, 0.0, 0.0));
            assert!((r - 2.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_capsule_outline() {
        let mut out = Vec::new();
        let shape = PhysicsShape::Capsule {
            radius: 0.5,
            half_height: 1.0,
        };
        shape_lines(&shape, &Mat4::IDENTITY, [1.0; 4], &mut out);
        assert_eq!(out.len(), (4 * CIRCLE_SEGMENTS + 4) * 2);
    }
}
