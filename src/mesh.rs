//! Triangulation of robot primitives and terrain blocks for the rasterizer.

use crate::blueprint::ShapePrimitive;
use crate::world::TerrainBox;
use glam::{Affine3A, Vec2, Vec3};
use std::f32::consts::{PI, TAU};

const SEGMENTS: usize = 16;
const RINGS: usize = 8;
const MAX_TILES_PER_AXIS: f32 = 256.0;

/// A flat-coloured world-space triangle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Triangle {
    pub vertices: [Vec3; 3],
    pub color: [u8; 3],
}

impl Triangle {
    pub fn normal(&self) -> Vec3 {
        let [a, b, c] = self.vertices;
        (b - a).cross(c - a).normalize_or_zero()
    }
}

/// Appends the triangles of `shape` placed by `transform`.
pub fn shape_triangles(
    shape: &ShapePrimitive,
    transform: Affine3A,
    color: [u8; 3],
    out: &mut Vec<Triangle>,
) {
    match *shape {
        ShapePrimitive::Box(half) => box_triangles(transform, half, color, out),
        ShapePrimitive::Cylinder { radius, height } => {
            let h = height / 2.0;
            let profile = [
                Vec2::new(0.0, h),
                Vec2::new(radius, h),
                Vec2::new(radius, -h),
                Vec2::new(0.0, -h),
            ];
            lathe(&profile, transform, color, out);
        }
        ShapePrimitive::Sphere(radius) => {
            lathe(&hemispheres(radius, 0.0), transform, color, out);
        }
        ShapePrimitive::Capsule { radius, height } => {
            lathe(&hemispheres(radius, height / 2.0), transform, color, out);
        }
    }
}

/// Profile of two hemispheres whose centres sit `half_gap` above and below the
/// origin; the segment joining them becomes the cylindrical part.
fn hemispheres(radius: f32, half_gap: f32) -> Vec<Vec2> {
    let mut profile = Vec::with_capacity(RINGS + 2);
    for i in 0..=RINGS / 2 {
        let theta = PI * i as f32 / RINGS as f32;
        profile.push(Vec2::new(radius * theta.sin(), half_gap + radius * theta.cos()));
    }
    for i in RINGS / 2..=RINGS {
        let theta = PI * i as f32 / RINGS as f32;
        profile.push(Vec2::new(radius * theta.sin(), -half_gap + radius * theta.cos()));
    }
    profile
}

/// Revolves a `(radius, y)` profile around the local Y axis.
fn lathe(profile: &[Vec2], transform: Affine3A, color: [u8; 3], out: &mut Vec<Triangle>) {
    let point = |p: Vec2, j: usize| {
        let angle = TAU * j as f32 / SEGMENTS as f32;
        transform.transform_point3(Vec3::new(p.x * angle.cos(), p.y, p.x * angle.sin()))
    };
    for pair in profile.windows(2) {
        let (p0, p1) = (pair[0], pair[1]);
        for j in 0..SEGMENTS {
            let a = point(p0, j);
            let b = point(p0, j + 1);
            let c = point(p1, j + 1);
            let d = point(p1, j);
            if p0.x > 0.0 {
                out.push(Triangle {
                    vertices: [a, b, c],
                    color,
                });
            }
            if p1.x > 0.0 {
                out.push(Triangle {
                    vertices: [a, c, d],
                    color,
                });
            }
        }
    }
}

fn box_triangles(transform: Affine3A, half: Vec3, color: [u8; 3], out: &mut Vec<Triangle>) {
    let corner = |x: f32, y: f32, z: f32| transform.transform_point3(half * Vec3::new(x, y, z));
    let faces = [
        [(1., -1., -1.), (1., 1., -1.), (1., 1., 1.), (1., -1., 1.)],
        [(-1., -1., 1.), (-1., 1., 1.), (-1., 1., -1.), (-1., -1., -1.)],
        [(-1., 1., -1.), (-1., 1., 1.), (1., 1., 1.), (1., 1., -1.)],
        [(-1., -1., 1.), (-1., -1., -1.), (1., -1., -1.), (1., -1., 1.)],
        [(-1., -1., 1.), (1., -1., 1.), (1., 1., 1.), (-1., 1., 1.)],
        [(1., -1., -1.), (-1., -1., -1.), (-1., 1., -1.), (1., 1., -1.)],
    ];
    for face in faces {
        let [a, b, c, d] = face.map(|(x, y, z)| corner(x, y, z));
        out.push(Triangle {
            vertices: [a, b, c],
            color,
        });
        out.push(Triangle {
            vertices: [a, c, d],
            color,
        });
    }
}

/// Appends the triangles of a terrain block. Checkered blocks get their top
/// face split into world-aligned tiles of `tile_size`.
pub fn terrain_triangles(block: &TerrainBox, tile_size: f32, out: &mut Vec<Triangle>) {
    let transform = Affine3A::from_translation(block.center);
    let Some(alternate) = block.checker.filter(|_| tile_size > 0.0) else {
        box_triangles(transform, block.half_extents, block.color, out);
        return;
    };

    // Sides and bottom in the base colour, then the tiled top just above them.
    box_triangles(transform, block.half_extents, block.color, out);

    let bounds = block.aabb();
    let span = (bounds.upper - bounds.lower).max_element();
    let tile = tile_size.max(span / MAX_TILES_PER_AXIS);
    let top = bounds.upper.y + 1e-4;

    let first_x = (bounds.lower.x / tile).floor() as i64;
    let last_x = (bounds.upper.x / tile).ceil() as i64;
    let first_z = (bounds.lower.z / tile).floor() as i64;
    let last_z = (bounds.upper.z / tile).ceil() as i64;
    for i in first_x..last_x {
        let x0 = (i as f32 * tile).max(bounds.lower.x);
        let x1 = ((i + 1) as f32 * tile).min(bounds.upper.x);
        for k in first_z..last_z {
            let z0 = (k as f32 * tile).max(bounds.lower.z);
            let z1 = ((k + 1) as f32 * tile).min(bounds.upper.z);
            if x1 <= x0 || z1 <= z0 {
                continue;
            }
            let color = if (i + k).rem_euclid(2) == 0 {
                block.color
            } else {
                alternate
            };
            let a = Vec3::new(x0, top, z0);
            let b = Vec3::new(x0, top, z1);
            let c = Vec3::new(x1, top, z1);
            let d = Vec3::new(x1, top, z0);
            out.push(Triangle {
                vertices: [a, b, c],
                color,
            });
            out.push(Triangle {
                vertices: [a, c, d],
                color,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_has_twelve_triangles_inside_its_extents() {
        let mut out = Vec::new();
        shape_triangles(
            &ShapePrimitive::Box(Vec3::new(0.5, 1.0, 0.25)),
            Affine3A::IDENTITY,
            [1, 2, 3],
            &mut out,
        );
        assert_eq!(out.len(), 12);
        for tri in &out {
            for v in tri.vertices {
                assert!(v.x.abs() <= 0.5 + 1e-6 && v.y.abs() <= 1.0 + 1e-6);
            }
        }
    }

    #[test]
    fn capsule_spans_its_caps() {
        let mut out = Vec::new();
        shape_triangles(
            &ShapePrimitive::Capsule {
                radius: 0.1,
                height: 0.4,
            },
            Affine3A::IDENTITY,
            [0, 0, 0],
            &mut out,
        );
        let top = out
            .iter()
            .flat_map(|t| t.vertices)
            .map(|v| v.y)
            .fold(f32::MIN, f32::max);
        assert!((top - 0.3).abs() < 1e-5);
    }

    #[test]
    fn checkered_top_alternates_colours() {
        let block = TerrainBox::new(Vec3::new(0.0, -0.5, 0.0), Vec3::new(1.0, 0.5, 1.0), [10, 10, 10])
            .checkered([20, 20, 20]);
        let mut out = Vec::new();
        terrain_triangles(&block, 0.5, &mut out);
        assert!(out.iter().any(|t| t.color == [20, 20, 20]));
        // 12 box triangles plus 4x4 tiles of two triangles
        assert_eq!(out.len(), 12 + 32);
    }
}
