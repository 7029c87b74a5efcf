//! Rendering a world to a pixel buffer.
//!
//! [`SoftwareRenderer`] is a small depth-buffered rasterizer. Like a GL frame
//! read-back, the image it returns has its first row at the *bottom* of the
//! view; callers flip it before saving.

use crate::camera::CameraParams;
use crate::config::RenderSettings;
use crate::error::RenderError;
use crate::mesh::{Triangle, shape_triangles, terrain_triangles};
use crate::world::World;
use glam::{Mat4, Vec3, Vec4};
use image::{Rgba, RgbaImage};

/// Largest accepted image side, in pixels.
pub const MAX_DIMENSION: u32 = 16384;

/// Produces images of a world as seen by a camera.
pub trait Renderer {
    /// Renders `world` from `camera`. Rows are ordered bottom-up.
    fn render(&mut self, world: &World, camera: &CameraParams) -> Result<RgbaImage, RenderError>;
}

/// CPU rasterizer with flat Lambert shading.
#[derive(Clone, Debug)]
pub struct SoftwareRenderer {
    settings: RenderSettings,
    depth: Vec<f32>,
}

impl SoftwareRenderer {
    pub fn new(settings: RenderSettings) -> Self {
        Self {
            settings,
            depth: Vec::new(),
        }
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    fn scene_triangles(&self, world: &World) -> Vec<Triangle> {
        let mut triangles = Vec::new();
        for block in world.terrain() {
            terrain_triangles(block, self.settings.tile_size, &mut triangles);
        }
        for robot in world.robots() {
            for (&id, module) in &robot.blueprint.modules {
                let Some(transform) = robot.link_transform(id) else {
                    continue;
                };
                let color = self.settings.material_color(module.material_id);
                shape_triangles(&module.shape, transform, color, &mut triangles);
            }
        }
        triangles
    }
}

impl Default for SoftwareRenderer {
    fn default() -> Self {
        Self::new(RenderSettings::default())
    }
}

impl Renderer for SoftwareRenderer {
    #[tracing::instrument(level = "debug", skip_all)]
    fn render(&mut self, world: &World, camera: &CameraParams) -> Result<RgbaImage, RenderError> {
        let (width, height) = (self.settings.width, self.settings.height);
        if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(RenderError::InvalidViewport { width, height });
        }
        if !camera.is_finite() {
            return Err(RenderError::InvalidCamera(format!("{camera:?}")));
        }
        if camera.distance <= 0.0 {
            return Err(RenderError::InvalidCamera(format!(
                "distance must be positive, got {}",
                camera.distance
            )));
        }

        let projection = Mat4::perspective_rh_gl(
            self.settings.fov_degrees.to_radians(),
            width as f32 / height as f32,
            self.settings.near,
            self.settings.far,
        );
        let view_projection = projection * camera.view_matrix();
        let light = Vec3::from_array(self.settings.light_direction)
            .try_normalize()
            .unwrap_or(Vec3::NEG_Y);

        let [r, g, b, a] = self.settings.clear_rgba;
        let mut image = RgbaImage::from_pixel(width, height, Rgba([r, g, b, a]));
        self.depth.clear();
        self.depth
            .resize(width as usize * height as usize, f32::INFINITY);

        let triangles = self.scene_triangles(world);
        tracing::debug!(triangles = triangles.len(), "rasterizing scene");

        let mut target = Target {
            image: &mut image,
            depth: &mut self.depth,
            width,
            height,
        };
        for tri in &triangles {
            let shade = self.settings.ambient
                + (1.0 - self.settings.ambient) * tri.normal().dot(light).abs();
            let color = tri.color.map(|c| (c as f32 * shade).clamp(0.0, 255.0) as u8);
            let clip = tri.vertices.map(|v| view_projection * v.extend(1.0));
            let clipped = clip_near(&clip);
            for i in 1..clipped.len().saturating_sub(1) {
                target.fill([clipped[0], clipped[i], clipped[i + 1]], color, a);
            }
        }

        Ok(image)
    }
}

/// Clips a clip-space triangle against the near plane (`z >= -w`).
fn clip_near(tri: &[Vec4; 3]) -> Vec<Vec4> {
    let inside = |v: &Vec4| v.z + v.w >= 0.0;
    let mut out = Vec::with_capacity(4);
    for i in 0..3 {
        let cur = tri[i];
        let next = tri[(i + 1) % 3];
        if inside(&cur) {
            out.push(cur);
        }
        if inside(&cur) != inside(&next) {
            let dc = cur.z + cur.w;
            let dn = next.z + next.w;
            let t = dc / (dc - dn);
            out.push(cur + (next - cur) * t);
        }
    }
    out
}

struct Target<'a> {
    image: &'a mut RgbaImage,
    depth: &'a mut [f32],
    width: u32,
    height: u32,
}

impl Target<'_> {
    fn fill(&mut self, clip: [Vec4; 3], color: [u8; 3], alpha: u8) {
        if clip.iter().any(|v| v.w <= 0.0) {
            return;
        }
        let (w, h) = (self.width as f32, self.height as f32);
        let screen = clip.map(|v| {
            let ndc = v.truncate() / v.w;
            Vec3::new((ndc.x + 1.0) * 0.5 * w, (ndc.y + 1.0) * 0.5 * h, ndc.z)
        });
        let [p0, p1, p2] = screen;
        let area = edge(p0, p1, p2);
        if area.abs() < f32::EPSILON {
            return;
        }

        let min_x = p0.x.min(p1.x).min(p2.x).floor().max(0.0) as u32;
        let max_x = p0.x.max(p1.x).max(p2.x).ceil().min(w) as u32;
        let min_y = p0.y.min(p1.y).min(p2.y).floor().max(0.0) as u32;
        let max_y = p0.y.max(p1.y).max(p2.y).ceil().min(h) as u32;

        for y in min_y..max_y {
            for x in min_x..max_x {
                let p = Vec3::new(x as f32 + 0.5, y as f32 + 0.5, 0.0);
                let w0 = edge(p1, p2, p) / area;
                let w1 = edge(p2, p0, p) / area;
                let w2 = edge(p0, p1, p) / area;
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }
                let z = w0 * p0.z + w1 * p1.z + w2 * p2.z;
                if !(-1.0..=1.0).contains(&z) {
                    continue;
                }
                let idx = y as usize * self.width as usize + x as usize;
                if z < self.depth[idx] {
                    self.depth[idx] = z;
                    self.image
                        .put_pixel(x, y, Rgba([color[0], color[1], color[2], alpha]));
                }
            }
        }
    }
}

/// Twice the signed area of triangle `(a, b, c)` in screen space.
fn edge(a: Vec3, b: Vec3, c: Vec3) -> f32 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}
