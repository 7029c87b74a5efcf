//! Render settings, optionally loaded from a JSON file.

use crate::error::LoadError;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderSettings {
    pub width: u32,
    pub height: u32,
    /// Vertical field of view (degrees).
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub clear_rgba: [u8; 4],
    /// Direction the light travels in, world space.
    pub light_direction: [f32; 3],
    /// Fraction of the base colour lit by ambient light.
    pub ambient: f32,
    /// Edge length of checkered floor tiles (m).
    pub tile_size: f32,
    /// Link colours indexed by material id; ids past the end wrap around.
    pub palette: Vec<[u8; 3]>,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            fov_degrees: 45.0,
            near: 0.01,
            far: 100.0,
            clear_rgba: [186, 206, 228, 255],
            light_direction: [-0.4, -1.0, -0.3],
            ambient: 0.35,
            tile_size: 0.5,
            palette: vec![
                [232, 160, 64],
                [72, 132, 200],
                [96, 176, 96],
                [200, 80, 80],
                [160, 112, 200],
                [80, 80, 88],
            ],
        }
    }
}

impl RenderSettings {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| LoadError::io(path, e))?;
        serde_json::from_str(&text)
            .map_err(|e| LoadError::Config(format!("'{}': {e}", path.display())))
    }

    pub fn material_color(&self, material: u8) -> [u8; 3] {
        if self.palette.is_empty() {
            return [200, 200, 200];
        }
        self.palette[usize::from(material) % self.palette.len()]
    }
}
