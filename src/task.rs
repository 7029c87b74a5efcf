//! Named tasks supplying terrain for the snapshot world.

use crate::error::LoadError;
use crate::world::{TerrainBox, World};
use glam::Vec3;

/// Simulation time step shared by every built-in task (s).
pub const TIME_STEP: f32 = 1.0 / 240.0;

const FLOOR_LIGHT: [u8; 3] = [214, 214, 206];
const FLOOR_DARK: [u8; 3] = [178, 178, 170];
const OBSTACLE: [u8; 3] = [150, 120, 96];

/// An environment the robot is shown in.
pub trait Task: Sync {
    fn name(&self) -> &str;

    fn time_step(&self) -> f32 {
        TIME_STEP
    }

    /// Adds this task's terrain to `world`.
    fn add_terrain(&self, world: &mut World);

    /// A fresh world populated with this task's terrain.
    fn make_world(&self) -> World {
        let mut world = World::new(self.time_step());
        self.add_terrain(&mut world);
        world
    }
}

/// Top face at y = 0, extending well past the start line in +X.
fn floor(light: [u8; 3], dark: [u8; 3]) -> TerrainBox {
    TerrainBox::new(Vec3::new(8.0, -0.5, 0.0), Vec3::new(12.0, 0.5, 6.0), light).checkered(dark)
}

/// Plain flat ground.
#[derive(Clone, Copy, Debug, Default)]
pub struct FlatTerrainTask;

impl Task for FlatTerrainTask {
    fn name(&self) -> &str {
        "FlatTerrainTask"
    }

    fn add_terrain(&self, world: &mut World) {
        world.add_terrain(floor(FLOOR_LIGHT, FLOOR_DARK));
    }
}

/// Flat, slippery ground.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrozenLakeTask;

impl Task for FrozenLakeTask {
    fn name(&self) -> &str {
        "FrozenLakeTask"
    }

    fn add_terrain(&self, world: &mut World) {
        world.add_terrain(floor([206, 226, 240], [176, 204, 226]));
    }
}

/// Low ridges across the direction of travel.
#[derive(Clone, Copy, Debug)]
pub struct RidgedTerrainTask {
    pub spacing: f32,
    pub height: f32,
    pub count: usize,
}

impl Default for RidgedTerrainTask {
    fn default() -> Self {
        Self {
            spacing: 1.0,
            height: 0.1,
            count: 10,
        }
    }
}

impl Task for RidgedTerrainTask {
    fn name(&self) -> &str {
        "RidgedTerrainTask"
    }

    fn add_terrain(&self, world: &mut World) {
        world.add_terrain(floor(FLOOR_LIGHT, FLOOR_DARK));
        for i in 0..self.count {
            let x = self.spacing * (i as f32 + 1.0);
            world.add_terrain(TerrainBox::new(
                Vec3::new(x, self.height / 2.0, 0.0),
                Vec3::new(0.05, self.height / 2.0, 6.0),
                OBSTACLE,
            ));
        }
    }
}

/// Platforms separated by gaps that widen along the track.
#[derive(Clone, Copy, Debug)]
pub struct GapTerrainTask {
    pub platform_length: f32,
    pub first_gap: f32,
    pub gap_growth: f32,
    pub count: usize,
}

impl Default for GapTerrainTask {
    fn default() -> Self {
        Self {
            platform_length: 1.0,
            first_gap: 0.1,
            gap_growth: 0.05,
            count: 8,
        }
    }
}

impl Task for GapTerrainTask {
    fn name(&self) -> &str {
        "GapTerrainTask"
    }

    fn add_terrain(&self, world: &mut World) {
        // Start platform the robot stands on, behind x = 0.
        world.add_terrain(
            TerrainBox::new(Vec3::new(-2.0, -0.5, 0.0), Vec3::new(2.0, 0.5, 6.0), FLOOR_LIGHT)
                .checkered(FLOOR_DARK),
        );
        let mut x = 0.0;
        for i in 0..self.count {
            x += self.first_gap + self.gap_growth * i as f32;
            let half = self.platform_length / 2.0;
            world.add_terrain(
                TerrainBox::new(
                    Vec3::new(x + half, -0.5, 0.0),
                    Vec3::new(half, 0.5, 6.0),
                    FLOOR_LIGHT,
                )
                .checkered(FLOOR_DARK),
            );
            x += self.platform_length;
        }
    }
}

/// Walls of increasing height across the track.
#[derive(Clone, Copy, Debug)]
pub struct WallTerrainTask {
    pub spacing: f32,
    pub first_height: f32,
    pub height_growth: f32,
    pub count: usize,
}

impl Default for WallTerrainTask {
    fn default() -> Self {
        Self {
            spacing: 1.5,
            first_height: 0.05,
            height_growth: 0.025,
            count: 6,
        }
    }
}

impl Task for WallTerrainTask {
    fn name(&self) -> &str {
        "WallTerrainTask"
    }

    fn add_terrain(&self, world: &mut World) {
        world.add_terrain(floor(FLOOR_LIGHT, FLOOR_DARK));
        for i in 0..self.count {
            let height = self.first_height + self.height_growth * i as f32;
            world.add_terrain(TerrainBox::new(
                Vec3::new(self.spacing * (i as f32 + 1.0), height / 2.0, 0.0),
                Vec3::new(0.1, height / 2.0, 6.0),
                OBSTACLE,
            ));
        }
    }
}

/// Names accepted by [`task_by_name`].
pub const TASK_NAMES: [&str; 5] = [
    "FlatTerrainTask",
    "FrozenLakeTask",
    "RidgedTerrainTask",
    "GapTerrainTask",
    "WallTerrainTask",
];

/// Resolves a task by its name.
pub fn task_by_name(name: &str) -> Result<Box<dyn Task>, LoadError> {
    let task: Box<dyn Task> = match name {
        "FlatTerrainTask" => Box::new(FlatTerrainTask),
        "FrozenLakeTask" => Box::new(FrozenLakeTask),
        "RidgedTerrainTask" => Box::new(RidgedTerrainTask::default()),
        "GapTerrainTask" => Box::new(GapTerrainTask::default()),
        "WallTerrainTask" => Box::new(WallTerrainTask::default()),
        _ => return Err(LoadError::UnknownTask(name.to_string())),
    };
    Ok(task)
}
