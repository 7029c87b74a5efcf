//! A kinematic stand-in for the simulation world.
//!
//! The world holds terrain boxes and robots placed in their rest pose. A
//! [`World::step`] settles each robot vertically onto the terrain beneath it,
//! which is all the posing the snapshot pipeline needs.

use crate::blueprint::{ModuleId, RobotBlueprint};
use glam::{Affine3A, Quat, Vec3};
use std::f32::consts::PI;

/// Index of a robot inside a [`World`].
pub type RobotIndex = usize;

/// An axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub lower: Vec3,
    pub upper: Vec3,
}

impl Aabb {
    pub fn new(lower: Vec3, upper: Vec3) -> Self {
        Self { lower, upper }
    }

    pub fn union(self, other: Aabb) -> Aabb {
        Aabb {
            lower: self.lower.min(other.lower),
            upper: self.upper.max(other.upper),
        }
    }

    /// Length of the box diagonal.
    pub fn diagonal(&self) -> f32 {
        (self.upper - self.lower).length()
    }

    /// Whether the footprints of the two boxes overlap in the XZ plane.
    fn overlaps_xz(&self, other: &Aabb) -> bool {
        self.lower.x <= other.upper.x
            && other.lower.x <= self.upper.x
            && self.lower.z <= other.upper.z
            && other.lower.z <= self.upper.z
    }
}

/// A static terrain block.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TerrainBox {
    pub center: Vec3,
    pub half_extents: Vec3,
    pub color: [u8; 3],
    /// Alternate colour for a checkered top face, if any.
    pub checker: Option<[u8; 3]>,
}

impl TerrainBox {
    pub fn new(center: Vec3, half_extents: Vec3, color: [u8; 3]) -> Self {
        Self {
            center,
            half_extents,
            color,
            checker: None,
        }
    }

    pub fn checkered(mut self, alternate: [u8; 3]) -> Self {
        self.checker = Some(alternate);
        self
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::new(
            self.center - self.half_extents,
            self.center + self.half_extents,
        )
    }
}

/// A robot placed in the world.
#[derive(Clone, Debug)]
pub struct PlacedRobot {
    pub blueprint: RobotBlueprint,
    pub position: Vec3,
    pub rotation: Quat,
}

impl PlacedRobot {
    /// World transform of module `link`.
    pub fn link_transform(&self, link: ModuleId) -> Option<Affine3A> {
        let module = self.blueprint.modules.get(&link)?;
        let (pos, rot) = module.transform;
        Some(Affine3A::from_rotation_translation(
            self.rotation * rot,
            self.position + self.rotation * pos,
        ))
    }

    /// World bounds of every module, `None` for a robot without modules.
    pub fn world_aabb(&self) -> Option<Aabb> {
        self.blueprint
            .modules
            .values()
            .map(|module| {
                let (pos, rot) = module.transform;
                let (lower, upper) = module
                    .shape
                    .to_bevy_primitive()
                    .world_bounds(self.position + self.rotation * pos, self.rotation * rot);
                Aabb::new(lower, upper)
            })
            .reduce(Aabb::union)
    }
}

/// Pose summary used to frame a robot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RobotPose {
    /// World translation of the base link.
    pub base_position: Vec3,
    pub bounds: Aabb,
}

/// A world with terrain and robots.
#[derive(Clone, Debug)]
pub struct World {
    time_step: f32,
    terrain: Vec<TerrainBox>,
    robots: Vec<PlacedRobot>,
}

impl World {
    pub fn new(time_step: f32) -> Self {
        Self {
            time_step,
            terrain: Vec::new(),
            robots: Vec::new(),
        }
    }

    pub fn time_step(&self) -> f32 {
        self.time_step
    }

    pub fn add_terrain(&mut self, block: TerrainBox) {
        self.terrain.push(block);
    }

    pub fn terrain(&self) -> &[TerrainBox] {
        &self.terrain
    }

    pub fn add_robot(
        &mut self,
        blueprint: RobotBlueprint,
        position: Vec3,
        rotation: Quat,
    ) -> RobotIndex {
        self.robots.push(PlacedRobot {
            blueprint,
            position,
            rotation,
        });
        self.robots.len() - 1
    }

    pub fn robots(&self) -> &[PlacedRobot] {
        &self.robots
    }

    pub fn robot(&self, index: RobotIndex) -> Option<&PlacedRobot> {
        self.robots.get(index)
    }

    /// One settling step: each robot is moved vertically so its lowest point
    /// rests on the highest terrain top under its footprint. Robots with no
    /// terrain beneath them stay where they are.
    pub fn step(&mut self) {
        for robot in &mut self.robots {
            let Some(bounds) = robot.world_aabb() else {
                continue;
            };
            let support = self
                .terrain
                .iter()
                .map(TerrainBox::aabb)
                .filter(|block| block.overlaps_xz(&bounds))
                .map(|block| block.upper.y)
                .reduce(f32::max);
            if let Some(top) = support {
                robot.position.y += top - bounds.lower.y;
            }
        }
    }

    pub fn link_transform(&self, index: RobotIndex, link: ModuleId) -> Option<Affine3A> {
        self.robot(index)?.link_transform(link)
    }

    pub fn robot_world_aabb(&self, index: RobotIndex) -> Option<Aabb> {
        self.robot(index)?.world_aabb()
    }

    /// Base-link translation and world bounds of a placed robot.
    pub fn robot_pose(&self, index: RobotIndex) -> Option<RobotPose> {
        let robot = self.robot(index)?;
        let base = robot.blueprint.root_module?;
        let transform = robot.link_transform(base)?;
        Some(RobotPose {
            base_position: Vec3::from(transform.translation),
            bounds: robot.world_aabb()?,
        })
    }
}

/// Orientation robots are added with: half a turn about Y so the base points
/// towards -X.
pub fn placement_rotation() -> Quat {
    Quat::from_rotation_y(PI)
}

/// Initial position that puts `robot` on the ground just behind the x = 0 plane.
pub fn presimulate(robot: &RobotBlueprint) -> Vec3 {
    let mut scratch = World::new(0.0);
    let index = scratch.add_robot(robot.clone(), Vec3::ZERO, placement_rotation());
    scratch.step();
    match scratch.robot_world_aabb(index) {
        Some(bounds) => Vec3::new(-bounds.upper.x, -bounds.lower.y, 0.0),
        None => Vec3::ZERO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blueprint::{RobotModule, ShapePrimitive};

    fn cube_robot() -> RobotBlueprint {
        let mut robot = RobotBlueprint::new();
        robot.add_module(
            0,
            RobotModule {
                shape: ShapePrimitive::Box(Vec3::splat(0.5)),
                mass: 1.0,
                density: 1.0,
                material_id: 0,
                transform: (Vec3::ZERO, Quat::IDENTITY),
            },
        );
        robot
    }

    #[test]
    fn presimulate_places_robot_behind_origin_on_ground() {
        let pos = presimulate(&cube_robot());
        assert!((pos - Vec3::new(-0.5, 0.5, 0.0)).length() < 1e-5);
    }

    #[test]
    fn step_rests_robot_on_terrain() {
        let mut world = World::new(1.0 / 240.0);
        world.add_terrain(TerrainBox::new(
            Vec3::new(0.0, -1.0, 0.0),
            Vec3::new(10.0, 1.0, 10.0),
            [200, 200, 200],
        ));
        world.add_terrain(TerrainBox::new(
            Vec3::new(0.0, 0.1, 0.0),
            Vec3::new(0.2, 0.1, 10.0),
            [200, 200, 200],
        ));
        let idx = world.add_robot(cube_robot(), Vec3::new(0.0, 3.0, 0.0), Quat::IDENTITY);
        world.step();

        let bounds = world.robot_world_aabb(idx).unwrap();
        assert!((bounds.lower.y - 0.2).abs() < 1e-5);
        let pose = world.robot_pose(idx).unwrap();
        assert!((pose.base_position.y - 0.7).abs() < 1e-5);
    }
}
