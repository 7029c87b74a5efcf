//! Interpreter that converts a [`TurtleProgram`] into a [`RobotBlueprint`].
//!
//! The entry point is [`RobotInterpreter`]. Configure it with a [`RobotConfig`],
//! then call [`RobotInterpreter::build_blueprint`] with a program, usually the
//! one produced by [`crate::normalize::lower`].

use crate::blueprint::{
    JointDefinition, JointLimit, ModuleId, RobotBlueprint, RobotModule, ShapePrimitive,
};
use crate::turtle::{RobotOp, RobotTurtleState, TurtleProgram};
use bevy_heavy::ComputeMassProperties3d as _;
use glam::{Quat, Vec3};
use std::collections::HashMap;
use std::f32::consts::{FRAC_PI_2, PI};

/// Configuration for robot interpretation.
#[derive(Clone, Debug)]
pub struct RobotConfig {
    /// Default length/height for shapes if no parameter is provided.
    pub default_length: f32,
    /// Default width/radius for shapes.
    pub default_width: f32,
    /// Default density (kg/m^3) for calculating mass.
    pub default_density: f32,
    /// Default rotation angle (in radians) for Yaw/Pitch/Roll.
    pub default_angle: f32,
    /// Maximum stack depth for push/pop operations.
    pub max_stack_depth: usize,
    /// Orientation of the turtle before the first command. The default turns the
    /// growth axis from +Y to +X so the base link lies along the ground.
    pub initial_rotation: Quat,
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            default_length: 1.0,
            default_width: 0.2,
            default_density: 100.0,
            default_angle: 45.0f32.to_radians(),
            max_stack_depth: 1024,
            initial_rotation: Quat::from_rotation_z(-FRAC_PI_2),
        }
    }
}

/// Interprets a turtle program to build a RobotBlueprint.
#[derive(Clone, Debug, Default)]
pub struct RobotInterpreter {
    config: RobotConfig,
}

impl RobotInterpreter {
    /// Creates a new interpreter with the given configuration.
    pub fn new(config: RobotConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RobotConfig {
        &self.config
    }

    /// Interprets the full `program` and returns the resulting [`RobotBlueprint`].
    ///
    /// Walks every command in order. The turtle starts at the origin with
    /// [`RobotConfig::initial_rotation`].
    ///
    /// # Geometry placement
    ///
    /// When a spawn command is encountered:
    /// 1. A [`RobotModule`] is spawned whose pivot (bottom) is at the turtle's current position.
    /// 2. The module's center is placed at `turtle_pos + up × (height / 2)`.
    /// 3. If a previous module exists, a [`JointDefinition`] is created connecting it to the new one.
    /// 4. The turtle advances to the distal end: `turtle_pos + up × height`.
    ///
    /// # Push / Pop
    ///
    /// `[` saves the full turtle state (position, rotation, current module, joint config, width,
    /// material, density) onto a stack. `]` restores it. This enables branching morphologies.
    /// Pushes beyond `max_stack_depth` are silently dropped.
    pub fn build_blueprint(&self, program: &TurtleProgram) -> RobotBlueprint {
        let mut blueprint = RobotBlueprint::default();
        let mut turtle = RobotTurtleState {
            rotation: self.config.initial_rotation,
            width: self.config.default_width,
            density: self.config.default_density,
            ..Default::default()
        };
        let mut stack = Vec::new();

        // World-space transform of every module spawned so far, needed for
        // relative joint anchors.
        let mut module_transforms: HashMap<ModuleId, (Vec3, Quat)> = HashMap::new();
        let mut next_module_id: ModuleId = 0;

        for command in &program.commands {
            let op = command.op;
            let p = |idx: usize, def: f32| -> f32 { command.params.get(idx).copied().unwrap_or(def) };
            let default_degrees = self.config.default_angle.to_degrees();

            match op {
                // --- SPATIAL ---
                RobotOp::Move => {
                    let len = p(0, self.config.default_length);
                    turtle.position += turtle.up() * len;
                }
                RobotOp::Yaw(s) => turtle.rotate_local_z(p(0, default_degrees).to_radians() * s),
                RobotOp::Pitch(s) => turtle.rotate_local_x(p(0, default_degrees).to_radians() * s),
                RobotOp::Roll(s) => turtle.rotate_local_y(p(0, default_degrees).to_radians() * s),

                // --- GEOMETRY ---
                RobotOp::SpawnBox
                | RobotOp::SpawnCylinder
                | RobotOp::SpawnSphere
                | RobotOp::SpawnCapsule => {
                    let id = next_module_id;
                    next_module_id = next_module_id.saturating_add(1);

                    // Default growth axis is the turtle's local Y.
                    let (shape, height_axis_len) = match op {
                        RobotOp::SpawnBox => {
                            let len = p(0, self.config.default_length).abs();
                            let wid = p(1, turtle.width).abs();
                            let hgt = p(2, turtle.width).abs();
                            (
                                ShapePrimitive::Box(Vec3::new(wid / 2.0, len / 2.0, hgt / 2.0)),
                                len,
                            )
                        }
                        RobotOp::SpawnCylinder => {
                            let len = p(0, self.config.default_length).abs();
                            let rad = p(1, turtle.width / 2.0).abs();
                            (
                                ShapePrimitive::Cylinder {
                                    radius: rad,
                                    height: len,
                                },
                                len,
                            )
                        }
                        RobotOp::SpawnCapsule => {
                            let len = p(0, self.config.default_length).abs();
                            let rad = p(1, turtle.width / 2.0).abs();
                            (
                                ShapePrimitive::Capsule {
                                    radius: rad,
                                    height: len,
                                },
                                len,
                            )
                        }
                        _ => {
                            let rad = p(0, turtle.width / 2.0).abs();
                            (ShapePrimitive::Sphere(rad), rad * 2.0)
                        }
                    };

                    // The turtle sits at the module's pivot (its bottom), so the
                    // centre is half a height further along the growth axis.
                    let module_center_pos =
                        turtle.position + (turtle.up() * (height_axis_len / 2.0));
                    let module_rotation = turtle.rotation;

                    let density = turtle.density;
                    let mass = shape.to_bevy_primitive().mass(density);
                    blueprint.add_module(
                        id,
                        RobotModule {
                            shape,
                            mass,
                            density,
                            material_id: turtle.material_id,
                            transform: (module_center_pos, module_rotation),
                        },
                    );
                    module_transforms.insert(id, (module_center_pos, module_rotation));

                    if let Some(parent_id) = turtle.current_module_id
                        && let Some((parent_pos, parent_rot)) = module_transforms.get(&parent_id)
                    {
                        // Anchor on parent: turtle position in parent local space.
                        let world_offset = turtle.position - *parent_pos;
                        let anchor_parent = parent_rot.inverse() * world_offset;

                        // The child's pivot is its bottom face.
                        let anchor_child = Vec3::new(0.0, -height_axis_len / 2.0, 0.0);

                        // Joint axis is configured in the turtle frame; store it in
                        // parent local space.
                        let global_axis = turtle.rotation * turtle.joint_config.axis;
                        let local_axis = parent_rot.inverse() * global_axis;

                        blueprint.add_joint(JointDefinition {
                            parent_id,
                            child_id: id,
                            anchor_parent,
                            anchor_child,
                            joint_type: turtle.joint_config.joint_type,
                            axis: local_axis,
                            limits: turtle.joint_config.limits,
                        });
                    }

                    turtle.position += turtle.up() * height_axis_len;
                    turtle.current_module_id = Some(id);
                }

                // --- CONFIG ---
                RobotOp::SetJointType(t) => turtle.joint_config.joint_type = t,
                RobotOp::SetJointAxis => {
                    let axis = Vec3::new(p(0, 1.0), p(1, 0.0), p(2, 0.0));
                    turtle.joint_config.axis = axis.try_normalize().unwrap_or(Vec3::X);
                }
                RobotOp::SetJointLimits => {
                    let a = p(0, -PI);
                    let b = p(1, PI);
                    // Grammar attributes can describe limits in either order.
                    let (min, max) = if a <= b { (a, b) } else { (b, a) };
                    let effort = p(2, 100.0);
                    let vel = p(3, 10.0);
                    turtle.joint_config.limits = Some(JointLimit {
                        min,
                        max,
                        effort,
                        velocity: vel,
                    });
                }
                RobotOp::SetMaterial => turtle.material_id = p(0, 0.0) as u8,
                RobotOp::SetWidth => turtle.width = p(0, turtle.width),
                RobotOp::SetDensity => turtle.density = p(0, turtle.density),

                // --- FLOW ---
                RobotOp::Push => {
                    if stack.len() < self.config.max_stack_depth {
                        stack.push(turtle.clone());
                    }
                }
                RobotOp::Pop => {
                    if let Some(state) = stack.pop() {
                        turtle = state;
                    }
                }
            }
        }

        blueprint
    }
}
