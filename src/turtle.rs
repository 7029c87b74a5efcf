//! Turtle state and operations for robotic interpretation.

use crate::blueprint::{JointLimit, JointType, MaterialId, ModuleId};
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Configuration for the next joint to be created.
///
/// This acts as a "pen style" for physics. When the turtle spawns a new module attached
/// to an existing one, it uses these settings to create the connection.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ActiveJointConfig {
    /// The mechanical type of the connection (Hinge, Fixed, etc.).
    pub joint_type: JointType,

    /// The axis of rotation/translation relative to the turtle's orientation.
    /// Defaults to X-axis (Pitch).
    pub axis: Vec3,

    /// Physical limits (angle, velocity, effort).
    pub limits: Option<JointLimit>,
}

impl Default for ActiveJointConfig {
    fn default() -> Self {
        Self {
            joint_type: JointType::Fixed, // Default to rigid welding
            axis: Vec3::X,
            limits: None,
        }
    }
}

/// The state of the Robot Builder Turtle.
///
/// Tracks position, orientation, and the topological context (which module we are currently extending).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RobotTurtleState {
    /// Current position of the "cursor" in the robot frame.
    pub position: Vec3,

    /// Current orientation in the robot frame.
    pub rotation: Quat,

    /// The ID of the module (rigid body) the turtle is currently "standing on".
    /// If this is Some(id), the NEXT spawned module will be jointed to this one.
    pub current_module_id: Option<ModuleId>,

    /// Configuration for the next joint creation.
    pub joint_config: ActiveJointConfig,

    /// Current material ID for new modules.
    pub material_id: MaterialId,

    /// Current default width/radius for shapes.
    pub width: f32,

    /// Current density (kg/m^3) for new modules.
    pub density: f32,
}

impl Default for RobotTurtleState {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            current_module_id: None,
            joint_config: ActiveJointConfig::default(),
            material_id: 0,
            width: 0.1,
            density: 100.0,
        }
    }
}

impl RobotTurtleState {
    /// Returns the turtle's local up direction (Y-axis), the growth direction.
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    /// Rotates the turtle around its local X axis by `angle` radians (Pitch).
    pub fn rotate_local_x(&mut self, angle: f32) {
        let rot = Quat::from_axis_angle(Vec3::X, angle);
        self.rotation *= rot;
    }

    /// Rotates the turtle around its local Y axis by `angle` radians (Roll).
    pub fn rotate_local_y(&mut self, angle: f32) {
        let rot = Quat::from_axis_angle(Vec3::Y, angle);
        self.rotation *= rot;
    }

    /// Rotates the turtle around its local Z axis by `angle` radians (Yaw).
    pub fn rotate_local_z(&mut self, angle: f32) {
        let rot = Quat::from_axis_angle(Vec3::Z, angle);
        self.rotation *= rot;
    }
}

/// Operations that can be performed by the robot turtle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RobotOp {
    // --- Spatial Navigation ---
    /// Move along the growth axis without spawning geometry (`f`). Params: `(length)`.
    Move,
    /// Rotate around Z (`+`/`-`). Params: `(degrees)`.
    Yaw(f32),
    /// Rotate around X (`&`/`^`). Params: `(degrees)`.
    Pitch(f32),
    /// Rotate around Y (`\` / `/`). Params: `(degrees)`.
    Roll(f32),

    // --- Geometry Spawning (The Body) ---
    /// Spawn a Box shape. Params: `(length, width, height)`.
    /// If params missing, uses `(default_length, width, width)`.
    SpawnBox,
    /// Spawn a Cylinder shape. Params: `(length, radius)`.
    SpawnCylinder,
    /// Spawn a Sphere shape. Params: `(radius)`.
    SpawnSphere,
    /// Spawn a Capsule shape. Params: `(length, radius)`.
    SpawnCapsule,

    // --- Configuration (The Physics) ---
    /// Set the type of the NEXT joint to be created.
    SetJointType(JointType),
    /// Set the axis of the NEXT joint. Params: `(x, y, z)`.
    SetJointAxis,
    /// Set joint limits. Params: `(min, max, effort, velocity)`.
    SetJointLimits,
    /// Set the Material ID for visual rendering.
    SetMaterial,
    /// Set the default width/radius for subsequent shapes.
    SetWidth,
    /// Set the density for subsequent shapes.
    SetDensity,

    // --- Flow Control ---
    /// Save the full turtle state onto the stack (`[`).
    Push,
    /// Restore the most recently pushed turtle state (`]`).
    Pop,
}

impl RobotOp {
    /// Conventional symbol for the operation, used when printing programs.
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Move => "f",
            Self::Yaw(s) if *s < 0.0 => "-",
            Self::Yaw(_) => "+",
            Self::Pitch(s) if *s < 0.0 => "^",
            Self::Pitch(_) => "&",
            Self::Roll(s) if *s < 0.0 => "/",
            Self::Roll(_) => "\\",
            Self::SpawnBox => "B",
            Self::SpawnCylinder => "C",
            Self::SpawnSphere => "O",
            Self::SpawnCapsule => "K",
            Self::SetJointType(JointType::Hinge) => "J",
            Self::SetJointType(JointType::Fixed) => "Jf",
            Self::SetJointType(JointType::Ball) => "Jb",
            Self::SetJointType(JointType::Prismatic) => "Jp",
            Self::SetJointAxis => "Ja",
            Self::SetJointLimits => "Jl",
            Self::SetMaterial => "'",
            Self::SetWidth => "!",
            Self::SetDensity => "d",
            Self::Push => "[",
            Self::Pop => "]",
        }
    }
}

/// A single turtle operation together with its numeric parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct TurtleCommand {
    pub op: RobotOp,
    pub params: Vec<f32>,
}

impl TurtleCommand {
    pub fn new(op: RobotOp, params: &[f32]) -> Self {
        Self {
            op,
            params: params.to_vec(),
        }
    }
}

/// A linear turtle program, the form a normalized graph is lowered to.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TurtleProgram {
    pub commands: Vec<TurtleCommand>,
}

impl TurtleProgram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, op: RobotOp, params: &[f32]) {
        self.commands.push(TurtleCommand::new(op, params));
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl fmt::Display for TurtleProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, cmd) in self.commands.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            f.write_str(cmd.op.symbol())?;
            if !cmd.params.is_empty() {
                let params: Vec<String> = cmd.params.iter().map(|p| format!("{p}")).collect();
                write!(f, "({})", params.join(","))?;
            }
        }
        Ok(())
    }
}
