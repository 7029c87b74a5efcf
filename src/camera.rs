//! Camera parameters and automatic framing.

use crate::world::RobotPose;
use glam::{Mat4, Vec3};
use std::f32::consts::PI;

/// An orbit camera: it looks at `position` from `distance` away, turned by
/// `yaw` about the vertical axis and tilted by `pitch`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraParams {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
}

impl CameraParams {
    /// Terrain-only viewpoint.
    pub const TERRAIN: CameraParams = CameraParams {
        position: Vec3::new(1.0, 0.0, 0.0),
        yaw: -PI / 3.0,
        pitch: -PI / 6.0,
        distance: 5.0,
    };

    /// World-to-camera transform, Y up.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_translation(Vec3::new(0.0, 0.0, -self.distance))
            * Mat4::from_rotation_x(-self.pitch)
            * Mat4::from_rotation_y(-self.yaw)
            * Mat4::from_translation(-self.position)
    }

    /// World position of the camera.
    pub fn eye(&self) -> Vec3 {
        self.view_matrix().inverse().transform_point3(Vec3::ZERO)
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite()
            && self.yaw.is_finite()
            && self.pitch.is_finite()
            && self.distance.is_finite()
    }
}

/// Computes the camera for a snapshot.
///
/// With a robot, the camera orbits its base link at fixed canonical angles and
/// backs off twice the diagonal of its world bounds, so designs of any size fill
/// a similar share of the frame. Without one, a fixed terrain view is used.
pub fn frame_scene(pose: Option<&RobotPose>) -> CameraParams {
    match pose {
        Some(pose) => CameraParams {
            position: pose.base_position,
            yaw: PI / 3.0,
            pitch: -PI / 6.0,
            distance: 2.0 * pose.bounds.diagonal(),
        },
        None => CameraParams::TERRAIN,
    }
}
