// tests/framing.rs
use glam::Vec3;
use robot_snapshots::task::FlatTerrainTask;
use robot_snapshots::world::{placement_rotation, presimulate};
use robot_snapshots::{
    Aabb, CameraParams, RenderError, RenderSettings, Renderer, RobotInterpreter, RobotOp,
    RobotPose, SoftwareRenderer, Task, TurtleProgram, frame_scene,
};

fn small_settings() -> RenderSettings {
    RenderSettings {
        width: 64,
        height: 48,
        ..Default::default()
    }
}

#[test]
fn test_camera_backs_off_twice_the_diagonal() {
    let pose = RobotPose {
        base_position: Vec3::splat(0.5),
        bounds: Aabb::new(Vec3::ZERO, Vec3::ONE),
    };
    let camera = frame_scene(Some(&pose));

    assert_eq!(camera.position, pose.base_position);
    assert!((camera.distance - 2.0 * 3f32.sqrt()).abs() < 1e-5);
    assert!((camera.yaw - std::f32::consts::FRAC_PI_3).abs() < 1e-6);
    assert!((camera.pitch + std::f32::consts::FRAC_PI_6).abs() < 1e-6);

    // The camera sits above its target.
    assert!(camera.eye().y > pose.base_position.y);
}

#[test]
fn test_terrain_view_without_robot() {
    let camera = frame_scene(None);
    assert_eq!(camera, CameraParams::TERRAIN);
    assert_eq!(camera.position, Vec3::new(1.0, 0.0, 0.0));
    assert_eq!(camera.distance, 5.0);
}

#[test]
fn test_robot_shows_up_in_the_frame() {
    let mut program = TurtleProgram::new();
    program.push(RobotOp::SpawnCapsule, &[0.4, 0.05]);
    let robot = RobotInterpreter::default().build_blueprint(&program);

    let task = FlatTerrainTask;
    let mut world = task.make_world();
    let init = presimulate(&robot);
    let index = world.add_robot(robot, init, placement_rotation());
    world.step();
    let pose = world.robot_pose(index).unwrap();

    // Resting on the floor, behind the start line.
    assert!(pose.bounds.lower.y.abs() < 1e-4);
    assert!(pose.bounds.upper.x <= 1e-4);

    let camera = frame_scene(Some(&pose));
    let mut renderer = SoftwareRenderer::new(small_settings());
    let with_robot = renderer.render(&world, &camera).unwrap();
    let terrain_only = renderer.render(&task.make_world(), &camera).unwrap();

    assert_eq!(with_robot.dimensions(), (64, 48));
    let center = with_robot.get_pixel(32, 24);
    assert_ne!(center, terrain_only.get_pixel(32, 24));
    assert_ne!(center.0, small_settings().clear_rgba);
}

#[test]
fn test_bad_viewport_and_camera_are_errors() {
    let world = FlatTerrainTask.make_world();

    let mut empty = SoftwareRenderer::new(RenderSettings {
        width: 0,
        ..small_settings()
    });
    assert!(matches!(
        empty.render(&world, &CameraParams::TERRAIN),
        Err(RenderError::InvalidViewport {
            width: 0,
            height: 48
        })
    ));

    let mut huge = SoftwareRenderer::new(RenderSettings {
        width: 70_000,
        height: 70_000,
        ..small_settings()
    });
    assert!(matches!(
        huge.render(&world, &CameraParams::TERRAIN),
        Err(RenderError::InvalidViewport {
            width: 70_000,
            height: 70_000
        })
    ));

    let mut renderer = SoftwareRenderer::new(small_settings());
    let broken = CameraParams {
        yaw: f32::NAN,
        ..CameraParams::TERRAIN
    };
    assert!(matches!(
        renderer.render(&world, &broken),
        Err(RenderError::InvalidCamera(_))
    ));
}
