use glam::{Mat4, Quat, Vec2, Vec3};
use prism_ecs::{Camera, Entity, Registry};
use prism_input::CameraInput;
use std::f32::consts::FRAC_PI_4;

/// Radians of rotation per pixel of mouse motion.
pub const LOOK_SENSITIVITY: f32 = 0.003;

/// Elevation limit for mouse-look, in radians (89 degrees).
const MAX_PITCH: f32 = 1.553_343;

/// View and projection for one frame. Left-handed, depth in 0..1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraMatrices {
    pub view: Mat4,
    pub projection: Mat4,
    pub view_projection: Mat4,
    pub eye: Vec3,
}

impl CameraMatrices {
    fn new(view: Mat4, projection: Mat4, eye: Vec3) -> Self {
        Self {
            view,
            projection,
            view_projection: projection * view,
            eye,
        }
    }
}

/// The camera that drives the frame: the lowest-id entity with a `Camera`.
pub fn main_camera(registry: &Registry) -> Option<Entity> {
    registry.first_with::<Camera>()
}

pub fn camera_matrices(camera: &Camera) -> CameraMatrices {
    let look = camera.look_direction.try_normalize().unwrap_or(Vec3::Z);
    let view = Mat4::look_to_lh(camera.position, look, Vec3::Y);
    let projection = Mat4::perspective_lh(
        camera.fov_y,
        camera.aspect_ratio,
        camera.near_plane,
        camera.far_plane,
    );
    CameraMatrices::new(view, projection, camera.position)
}

/// Matrices used when the scene has no camera.
pub fn fallback_matrices(aspect_ratio: f32) -> CameraMatrices {
    let eye = Vec3::new(0.0, 0.0, -5.0);
    let view = Mat4::look_at_lh(eye, Vec3::ZERO, Vec3::Y);
    let projection = Mat4::perspective_lh(FRAC_PI_4, aspect_ratio, 0.01, 100.0);
    CameraMatrices::new(view, projection, eye)
}

/// Translate `camera` along its own axes. Returns whether it moved.
pub fn apply_movement(camera: &mut Camera, input: &CameraInput, dt: f32) -> bool {
    let look = camera.look_direction.try_normalize().unwrap_or(Vec3::Z);
    let right = Vec3::Y.cross(look).try_normalize().unwrap_or(Vec3::X);
    let up = look.cross(right);

    let mut direction = Vec3::ZERO;
    if input.forward {
        direction += look;
    }
    if input.backward {
        direction -= look;
    }
    if input.right {
        direction += right;
    }
    if input.left {
        direction -= right;
    }
    if input.up {
        direction += up;
    }
    if input.down {
        direction -= up;
    }

    camera.look_direction = look;
    if direction == Vec3::ZERO || dt <= 0.0 {
        return false;
    }
    camera.position += direction * camera.move_speed * dt;
    true
}

/// Rotate the look direction: `delta.y` pitches about the camera's right
/// axis, `delta.x` yaws about world up. Pitch is clamped short of vertical.
pub fn apply_mouse_look(camera: &mut Camera, delta: Vec2) {
    if delta == Vec2::ZERO {
        return;
    }
    let look = camera.look_direction.try_normalize().unwrap_or(Vec3::Z);
    let pitch = look.y.clamp(-1.0, 1.0).asin();
    let pitch = (pitch - delta.y * LOOK_SENSITIVITY).clamp(-MAX_PITCH, MAX_PITCH);

    let heading = Vec3::new(look.x, 0.0, look.z)
        .try_normalize()
        .unwrap_or(Vec3::Z);
    let heading = Quat::from_rotation_y(delta.x * LOOK_SENSITIVITY) * heading;

    camera.look_direction = (heading * pitch.cos() + Vec3::Y * pitch.sin()).normalize();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_near(actual: Vec3, expected: Vec3) {
        assert!(
            actual.abs_diff_eq(expected, 1e-4),
            "expected {expected:?}, got {actual:?}"
        );
    }

    fn facing_z() -> Camera {
        Camera::looking(Vec3::ZERO, Vec3::Z)
    }

    #[test]
    fn lowest_id_camera_is_main() {
        let mut registry = Registry::new();
        let first = registry.create_entity().unwrap();
        let second = registry.create_entity().unwrap();
        registry.add_component(second, Camera::default());
        registry.add_component(first, Camera::default());
        assert_eq!(main_camera(&registry), Some(first));
    }

    #[test]
    fn no_camera_resolves_none() {
        let registry = Registry::new();
        assert_eq!(main_camera(&registry), None);
    }

    #[test]
    fn view_moves_target_onto_positive_z() {
        let camera = Camera::looking(Vec3::new(1.0, 2.0, 3.0), Vec3::X);
        let m = camera_matrices(&camera);
        let target = m.view.transform_point3(camera.position + Vec3::X * 4.0);
        assert_near(target, Vec3::new(0.0, 0.0, 4.0));
        assert_eq!(m.eye, camera.position);
    }

    #[test]
    fn projection_maps_near_and_far_to_unit_depth() {
        let camera = Camera::default();
        let m = camera_matrices(&camera);
        let near = m.projection.project_point3(Vec3::new(0.0, 0.0, camera.near_plane));
        let far = m.projection.project_point3(Vec3::new(0.0, 0.0, camera.far_plane));
        assert!((near.z - 0.0).abs() < 1e-5);
        assert!((far.z - 1.0).abs() < 1e-5);
    }

    #[test]
    fn fallback_looks_at_origin() {
        let m = fallback_matrices(16.0 / 9.0);
        assert_eq!(m.eye, Vec3::new(0.0, 0.0, -5.0));
        let origin = m.view.transform_point3(Vec3::ZERO);
        assert_near(origin, Vec3::new(0.0, 0.0, 5.0));
    }

    #[test]
    fn forward_moves_along_look() {
        let mut camera = facing_z();
        let input = CameraInput {
            forward: true,
            ..CameraInput::default()
        };
        assert!(apply_movement(&mut camera, &input, 0.5));
        assert_near(camera.position, Vec3::new(0.0, 0.0, 2.5));
    }

    #[test]
    fn strafe_right_is_positive_x_when_facing_z() {
        let mut camera = facing_z();
        let input = CameraInput {
            right: true,
            up: true,
            ..CameraInput::default()
        };
        apply_movement(&mut camera, &input, 1.0);
        assert_near(camera.position, Vec3::new(5.0, 5.0, 0.0));
    }

    #[test]
    fn opposing_keys_cancel() {
        let mut camera = facing_z();
        let input = CameraInput {
            left: true,
            right: true,
            ..CameraInput::default()
        };
        assert!(!apply_movement(&mut camera, &input, 1.0));
        assert_eq!(camera.position, Vec3::ZERO);
    }

    #[test]
    fn movement_renormalizes_look() {
        let mut camera = facing_z();
        camera.look_direction = Vec3::new(0.0, 0.0, 3.0);
        apply_movement(&mut camera, &CameraInput::default(), 0.016);
        assert_eq!(camera.look_direction, Vec3::Z);
    }

    #[test]
    fn mouse_right_turns_right() {
        let mut camera = facing_z();
        apply_mouse_look(&mut camera, Vec2::new(100.0, 0.0));
        assert!(camera.look_direction.x > 0.0);
        assert!((camera.look_direction.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn mouse_down_looks_down() {
        let mut camera = facing_z();
        apply_mouse_look(&mut camera, Vec2::new(0.0, 100.0));
        assert!(camera.look_direction.y < 0.0);
    }

    #[test]
    fn pitch_stops_short_of_vertical() {
        let mut camera = facing_z();
        for _ in 0..100 {
            apply_mouse_look(&mut camera, Vec2::new(0.0, -200.0));
        }
        assert!(camera.look_direction.y <= MAX_PITCH.sin() + 1e-5);
        assert!(camera.look_direction.z > 0.0);
    }
}
