use glam::{EulerRot, Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;

/// Opaque entity identity. Zero is reserved and never handed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Entity(NonZeroU32);

impl Entity {
    /// Wrap a raw id. Returns `None` for the reserved zero value.
    pub fn from_raw(raw: u32) -> Option<Self> {
        NonZeroU32::new(raw).map(Self)
    }

    pub fn raw(self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Spatial transform: position, Euler rotation (radians), scale.
///
/// `rotation.x` is pitch, `rotation.y` is yaw and `rotation.z` is roll. The
/// rotation is applied roll first, then pitch, then yaw.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn rotation_quat(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.rotation.y, self.rotation.x, self.rotation.z)
    }

    /// Object-to-world matrix. A point is scaled, rotated, then translated.
    pub fn world_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation_quat(), self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn assert_vec3_near(actual: Vec3, expected: Vec3) {
        assert!(
            actual.abs_diff_eq(expected, 1e-5),
            "expected {expected:?}, got {actual:?}"
        );
    }

    #[test]
    fn zero_is_not_an_entity() {
        assert!(Entity::from_raw(0).is_none());
        assert_eq!(Entity::from_raw(7).map(Entity::raw), Some(7));
    }

    #[test]
    fn entity_display() {
        let e = Entity::from_raw(42).unwrap();
        assert_eq!(e.to_string(), "#42");
    }

    #[test]
    fn transform_default_is_identity() {
        let t = Transform::default();
        assert_eq!(t.position, Vec3::ZERO);
        assert_eq!(t.rotation, Vec3::ZERO);
        assert_eq!(t.scale, Vec3::ONE);
        assert_eq!(t.world_matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn world_matrix_scales_then_rotates_then_translates() {
        let t = Transform {
            position: Vec3::new(1.0, 2.0, 3.0),
            rotation: Vec3::new(0.0, FRAC_PI_2, 0.0),
            scale: Vec3::splat(2.0),
        };
        // (1,0,0) -> scale (2,0,0) -> yaw 90 deg (0,0,-2) -> translate (1,2,1)
        let p = t.world_matrix().transform_point3(Vec3::X);
        assert_vec3_near(p, Vec3::new(1.0, 2.0, 1.0));
    }

    #[test]
    fn roll_applies_before_pitch() {
        let t = Transform::default().with_rotation(Vec3::new(FRAC_PI_2, 0.0, FRAC_PI_2));
        // roll 90 about Z takes +X to +Y, pitch 90 about X then takes +Y to +Z
        let p = t.world_matrix().transform_point3(Vec3::X);
        assert_vec3_near(p, Vec3::Z);
    }

    #[test]
    fn translation_ignores_scale() {
        let t = Transform::from_position(Vec3::new(0.0, 5.0, 0.0)).with_scale(Vec3::splat(10.0));
        let p = t.world_matrix().transform_point3(Vec3::ZERO);
        assert_vec3_near(p, Vec3::new(0.0, 5.0, 0.0));
    }
}
