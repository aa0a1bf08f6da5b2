use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};
use std::f32::consts::FRAC_PI_4;

/// A handle to GPU-resident vertex and index buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MeshHandle(pub u32);

/// A handle to a GPU texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TextureHandle(pub u32);

/// A handle to a GPU sampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SamplerHandle(pub u32);

/// Perspective camera state. The view is derived from these fields every frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub position: Vec3,
    /// Unit vector the camera faces.
    pub look_direction: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    pub aspect_ratio: f32,
    pub near_plane: f32,
    pub far_plane: f32,
    /// World units per second.
    pub move_speed: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, -5.0),
            look_direction: Vec3::Z,
            fov_y: FRAC_PI_4,
            aspect_ratio: 16.0 / 9.0,
            near_plane: 0.1,
            far_plane: 100.0,
            move_speed: 5.0,
        }
    }
}

impl Camera {
    pub fn looking(position: Vec3, look_direction: Vec3) -> Self {
        Self {
            position,
            look_direction: look_direction.try_normalize().unwrap_or(Vec3::Z),
            ..Self::default()
        }
    }

    pub fn target(&self) -> Vec3 {
        self.position + self.look_direction
    }
}

/// Uploaded geometry referenced by a renderable entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mesh {
    pub handle: MeshHandle,
    pub index_count: u32,
    pub vertex_stride: u32,
}

/// Surface parameters. Missing textures fall back to the backend defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub diffuse_texture: Option<TextureHandle>,
    pub normal_texture: Option<TextureHandle>,
    pub sampler: Option<SamplerHandle>,
    pub diffuse_color: Vec4,
    pub specular_power: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            diffuse_texture: None,
            normal_texture: None,
            sampler: None,
            diffuse_color: Vec4::ONE,
            specular_power: 32.0,
        }
    }
}

impl Material {
    pub fn colored(diffuse_color: Vec4) -> Self {
        Self {
            diffuse_color,
            ..Self::default()
        }
    }
}

/// Which lighting model a light component feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LightKind {
    Directional,
    Point,
    Spot,
}

impl LightKind {
    /// Numeric tag shared with the shaders.
    pub fn tag(self) -> u32 {
        match self {
            Self::Directional => 0,
            Self::Point => 1,
            Self::Spot => 2,
        }
    }
}

/// Fields every light carries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightCommon {
    pub ambient: Vec4,
    pub diffuse: Vec4,
    pub intensity: f32,
    pub enabled: bool,
}

impl Default for LightCommon {
    fn default() -> Self {
        Self {
            ambient: Vec4::new(0.2, 0.2, 0.2, 1.0),
            diffuse: Vec4::new(0.8, 0.8, 0.8, 1.0),
            intensity: 1.0,
            enabled: true,
        }
    }
}

impl LightCommon {
    pub fn with_color(diffuse: Vec4) -> Self {
        Self {
            diffuse,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DirectionalLight {
    pub common: LightCommon,
    pub direction: Vec3,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            common: LightCommon::default(),
            direction: Vec3::new(1.0, -1.0, 1.0).normalize(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointLight {
    pub common: LightCommon,
    pub position: Vec3,
    pub range: f32,
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            common: LightCommon::default(),
            position: Vec3::ZERO,
            range: 10.0,
        }
    }
}

/// Cone light. Cone angles are half-angles in radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpotLight {
    pub common: LightCommon,
    pub position: Vec3,
    pub direction: Vec3,
    pub range: f32,
    pub inner_cone: f32,
    pub outer_cone: f32,
}

impl Default for SpotLight {
    fn default() -> Self {
        Self {
            common: LightCommon::default(),
            position: Vec3::ZERO,
            direction: Vec3::Z,
            range: 10.0,
            inner_cone: 0.0,
            outer_cone: FRAC_PI_4,
        }
    }
}

/// Shared view over the three light components.
pub trait Light {
    const LIGHT_KIND: LightKind;

    fn common(&self) -> &LightCommon;
    fn common_mut(&mut self) -> &mut LightCommon;
}

impl Light for DirectionalLight {
    const LIGHT_KIND: LightKind = LightKind::Directional;

    fn common(&self) -> &LightCommon {
        &self.common
    }

    fn common_mut(&mut self) -> &mut LightCommon {
        &mut self.common
    }
}

impl Light for PointLight {
    const LIGHT_KIND: LightKind = LightKind::Point;

    fn common(&self) -> &LightCommon {
        &self.common
    }

    fn common_mut(&mut self) -> &mut LightCommon {
        &mut self.common
    }
}

impl Light for SpotLight {
    const LIGHT_KIND: LightKind = LightKind::Spot;

    fn common(&self) -> &LightCommon {
        &self.common
    }

    fn common_mut(&mut self) -> &mut LightCommon {
        &mut self.common
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera_defaults() {
        let cam = Camera::default();
        assert_eq!(cam.position, Vec3::new(0.0, 0.0, -5.0));
        assert_eq!(cam.look_direction, Vec3::Z);
        assert_eq!(cam.target(), Vec3::new(0.0, 0.0, -4.0));
        assert_eq!(cam.move_speed, 5.0);
    }

    #[test]
    fn camera_looking_normalizes() {
        let cam = Camera::looking(Vec3::ZERO, Vec3::new(0.0, 0.0, 4.0));
        assert_eq!(cam.look_direction, Vec3::Z);
        // degenerate look falls back to +Z
        let cam = Camera::looking(Vec3::ZERO, Vec3::ZERO);
        assert_eq!(cam.look_direction, Vec3::Z);
    }

    #[test]
    fn light_defaults_are_enabled() {
        assert!(DirectionalLight::default().common().enabled);
        assert!(PointLight::default().common().enabled);
        assert!(SpotLight::default().common().enabled);
        assert_eq!(SpotLight::default().outer_cone, FRAC_PI_4);
    }

    #[test]
    fn light_kind_tags() {
        assert_eq!(<DirectionalLight as Light>::LIGHT_KIND.tag(), 0);
        assert_eq!(<PointLight as Light>::LIGHT_KIND.tag(), 1);
        assert_eq!(<SpotLight as Light>::LIGHT_KIND.tag(), 2);
    }

    #[test]
    fn material_default_is_white() {
        let m = Material::default();
        assert_eq!(m.diffuse_color, Vec4::ONE);
        assert_eq!(m.specular_power, 32.0);
        assert!(m.diffuse_texture.is_none());
    }
}
