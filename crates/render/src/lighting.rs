use bytemuck::{Pod, Zeroable};
use glam::{Vec3, Vec4};
use prism_ecs::{
    DirectionalLight, Entity, Light, LightCommon, LightKind, PointLight, Registry, SpotLight,
};

/// Lights uploaded per frame. Enabled lights past this are dropped.
pub const MAX_LIGHTS: usize = 8;

/// Smallest gap kept between the inner and outer spot cone, in radians.
pub const MIN_CONE_GAP: f32 = 1e-3;

/// Ambient term used when no light contributes.
pub const DEFAULT_AMBIENT: Vec4 = Vec4::new(0.1, 0.1, 0.1, 1.0);

/// One light as laid out in the uniform buffer.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct GpuLight {
    /// Diffuse color premultiplied by intensity.
    pub color: [f32; 4],
    /// xyz position, w range.
    pub position_range: [f32; 4],
    /// xyz unit direction toward which the light shines.
    pub direction: [f32; 4],
    /// x cos(inner cone), y cos(outer cone).
    pub cone: [f32; 4],
    /// x holds the `LightKind` tag.
    pub kind: [u32; 4],
}

impl GpuLight {
    fn base(kind: LightKind, common: &LightCommon) -> Self {
        let color = common.diffuse.truncate() * common.intensity;
        Self {
            color: color.extend(1.0).to_array(),
            position_range: [0.0; 4],
            direction: [0.0; 4],
            cone: [0.0; 4],
            kind: [kind.tag(), 0, 0, 0],
        }
    }

    pub fn directional(light: &DirectionalLight) -> Self {
        let mut gpu = Self::base(LightKind::Directional, &light.common);
        gpu.direction = unit_or(light.direction, Vec3::NEG_Y).extend(0.0).to_array();
        gpu
    }

    pub fn point(light: &PointLight) -> Self {
        let mut gpu = Self::base(LightKind::Point, &light.common);
        gpu.position_range = light.position.extend(light.range).to_array();
        gpu
    }

    pub fn spot(light: &SpotLight) -> Self {
        let mut gpu = Self::base(LightKind::Spot, &light.common);
        gpu.position_range = light.position.extend(light.range).to_array();
        gpu.direction = unit_or(light.direction, Vec3::Z).extend(0.0).to_array();
        // The shader's smoothstep needs cos(outer) strictly below cos(inner).
        let outer = light.outer_cone.max(MIN_CONE_GAP);
        let inner = light.inner_cone.clamp(0.0, outer - MIN_CONE_GAP);
        gpu.cone = [inner.cos(), outer.cos(), 0.0, 0.0];
        gpu
    }
}

fn unit_or(v: Vec3, fallback: Vec3) -> Vec3 {
    v.try_normalize().unwrap_or(fallback)
}

/// Uniform block holding every light for one frame.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct LightUniforms {
    pub ambient: [f32; 4],
    /// x holds the number of valid entries in `lights`.
    pub count: [u32; 4],
    pub lights: [GpuLight; MAX_LIGHTS],
}

/// A light selected for upload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightEntry {
    pub entity: Entity,
    pub kind: LightKind,
    pub gpu: GpuLight,
}

/// The lights chosen for a frame plus how many enabled lights missed the cut.
#[derive(Debug, Clone, PartialEq)]
pub struct LightSet {
    pub ambient: Vec4,
    pub entries: Vec<LightEntry>,
    pub dropped: usize,
}

impl LightSet {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_uniforms(&self) -> LightUniforms {
        let mut lights = [GpuLight::zeroed(); MAX_LIGHTS];
        for (slot, entry) in lights.iter_mut().zip(&self.entries) {
            *slot = entry.gpu;
        }
        LightUniforms {
            ambient: self.ambient.to_array(),
            count: [self.entries.len() as u32, 0, 0, 0],
            lights,
        }
    }
}

fn enabled<'a, L: Light + prism_ecs::Component>(
    registry: &'a Registry,
    encode: fn(&L) -> GpuLight,
) -> impl Iterator<Item = (LightEntry, Vec4)> + 'a {
    registry
        .iter::<L>()
        .filter(|(_, light)| light.common().enabled)
        .map(move |(entity, light)| {
            let entry = LightEntry {
                entity,
                kind: L::LIGHT_KIND,
                gpu: encode(light),
            };
            (entry, light.common().ambient)
        })
}

/// Gather enabled lights: directional, then point, then spot, each in
/// ascending entity order. Everything past `MAX_LIGHTS` is dropped.
pub fn collect_lights(registry: &Registry) -> LightSet {
    let mut candidates: Vec<(LightEntry, Vec4)> = enabled(registry, GpuLight::directional)
        .chain(enabled(registry, GpuLight::point))
        .chain(enabled(registry, GpuLight::spot))
        .collect();

    let dropped = candidates.len().saturating_sub(MAX_LIGHTS);
    if dropped > 0 {
        tracing::debug!(dropped, cap = MAX_LIGHTS, "light cap exceeded");
    }
    candidates.truncate(MAX_LIGHTS);

    let ambient = candidates
        .first()
        .map(|(_, ambient)| *ambient)
        .unwrap_or(DEFAULT_AMBIENT);

    LightSet {
        ambient,
        entries: candidates.into_iter().map(|(entry, _)| entry).collect(),
        dropped,
    }
}
