use crate::camera::CameraMatrices;
use crate::frame::{FrameStats, RenderSettings};
use crate::lighting::LightUniforms;
use crate::mesh::MeshData;
use glam::{Mat4, Vec4};
use prism_ecs::{Entity, Material, Mesh, MeshHandle, Registry, SamplerHandle, TextureHandle};

/// Everything the backend uploads once per frame before drawing.
#[derive(Debug, Clone, Copy)]
pub struct FrameUniforms {
    pub clear_color: Vec4,
    pub camera: CameraMatrices,
    pub lights: LightUniforms,
}

/// One indexed draw of a mesh entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCall {
    pub entity: Entity,
    pub mesh: Mesh,
    pub world: Mat4,
    pub world_view_projection: Mat4,
    /// The entity's material, or `Material::default()` when it has none.
    pub material: Material,
}

/// RGBA8 pixels, row-major, tightly packed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl TextureData {
    pub fn solid(rgba: [u8; 4]) -> Self {
        Self {
            width: 1,
            height: 1,
            rgba: rgba.to_vec(),
        }
    }

    /// Square checkerboard of `size` pixels with `cells` squares per side.
    pub fn checker(size: u32, cells: u32, a: [u8; 4], b: [u8; 4]) -> Self {
        let size = size.max(1);
        let cell = (size / cells.max(1)).max(1);
        let mut rgba = Vec::with_capacity((size * size * 4) as usize);
        for y in 0..size {
            for x in 0..size {
                let even = ((x / cell) + (y / cell)) % 2 == 0;
                rgba.extend_from_slice(if even { &a } else { &b });
            }
        }
        Self {
            width: size,
            height: size,
            rgba,
        }
    }
}

/// Texture filtering for a sampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SamplerFilter {
    #[default]
    Linear,
    Nearest,
}

/// The GPU-facing collaborator driven by the frame orchestrator.
///
/// Buffers are created once and referenced by handle; per-frame calls only
/// overwrite uniform contents and record draws.
pub trait RenderBackend {
    type Error: std::error::Error + Send + Sync + 'static;

    fn upload_mesh(&mut self, mesh: &MeshData) -> Result<MeshHandle, Self::Error>;

    fn create_texture(&mut self, texture: &TextureData) -> Result<TextureHandle, Self::Error>;

    fn create_sampler(&mut self, filter: SamplerFilter) -> Result<SamplerHandle, Self::Error>;

    /// Reallocate size-dependent targets. Never called with a zero extent.
    fn resize(&mut self, width: u32, height: u32) -> Result<(), Self::Error>;

    fn set_wireframe(&mut self, enabled: bool);

    /// Upload frame uniforms and start the frame. `Ok(false)` means the
    /// frame cannot be drawn (e.g. the surface is being reconfigured) and
    /// the remaining steps are skipped.
    fn begin_frame(&mut self, frame: &FrameUniforms) -> Result<bool, Self::Error>;

    fn draw_indexed(&mut self, draw: &DrawCall);

    fn present(&mut self) -> Result<(), Self::Error>;

    /// Upload `data` and describe it as a `Mesh` component.
    fn create_mesh(&mut self, data: &MeshData) -> Result<Mesh, Self::Error> {
        let handle = self.upload_mesh(data)?;
        Ok(Mesh {
            handle,
            index_count: data.index_count(),
            vertex_stride: data.vertex_stride(),
        })
    }
}

/// What an overlay may touch while it draws.
pub struct OverlayContext<'a> {
    pub registry: &'a mut Registry,
    pub settings: &'a mut RenderSettings,
    pub stats: &'a FrameStats,
}

/// Debug UI drawn after the scene and before present.
pub trait DebugOverlay<B: RenderBackend> {
    fn draw(&mut self, ctx: OverlayContext<'_>, backend: &mut B) -> Result<(), B::Error>;
}

/// Overlay that draws nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOverlay;

impl<B: RenderBackend> DebugOverlay<B> for NoOverlay {
    fn draw(&mut self, _ctx: OverlayContext<'_>, _backend: &mut B) -> Result<(), B::Error> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checker_alternates_cells() {
        let white = [255; 4];
        let black = [0, 0, 0, 255];
        let tex = TextureData::checker(4, 2, white, black);
        assert_eq!(tex.rgba.len(), 4 * 4 * 4);
        // pixel (0,0) and (2,0)
        assert_eq!(&tex.rgba[0..4], &white);
        assert_eq!(&tex.rgba[8..12], &black);
        // pixel (0,2)
        let row2 = (2 * 4) * 4;
        assert_eq!(&tex.rgba[row2..row2 + 4], &black);
    }

    #[test]
    fn solid_is_one_pixel() {
        let tex = TextureData::solid([1, 2, 3, 4]);
        assert_eq!((tex.width, tex.height), (1, 1));
        assert_eq!(tex.rgba, vec![1, 2, 3, 4]);
    }
}
