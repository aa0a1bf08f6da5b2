use prism_ecs::{Material, Mesh, SamplerHandle, TextureHandle};
use prism_render::mesh::{self, MeshData};
use prism_render::{RenderBackend, SamplerFilter, TextureData};

/// Radius of the shared sphere mesh. Other radii scale the transform.
pub const SPHERE_RADIUS: f32 = 1.0;
pub const SPHERE_SLICES: u32 = 20;
pub const SPHERE_STACKS: u32 = 20;
pub const PLANE_SIZE: f32 = 10.0;
pub const PLANE_DIVISIONS: u32 = 10;

const OBJECT_TEXTURE: ([u8; 4], [u8; 4]) = ([150, 146, 140, 255], [112, 108, 104, 255]);
const GROUND_TEXTURE: ([u8; 4], [u8; 4]) = ([120, 104, 84, 255], [84, 74, 62, 255]);

/// Meshes, textures and the sampler shared by every scene entity.
///
/// Uploaded once; entities only copy the handles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneAssets {
    pub cube: Mesh,
    pub sphere: Mesh,
    pub plane: Mesh,
    pub object_texture: TextureHandle,
    pub ground_texture: TextureHandle,
    pub sampler: SamplerHandle,
}

impl SceneAssets {
    pub fn load<B: RenderBackend>(backend: &mut B) -> Result<Self, B::Error> {
        let cube = backend.create_mesh(&mesh::cube())?;
        let sphere = backend.create_mesh(&mesh::sphere(SPHERE_RADIUS, SPHERE_SLICES, SPHERE_STACKS))?;
        let plane = backend.create_mesh(&ground_mesh())?;
        let object_texture =
            backend.create_texture(&TextureData::checker(64, 8, OBJECT_TEXTURE.0, OBJECT_TEXTURE.1))?;
        let ground_texture =
            backend.create_texture(&TextureData::checker(256, 16, GROUND_TEXTURE.0, GROUND_TEXTURE.1))?;
        let sampler = backend.create_sampler(SamplerFilter::Linear)?;

        tracing::debug!(
            cube_indices = cube.index_count,
            sphere_indices = sphere.index_count,
            plane_indices = plane.index_count,
            "scene assets loaded"
        );
        Ok(Self {
            cube,
            sphere,
            plane,
            object_texture,
            ground_texture,
            sampler,
        })
    }

    pub fn object_material(&self) -> Material {
        Material {
            diffuse_texture: Some(self.object_texture),
            sampler: Some(self.sampler),
            ..Material::default()
        }
    }

    pub fn ground_material(&self) -> Material {
        Material {
            diffuse_texture: Some(self.ground_texture),
            sampler: Some(self.sampler),
            specular_power: 8.0,
            ..Material::default()
        }
    }
}

fn ground_mesh() -> MeshData {
    mesh::plane(PLANE_SIZE, PLANE_SIZE, PLANE_DIVISIONS, PLANE_DIVISIONS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_render::{BackendCall, RecordingBackend};

    #[test]
    fn load_uploads_three_meshes_two_textures_one_sampler() {
        let mut backend = RecordingBackend::new(64, 64);
        let assets = SceneAssets::load(&mut backend).unwrap();

        let uploads = backend
            .calls()
            .iter()
            .filter(|c| matches!(c, BackendCall::UploadMesh { .. }))
            .count();
        let textures = backend
            .calls()
            .iter()
            .filter(|c| matches!(c, BackendCall::CreateTexture { .. }))
            .count();
        let samplers = backend
            .calls()
            .iter()
            .filter(|c| matches!(c, BackendCall::CreateSampler { .. }))
            .count();
        assert_eq!((uploads, textures, samplers), (3, 2, 1));

        assert_eq!(assets.cube.index_count, 36);
        assert_eq!(assets.sphere.index_count, 20 * (2 * 20 - 2) * 3);
        assert_ne!(assets.cube.handle, assets.sphere.handle);
    }

    #[test]
    fn ground_material_uses_ground_texture() {
        let mut backend = RecordingBackend::new(64, 64);
        let assets = SceneAssets::load(&mut backend).unwrap();
        let ground = assets.ground_material();
        assert_eq!(ground.diffuse_texture, Some(assets.ground_texture));
        assert_eq!(ground.normal_texture, None);
        assert_eq!(assets.object_material().sampler, Some(assets.sampler));
    }
}
