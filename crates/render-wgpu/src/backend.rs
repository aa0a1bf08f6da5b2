use crate::GpuError;
use crate::device::GpuContext;
use crate::pipeline::{Layouts, MeshPipelines, create_depth_view};
use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use prism_ecs::{MeshHandle, SamplerHandle, TextureHandle};
use prism_render::{
    DrawCall, FrameUniforms, LightUniforms, MeshData, RenderBackend, SamplerFilter, TextureData,
};
use std::collections::HashMap;
use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct CameraUniforms {
    view_proj: [[f32; 4]; 4],
    eye: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct DrawUniforms {
    world: [[f32; 4]; 4],
    world_view_proj: [[f32; 4]; 4],
    normal_matrix: [[f32; 4]; 4],
    diffuse_color: [f32; 4],
    material: [f32; 4],
}

impl DrawUniforms {
    fn new(draw: &DrawCall) -> Self {
        let normal_matrix = if draw.world.determinant().abs() > 1e-8 {
            draw.world.inverse().transpose()
        } else {
            draw.world
        };
        Self {
            world: draw.world.to_cols_array_2d(),
            world_view_proj: draw.world_view_projection.to_cols_array_2d(),
            normal_matrix: normal_matrix.to_cols_array_2d(),
            diffuse_color: draw.material.diffuse_color.to_array(),
            material: [draw.material.specular_power.max(1.0), 0.0, 0.0, 0.0],
        }
    }
}

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

/// Per-draw uniforms packed at `stride` and bound with a dynamic offset.
struct DrawRing {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    stride: u64,
    capacity: usize,
}

impl DrawRing {
    fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, stride: u64, capacity: usize) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("draw_uniform_buffer"),
            size: stride * capacity as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("draw_bind_group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(std::mem::size_of::<DrawUniforms>() as u64),
                }),
            }],
        });
        Self {
            buffer,
            bind_group,
            stride,
            capacity,
        }
    }
}

type MaterialKey = (TextureHandle, TextureHandle, SamplerHandle);

struct ActiveFrame {
    surface_texture: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
    clear: wgpu::Color,
    draws: Vec<DrawCall>,
    scene_encoded: bool,
}

/// Borrowed GPU state for drawing on top of the finished scene pass.
pub struct OverlayTarget<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub view: &'a wgpu::TextureView,
    pub size: [u32; 2],
}

/// `RenderBackend` over a wgpu surface.
pub struct WgpuBackend {
    gpu: GpuContext,
    layouts: Layouts,
    pipelines: MeshPipelines,
    camera_buffer: wgpu::Buffer,
    light_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    draw_ring: DrawRing,
    depth_view: wgpu::TextureView,
    meshes: Vec<GpuMesh>,
    textures: Vec<wgpu::TextureView>,
    samplers: Vec<wgpu::Sampler>,
    material_groups: HashMap<MaterialKey, wgpu::BindGroup>,
    default_diffuse: TextureHandle,
    default_normal: TextureHandle,
    default_sampler: SamplerHandle,
    wireframe: bool,
    frame: Option<ActiveFrame>,
}

const INITIAL_DRAW_CAPACITY: usize = 64;

impl WgpuBackend {
    /// Create the device, pipelines and default resources for a window.
    pub fn new(
        target: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
    ) -> Result<Self, GpuError> {
        if width == 0 || height == 0 {
            return Err(GpuError::ZeroExtent { width, height });
        }
        let gpu = GpuContext::new(target, width, height)?;
        let device = &gpu.device;

        let camera_size = std::mem::size_of::<CameraUniforms>() as u64;
        let lights_size = std::mem::size_of::<LightUniforms>() as u64;
        let draw_size = std::mem::size_of::<DrawUniforms>() as u64;
        let layouts = Layouts::new(device, camera_size, lights_size, draw_size);
        let pipelines = MeshPipelines::new(device, &layouts, gpu.format(), gpu.supports_wireframe)?;

        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("camera_buffer"),
            contents: bytemuck::bytes_of(&CameraUniforms {
                view_proj: Mat4::IDENTITY.to_cols_array_2d(),
                eye: [0.0; 4],
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let light_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("light_buffer"),
            contents: bytemuck::bytes_of(&LightUniforms::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame_bind_group"),
            layout: &layouts.frame,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: camera_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: light_buffer.as_entire_binding(),
                },
            ],
        });

        let alignment = device.limits().min_uniform_buffer_offset_alignment as u64;
        let stride = draw_size.div_ceil(alignment) * alignment;
        let draw_ring = DrawRing::new(device, &layouts.draw, stride, INITIAL_DRAW_CAPACITY);
        let depth_view = create_depth_view(device, width, height);

        let mut backend = Self {
            gpu,
            layouts,
            pipelines,
            camera_buffer,
            light_buffer,
            frame_bind_group,
            draw_ring,
            depth_view,
            meshes: Vec::new(),
            textures: Vec::new(),
            samplers: Vec::new(),
            material_groups: HashMap::new(),
            default_diffuse: TextureHandle(0),
            default_normal: TextureHandle(0),
            default_sampler: SamplerHandle(0),
            wireframe: false,
            frame: None,
        };
        backend.default_diffuse = backend.create_texture(&TextureData::solid([255; 4]))?;
        backend.default_normal = backend.upload_texture(
            &TextureData::solid([128, 128, 255, 255]),
            wgpu::TextureFormat::Rgba8Unorm,
        )?;
        backend.default_sampler = backend.create_sampler(SamplerFilter::Linear)?;
        Ok(backend)
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.gpu.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.gpu.queue
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.gpu.format()
    }

    pub fn adapter_info(&self) -> &wgpu::AdapterInfo {
        &self.gpu.adapter_info
    }

    pub fn supports_wireframe(&self) -> bool {
        self.pipelines.wireframe.is_some()
    }

    /// Encode the scene pass (if not done yet) and lend out the frame target.
    pub fn overlay_target(&mut self) -> Option<OverlayTarget<'_>> {
        self.flush_scene();
        let frame = self.frame.as_ref()?;
        let (width, height) = self.gpu.size();
        Some(OverlayTarget {
            device: &self.gpu.device,
            queue: &self.gpu.queue,
            view: &frame.view,
            size: [width, height],
        })
    }

    fn upload_texture(
        &mut self,
        texture: &TextureData,
        format: wgpu::TextureFormat,
    ) -> Result<TextureHandle, GpuError> {
        let expected = texture.width as usize * texture.height as usize * 4;
        if texture.width == 0 || texture.height == 0 || texture.rgba.len() != expected {
            return Err(GpuError::TextureSize {
                width: texture.width,
                height: texture.height,
                expected,
                actual: texture.rgba.len(),
            });
        }
        let size = wgpu::Extent3d {
            width: texture.width,
            height: texture.height,
            depth_or_array_layers: 1,
        };
        let gpu_texture = self.gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("material_texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        self.gpu.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &gpu_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &texture.rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * texture.width),
                rows_per_image: Some(texture.height),
            },
            size,
        );
        let handle = TextureHandle(self.textures.len() as u32);
        self.textures
            .push(gpu_texture.create_view(&Default::default()));
        Ok(handle)
    }

    fn material_key(&self, draw: &DrawCall) -> MaterialKey {
        let valid_texture = |h: Option<TextureHandle>, fallback: TextureHandle| {
            h.filter(|h| (h.0 as usize) < self.textures.len())
                .unwrap_or(fallback)
        };
        let sampler = draw
            .material
            .sampler
            .filter(|s| (s.0 as usize) < self.samplers.len())
            .unwrap_or(self.default_sampler);
        (
            valid_texture(draw.material.diffuse_texture, self.default_diffuse),
            valid_texture(draw.material.normal_texture, self.default_normal),
            sampler,
        )
    }

    fn ensure_material_group(&mut self, key: MaterialKey) {
        if self.material_groups.contains_key(&key) {
            return;
        }
        let (diffuse, normal, sampler) = key;
        let group = self.gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("material_bind_group"),
            layout: &self.layouts.material,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&self.textures[diffuse.0 as usize]),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&self.textures[normal.0 as usize]),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.samplers[sampler.0 as usize]),
                },
            ],
        });
        self.material_groups.insert(key, group);
    }

    fn ensure_draw_capacity(&mut self, draws: usize) {
        if draws <= self.draw_ring.capacity {
            return;
        }
        let capacity = draws.next_power_of_two();
        tracing::debug!(capacity, "growing draw uniform buffer");
        self.draw_ring = DrawRing::new(
            &self.gpu.device,
            &self.layouts.draw,
            self.draw_ring.stride,
            capacity,
        );
    }

    /// Encode and submit the scene pass for the active frame, once.
    fn flush_scene(&mut self) {
        let Some(mut frame) = self.frame.take() else {
            return;
        };
        if frame.scene_encoded {
            self.frame = Some(frame);
            return;
        }

        let draws: Vec<(DrawCall, MaterialKey)> = frame
            .draws
            .drain(..)
            .filter(|draw| {
                let known = (draw.mesh.handle.0 as usize) < self.meshes.len();
                if !known {
                    tracing::warn!(entity = %draw.entity, mesh = ?draw.mesh.handle, "draw with unknown mesh skipped");
                }
                known
            })
            .map(|draw| {
                let key = self.material_key(&draw);
                (draw, key)
            })
            .collect();

        self.ensure_draw_capacity(draws.len());
        for (_, key) in &draws {
            self.ensure_material_group(*key);
        }

        let stride = self.draw_ring.stride as usize;
        let mut staging = vec![0u8; stride * draws.len()];
        for (i, (draw, _)) in draws.iter().enumerate() {
            let uniforms = DrawUniforms::new(draw);
            let bytes = bytemuck::bytes_of(&uniforms);
            staging[i * stride..i * stride + bytes.len()].copy_from_slice(bytes);
        }
        if !staging.is_empty() {
            self.gpu
                .queue
                .write_buffer(&self.draw_ring.buffer, 0, &staging);
        }

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("scene_encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(frame.clear),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            pass.set_pipeline(self.pipelines.select(self.wireframe));
            pass.set_bind_group(0, &self.frame_bind_group, &[]);
            for (i, (draw, key)) in draws.iter().enumerate() {
                let mesh = &self.meshes[draw.mesh.handle.0 as usize];
                let Some(material) = self.material_groups.get(key) else {
                    continue;
                };
                let offset = (i * stride) as wgpu::DynamicOffset;
                pass.set_bind_group(1, &self.draw_ring.bind_group, &[offset]);
                pass.set_bind_group(2, material, &[]);
                pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..mesh.index_count.min(draw.mesh.index_count), 0, 0..1);
            }
        }
        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        frame.scene_encoded = true;
        self.frame = Some(frame);
    }
}

impl RenderBackend for WgpuBackend {
    type Error = GpuError;

    fn upload_mesh(&mut self, mesh: &MeshData) -> Result<MeshHandle, GpuError> {
        let device = &self.gpu.device;
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mesh_vertex_buffer"),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mesh_index_buffer"),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let handle = MeshHandle(self.meshes.len() as u32);
        self.meshes.push(GpuMesh {
            vertex_buffer,
            index_buffer,
            index_count: mesh.index_count(),
        });
        tracing::debug!(
            ?handle,
            vertices = mesh.vertices.len(),
            indices = mesh.indices.len(),
            "mesh uploaded"
        );
        Ok(handle)
    }

    fn create_texture(&mut self, texture: &TextureData) -> Result<TextureHandle, GpuError> {
        self.upload_texture(texture, wgpu::TextureFormat::Rgba8UnormSrgb)
    }

    fn create_sampler(&mut self, filter: SamplerFilter) -> Result<SamplerHandle, GpuError> {
        let mode = match filter {
            SamplerFilter::Linear => wgpu::FilterMode::Linear,
            SamplerFilter::Nearest => wgpu::FilterMode::Nearest,
        };
        let sampler = self.gpu.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("material_sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: mode,
            min_filter: mode,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });
        let handle = SamplerHandle(self.samplers.len() as u32);
        self.samplers.push(sampler);
        Ok(handle)
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<(), GpuError> {
        if width == 0 || height == 0 {
            return Err(GpuError::ZeroExtent { width, height });
        }
        self.gpu.resize(width, height);
        self.depth_view = create_depth_view(&self.gpu.device, width, height);
        Ok(())
    }

    fn set_wireframe(&mut self, enabled: bool) {
        if enabled && self.pipelines.wireframe.is_none() {
            tracing::warn!("wireframe requested but POLYGON_MODE_LINE is unsupported");
        }
        self.wireframe = enabled;
    }

    fn begin_frame(&mut self, frame: &FrameUniforms) -> Result<bool, GpuError> {
        if self.frame.take().is_some() {
            tracing::warn!("previous frame was never presented");
        }

        let surface_texture = match self.gpu.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.gpu.reconfigure();
                return Ok(false);
            }
            Err(wgpu::SurfaceError::Timeout) => {
                tracing::warn!("surface acquire timed out");
                return Ok(false);
            }
            Err(e) => return Err(e.into()),
        };
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let camera = CameraUniforms {
            view_proj: frame.camera.view_projection.to_cols_array_2d(),
            eye: frame.camera.eye.extend(1.0).to_array(),
        };
        self.gpu
            .queue
            .write_buffer(&self.camera_buffer, 0, bytemuck::bytes_of(&camera));
        self.gpu
            .queue
            .write_buffer(&self.light_buffer, 0, bytemuck::bytes_of(&frame.lights));

        let c = frame.clear_color;
        self.frame = Some(ActiveFrame {
            surface_texture,
            view,
            clear: wgpu::Color {
                r: c.x as f64,
                g: c.y as f64,
                b: c.z as f64,
                a: c.w as f64,
            },
            draws: Vec::new(),
            scene_encoded: false,
        });
        Ok(true)
    }

    fn draw_indexed(&mut self, draw: &DrawCall) {
        match &mut self.frame {
            Some(frame) if !frame.scene_encoded => frame.draws.push(*draw),
            _ => tracing::warn!(entity = %draw.entity, "draw outside an open frame ignored"),
        }
    }

    fn present(&mut self) -> Result<(), GpuError> {
        self.flush_scene();
        if let Some(frame) = self.frame.take() {
            frame.surface_texture.present();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec3, Vec4};
    use prism_ecs::{Entity, Material, Mesh};

    fn draw_with(world: Mat4) -> DrawCall {
        DrawCall {
            entity: Entity::from_raw(1).unwrap(),
            mesh: Mesh {
                handle: MeshHandle(0),
                index_count: 36,
                vertex_stride: 72,
            },
            world,
            world_view_projection: world,
            material: Material::colored(Vec4::new(0.5, 0.5, 0.5, 1.0)),
        }
    }

    #[test]
    fn draw_uniforms_fit_one_aligned_slot() {
        assert_eq!(std::mem::size_of::<DrawUniforms>(), 224);
        assert!(std::mem::size_of::<DrawUniforms>() <= 256);
        assert_eq!(std::mem::size_of::<CameraUniforms>(), 80);
    }

    #[test]
    fn normal_matrix_undoes_non_uniform_scale() {
        let world = Mat4::from_scale(Vec3::new(2.0, 1.0, 1.0));
        let u = DrawUniforms::new(&draw_with(world));
        let normal = Mat4::from_cols_array_2d(&u.normal_matrix);
        let n = normal.transform_vector3(Vec3::X);
        assert!((n.x - 0.5).abs() < 1e-6);
    }

    #[test]
    fn singular_world_keeps_world_as_normal_matrix() {
        let world = Mat4::from_scale(Vec3::new(0.0, 1.0, 1.0));
        let u = DrawUniforms::new(&draw_with(world));
        assert_eq!(u.normal_matrix, world.to_cols_array_2d());
    }

    #[test]
    fn material_fields_are_packed() {
        let u = DrawUniforms::new(&draw_with(Mat4::IDENTITY));
        assert_eq!(u.diffuse_color, [0.5, 0.5, 0.5, 1.0]);
        assert_eq!(u.material[0], 32.0);
    }
}
