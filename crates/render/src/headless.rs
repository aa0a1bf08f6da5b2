use crate::backend::{DrawCall, FrameUniforms, RenderBackend, SamplerFilter, TextureData};
use crate::mesh::MeshData;
use glam::{Vec3, Vec4};
use prism_ecs::{Entity, MeshHandle, SamplerHandle, TextureHandle};
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// A call observed by the recording backend.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    UploadMesh {
        handle: MeshHandle,
        vertices: usize,
        indices: usize,
    },
    CreateTexture {
        handle: TextureHandle,
        width: u32,
        height: u32,
    },
    CreateSampler {
        handle: SamplerHandle,
        filter: SamplerFilter,
    },
    Resize {
        width: u32,
        height: u32,
    },
    SetWireframe(bool),
    BeginFrame {
        clear_color: Vec4,
        eye: Vec3,
        lights: u32,
    },
    Draw {
        entity: Entity,
        mesh: MeshHandle,
        index_count: u32,
        position: Vec3,
        color: Vec4,
    },
    Present,
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum HeadlessError {
    #[error("cannot resize to {width}x{height}")]
    ZeroExtent { width: u32, height: u32 },
    #[error("draw referenced unknown mesh {0:?}")]
    UnknownMesh(MeshHandle),
}

/// Backend that draws nothing and records every call.
///
/// Used by the CLI and by tests to observe the frame sequence without a GPU.
#[derive(Debug)]
pub struct RecordingBackend {
    calls: Vec<BackendCall>,
    meshes: BTreeMap<MeshHandle, (usize, usize)>,
    next_mesh: u32,
    next_texture: u32,
    next_sampler: u32,
    width: u32,
    height: u32,
    wireframe: bool,
    surface_available: bool,
    pending_error: Option<HeadlessError>,
}

impl RecordingBackend {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            calls: Vec::new(),
            meshes: BTreeMap::new(),
            next_mesh: 0,
            next_texture: 0,
            next_sampler: 0,
            width,
            height,
            wireframe: false,
            surface_available: true,
            pending_error: None,
        }
    }

    pub fn calls(&self) -> &[BackendCall] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn wireframe(&self) -> bool {
        self.wireframe
    }

    /// Simulate a surface that cannot be acquired: frames begin as skipped.
    pub fn set_surface_available(&mut self, available: bool) {
        self.surface_available = available;
    }

    pub fn frames_presented(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, BackendCall::Present))
            .count()
    }

    /// Calls since the most recent `BeginFrame`, inclusive.
    pub fn last_frame(&self) -> &[BackendCall] {
        let start = self
            .calls
            .iter()
            .rposition(|c| matches!(c, BackendCall::BeginFrame { .. }))
            .unwrap_or(self.calls.len());
        &self.calls[start..]
    }

    /// Human-readable transcript of the most recent frame.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for call in self.last_frame() {
            // writing to a String cannot fail
            let _ = match call {
                BackendCall::BeginFrame {
                    clear_color,
                    eye,
                    lights,
                } => writeln!(
                    out,
                    "=== Frame ({}x{}) clear=({:.2}, {:.2}, {:.2}) ===\nCamera: eye=({:.2}, {:.2}, {:.2})\nLights: {lights}",
                    self.width, self.height, clear_color.x, clear_color.y, clear_color.z, eye.x, eye.y, eye.z
                ),
                BackendCall::Draw {
                    entity,
                    mesh,
                    index_count,
                    position,
                    color,
                } => writeln!(
                    out,
                    "  draw {entity} mesh={} indices={index_count} pos=({:.2}, {:.2}, {:.2}) color=({:.2}, {:.2}, {:.2})",
                    mesh.0, position.x, position.y, position.z, color.x, color.y, color.z
                ),
                BackendCall::Present => writeln!(out, "Presented"),
                other => writeln!(out, "  {other:?}"),
            };
        }
        out
    }
}

impl RenderBackend for RecordingBackend {
    type Error = HeadlessError;

    fn upload_mesh(&mut self, mesh: &MeshData) -> Result<MeshHandle, HeadlessError> {
        let handle = MeshHandle(self.next_mesh);
        self.next_mesh += 1;
        self.meshes
            .insert(handle, (mesh.vertices.len(), mesh.indices.len()));
        self.calls.push(BackendCall::UploadMesh {
            handle,
            vertices: mesh.vertices.len(),
            indices: mesh.indices.len(),
        });
        Ok(handle)
    }

    fn create_texture(&mut self, texture: &TextureData) -> Result<TextureHandle, HeadlessError> {
        let handle = TextureHandle(self.next_texture);
        self.next_texture += 1;
        self.calls.push(BackendCall::CreateTexture {
            handle,
            width: texture.width,
            height: texture.height,
        });
        Ok(handle)
    }

    fn create_sampler(&mut self, filter: SamplerFilter) -> Result<SamplerHandle, HeadlessError> {
        let handle = SamplerHandle(self.next_sampler);
        self.next_sampler += 1;
        self.calls.push(BackendCall::CreateSampler { handle, filter });
        Ok(handle)
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<(), HeadlessError> {
        if width == 0 || height == 0 {
            return Err(HeadlessError::ZeroExtent { width, height });
        }
        self.width = width;
        self.height = height;
        self.calls.push(BackendCall::Resize { width, height });
        Ok(())
    }

    fn set_wireframe(&mut self, enabled: bool) {
        self.wireframe = enabled;
        self.calls.push(BackendCall::SetWireframe(enabled));
    }

    fn begin_frame(&mut self, frame: &FrameUniforms) -> Result<bool, HeadlessError> {
        if !self.surface_available {
            return Ok(false);
        }
        self.calls.push(BackendCall::BeginFrame {
            clear_color: frame.clear_color,
            eye: frame.camera.eye,
            lights: frame.lights.count[0],
        });
        Ok(true)
    }

    fn draw_indexed(&mut self, draw: &DrawCall) {
        if !self.meshes.contains_key(&draw.mesh.handle) {
            tracing::warn!(entity = %draw.entity, mesh = ?draw.mesh.handle, "draw with unknown mesh");
            self.pending_error
                .get_or_insert(HeadlessError::UnknownMesh(draw.mesh.handle));
            return;
        }
        self.calls.push(BackendCall::Draw {
            entity: draw.entity,
            mesh: draw.mesh.handle,
            index_count: draw.mesh.index_count,
            position: draw.world.w_axis.truncate(),
            color: draw.material.diffuse_color,
        });
    }

    fn present(&mut self) -> Result<(), HeadlessError> {
        if let Some(err) = self.pending_error.take() {
            return Err(err);
        }
        self.calls.push(BackendCall::Present);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh;

    #[test]
    fn handles_are_sequential() {
        let mut backend = RecordingBackend::new(64, 64);
        let a = backend.upload_mesh(&mesh::cube()).unwrap();
        let b = backend.upload_mesh(&mesh::plane(1.0, 1.0, 1, 1)).unwrap();
        assert_eq!((a, b), (MeshHandle(0), MeshHandle(1)));
        assert_eq!(
            backend.calls()[0],
            BackendCall::UploadMesh {
                handle: a,
                vertices: 24,
                indices: 36
            }
        );
    }

    #[test]
    fn create_mesh_fills_component() {
        let mut backend = RecordingBackend::new(64, 64);
        let mesh = backend.create_mesh(&mesh::sphere(1.0, 8, 4)).unwrap();
        assert_eq!(mesh.index_count, 8 * (2 * 4 - 2) * 3);
        assert_eq!(mesh.vertex_stride, 72);
    }

    #[test]
    fn zero_resize_is_rejected() {
        let mut backend = RecordingBackend::new(64, 64);
        assert!(backend.resize(0, 10).is_err());
        assert_eq!(backend.size(), (64, 64));
    }

    #[test]
    fn empty_transcript_without_frames() {
        let backend = RecordingBackend::new(64, 64);
        assert!(backend.render_text().is_empty());
        assert_eq!(backend.frames_presented(), 0);
    }
}
