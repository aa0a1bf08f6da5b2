use crate::backend::{DebugOverlay, DrawCall, FrameUniforms, OverlayContext, RenderBackend};
use crate::camera::{
    apply_mouse_look, apply_movement, camera_matrices, fallback_matrices, main_camera,
};
use crate::lighting::collect_lights;
use glam::{Vec3, Vec4};
use prism_ecs::{Camera, Entity, Material, Mesh, Registry, Transform};
use prism_input::CameraInput;
use serde::{Deserialize, Serialize};

/// Errors surfaced by the frame orchestrator.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("viewport extent must be non-zero, got {width}x{height}")]
    ZeroExtent { width: u32, height: u32 },
    #[error("render backend failure: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl RenderError {
    pub fn backend<E: std::error::Error + Send + Sync + 'static>(err: E) -> Self {
        Self::Backend(Box::new(err))
    }
}

/// User-tunable render state. Edited by the overlay, applied by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderSettings {
    pub wireframe: bool,
    pub clear_color: Vec4,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            wireframe: false,
            clear_color: Vec4::new(0.1, 0.1, 0.2, 1.0),
        }
    }
}

/// Drawable area in physical pixels. Both sides are always non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    width: u32,
    height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Result<Self, RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::ZeroExtent { width, height });
        }
        Ok(Self { width, height })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

/// What happened during one frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FrameStats {
    pub frame_index: u64,
    pub camera: Option<Entity>,
    pub eye: Vec3,
    pub look_direction: Vec3,
    pub draws: usize,
    /// Mesh entities without a Transform.
    pub skipped_meshes: usize,
    pub lights: usize,
    pub dropped_lights: usize,
    pub entity_count: usize,
    pub presented: bool,
}

/// Walks the registry once per frame and drives a `RenderBackend`.
#[derive(Debug)]
pub struct FrameOrchestrator {
    settings: RenderSettings,
    viewport: Viewport,
    applied_wireframe: Option<bool>,
    frame_index: u64,
    last_stats: FrameStats,
}

impl FrameOrchestrator {
    pub fn new(width: u32, height: u32) -> Result<Self, RenderError> {
        Ok(Self {
            settings: RenderSettings::default(),
            viewport: Viewport::new(width, height)?,
            applied_wireframe: None,
            frame_index: 0,
            last_stats: FrameStats::default(),
        })
    }

    pub fn with_settings(mut self, settings: RenderSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut RenderSettings {
        &mut self.settings
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn last_stats(&self) -> &FrameStats {
        &self.last_stats
    }

    /// Apply a new drawable size. Zero extents are rejected and leave the
    /// backend, the viewport and every camera untouched.
    pub fn resize<B: RenderBackend>(
        &mut self,
        registry: &mut Registry,
        backend: &mut B,
        width: u32,
        height: u32,
    ) -> Result<(), RenderError> {
        let viewport = Viewport::new(width, height)?;
        if viewport == self.viewport {
            return Ok(());
        }
        backend
            .resize(width, height)
            .map_err(RenderError::backend)?;
        self.viewport = viewport;

        let aspect = viewport.aspect_ratio();
        for (_, camera) in registry.iter_mut::<Camera>() {
            camera.aspect_ratio = aspect;
        }
        tracing::debug!(width, height, aspect, "viewport resized");
        Ok(())
    }

    /// Run one frame: camera, movement, lights, draws, overlay, present.
    pub fn run_frame<B, O>(
        &mut self,
        registry: &mut Registry,
        backend: &mut B,
        overlay: &mut O,
        input: &CameraInput,
        dt: f32,
    ) -> Result<FrameStats, RenderError>
    where
        B: RenderBackend,
        O: DebugOverlay<B>,
    {
        let _span = tracing::debug_span!("frame", index = self.frame_index).entered();
        let mut stats = FrameStats {
            frame_index: self.frame_index,
            entity_count: registry.entity_count(),
            ..FrameStats::default()
        };
        self.frame_index += 1;

        // 1. camera
        let camera_entity = main_camera(registry);

        // 2. movement
        let camera = camera_entity.and_then(|entity| {
            let camera = registry.get_component_mut::<Camera>(entity)?;
            apply_mouse_look(camera, input.look_delta);
            apply_movement(camera, input, dt);
            Some(*camera)
        });
        let matrices = match &camera {
            Some(camera) => camera_matrices(camera),
            None => fallback_matrices(self.viewport.aspect_ratio()),
        };
        stats.camera = camera_entity;
        stats.eye = matrices.eye;
        stats.look_direction = camera
            .map(|c| c.look_direction)
            .unwrap_or_else(|| (Vec3::ZERO - matrices.eye).normalize());

        // 3. lights
        let lights = collect_lights(registry);
        stats.lights = lights.len();
        stats.dropped_lights = lights.dropped;

        if self.applied_wireframe != Some(self.settings.wireframe) {
            backend.set_wireframe(self.settings.wireframe);
            self.applied_wireframe = Some(self.settings.wireframe);
        }

        let uniforms = FrameUniforms {
            clear_color: self.settings.clear_color,
            camera: matrices,
            lights: lights.to_uniforms(),
        };
        if !backend
            .begin_frame(&uniforms)
            .map_err(RenderError::backend)?
        {
            tracing::debug!("frame skipped by backend");
            self.last_stats = stats.clone();
            return Ok(stats);
        }

        // 4. draws
        for (entity, mesh) in registry.iter::<Mesh>() {
            let Some(transform) = registry.get_component::<Transform>(entity) else {
                stats.skipped_meshes += 1;
                tracing::trace!(%entity, "mesh without transform skipped");
                continue;
            };
            let world = transform.world_matrix();
            backend.draw_indexed(&DrawCall {
                entity,
                mesh: *mesh,
                world,
                world_view_projection: matrices.view_projection * world,
                material: registry
                    .get_component::<Material>(entity)
                    .copied()
                    .unwrap_or_default(),
            });
            stats.draws += 1;
        }

        // 5. overlay
        overlay
            .draw(
                OverlayContext {
                    registry,
                    settings: &mut self.settings,
                    stats: &stats,
                },
                backend,
            )
            .map_err(RenderError::backend)?;

        // 6. present
        backend.present().map_err(RenderError::backend)?;
        stats.presented = true;

        tracing::trace!(
            draws = stats.draws,
            skipped = stats.skipped_meshes,
            lights = stats.lights,
            "frame complete"
        );
        self.last_stats = stats.clone();
        Ok(stats)
    }
}
