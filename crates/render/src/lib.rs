//! Backend-agnostic frame orchestration.
//!
//! Each frame resolves the main camera, applies camera input, aggregates
//! lights, draws every mesh entity that has a transform, runs the debug
//! overlay, then presents.
//!
//! # Invariants
//! - Frame steps run in a fixed order on one thread.
//! - Per-frame state is recomputed from components every frame.
//! - At most `MAX_LIGHTS` lights are uploaded; the selection is deterministic.
//! - A zero-sized viewport is never applied.

pub mod backend;
pub mod camera;
mod frame;
pub mod headless;
pub mod lighting;
pub mod mesh;

pub use backend::{
    DebugOverlay, DrawCall, FrameUniforms, NoOverlay, OverlayContext, RenderBackend,
    SamplerFilter, TextureData,
};
pub use camera::{CameraMatrices, main_camera};
pub use frame::{FrameOrchestrator, FrameStats, RenderError, RenderSettings, Viewport};
pub use headless::{BackendCall, HeadlessError, RecordingBackend};
pub use lighting::{GpuLight, LightSet, LightUniforms, MAX_LIGHTS, collect_lights};
pub use mesh::{MeshData, Vertex};

pub fn crate_info() -> &'static str {
    "prism-render v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }
}
