//! wgpu implementation of [`prism_render::RenderBackend`].
//!
//! Draws indexed meshes with Blinn-Phong lighting (up to eight lights),
//! diffuse and normal textures, and an optional line-mode pipeline.
//!
//! # Invariants
//! - Per-draw uniforms live in one buffer addressed by dynamic offsets.
//! - The scene pass is encoded once per frame, before any overlay.
//! - A lost or outdated surface skips the frame instead of failing it.

mod backend;
mod device;
mod pipeline;
mod shaders;

pub use backend::{OverlayTarget, WgpuBackend};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GpuError {
    #[error("failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),
    #[error("no compatible GPU adapter found")]
    NoAdapter,
    #[error("failed to create device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error("surface exposes no usable color format")]
    NoSurfaceFormat,
    #[error("shader or pipeline validation failed: {0}")]
    Shader(String),
    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
    #[error("zero-sized surface {width}x{height}")]
    ZeroExtent { width: u32, height: u32 },
    #[error("texture {width}x{height} needs {expected} bytes, got {actual}")]
    TextureSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

pub fn crate_info() -> &'static str {
    "prism-render-wgpu v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("wgpu"));
    }

    #[test]
    fn zero_extent_message_names_size() {
        let err = GpuError::ZeroExtent {
            width: 0,
            height: 720,
        };
        assert_eq!(err.to_string(), "zero-sized surface 0x720");
    }
}
