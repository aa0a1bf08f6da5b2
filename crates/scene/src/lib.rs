//! Scene population.
//!
//! Uploads the shared meshes once, then creates camera, mesh and light
//! entities either directly through [`SceneBuilder`] or from a YAML
//! [`SceneDescription`].

mod assets;
mod builder;
mod description;

pub use assets::{PLANE_SIZE, SPHERE_RADIUS, SceneAssets};
pub use builder::{SceneBuilder, populate};
pub use description::{
    CameraDescription, LightDescription, ObjectDescription, SceneDescription, SceneError,
};

pub fn crate_info() -> &'static str {
    "prism-scene v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("scene"));
    }
}
