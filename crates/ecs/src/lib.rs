//! Entity-component registry.
//!
//! Components are stored in one BTreeMap per kind, keyed by `Entity`.
//!
//! # Invariants
//! - At most one component per (entity, kind) pair; adding again replaces.
//! - Entity ids are allocated monotonically from 1 and never recycled.
//! - Destroying an entity removes it from every kind's table.
//! - Absence is reported as `None`, never as an error.

pub mod components;
mod registry;

pub use components::{
    Camera, DirectionalLight, Light, LightCommon, LightKind, Material, Mesh, MeshHandle,
    PointLight, SamplerHandle, SpotLight, TextureHandle,
};
pub use prism_common::{Entity, Transform};
pub use registry::{Component, ComponentKind, Registry, RegistryError};

pub fn crate_info() -> &'static str {
    "prism-ecs v0.1.0"
}
