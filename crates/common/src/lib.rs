//! Shared types for the prism renderer.
//!
//! # Invariants
//! - An `Entity` is never zero; "no entity" is `Option::<Entity>::None`.
//! - `Transform::world_matrix` scales, then rotates, then translates.
//! - Frame deltas handed to simulation never exceed `MAX_FRAME_DELTA`.

mod time;
mod types;

pub use time::{FrameClock, FrameTimer, MAX_FRAME_DELTA};
pub use types::{Entity, Transform};

pub fn crate_info() -> &'static str {
    "prism-common v0.1.0"
}
