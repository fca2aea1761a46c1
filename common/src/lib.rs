//! Shared infrastructure for the particle gravity visualization
//!
//! This crate provides the window/GPU bootstrap and the orbital camera model
//! used by the simulation crate. It owns no simulation state.

pub mod camera;
pub mod graphics;

pub use camera::*;
pub use graphics::*;

/// Simulation-space constants shared between the CPU kernels and the shaders.
pub mod constants {
    /// Half-extent of the cubic boundary; positions are reflected at ±BOUNDS.
    pub const BOUNDS: f32 = 50.0;

    /// Softening length added (squared) under the inverse-square law so the
    /// pairwise force stays finite as two particles approach coincidence.
    pub const SOFTENING: f32 = 0.01;

    /// Fraction of axis speed retained after a boundary bounce.
    pub const RESTITUTION: f32 = 0.8;
}
