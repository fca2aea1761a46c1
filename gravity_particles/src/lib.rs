//! Real-time N-body gravity visualization
//!
//! CPU-parallel force and integration kernels over a flat particle store,
//! rendered as velocity-colored billboard sprites through wgpu. The library
//! half carries everything with simulation semantics; windowing and the
//! event loop live in the binary.

pub mod controls;
pub mod error;
pub mod particles;
pub mod physics;
pub mod renderer;

pub use error::{Error, Result};
pub use particles::{Particle, ParticleStore, SimParams, MAX_PARTICLES};
pub use physics::{compute_forces, integrate, Simulation};
