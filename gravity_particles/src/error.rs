use thiserror::Error;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the simulation core.
///
/// Numeric edge cases inside the kernels (near-coincident particles) are
/// handled locally by the softening term and never become errors; only
/// configuration problems propagate to the caller.
#[derive(Debug, Error)]
pub enum Error {
    /// A requested particle count falls outside the supported range.
    /// Rebuilds are never silently capped; the caller decides what to do.
    #[error("particle count {requested} outside supported range [1, {max}]")]
    ParticleCountOutOfRange { requested: usize, max: usize },

    /// A particle with non-positive mass was supplied. The integration
    /// kernel divides by mass, so this is rejected at construction time.
    #[error("particle {index} has non-positive mass {mass}")]
    InvalidMass { index: usize, mass: f32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_names_the_offending_value() {
        let e = Error::ParticleCountOutOfRange {
            requested: 20_000,
            max: 10_000,
        };
        let msg = format!("{e}");
        assert!(msg.contains("20000"));
        assert!(msg.contains("10000"));
    }
}
