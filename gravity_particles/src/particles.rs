//! Particle storage and per-frame parameters
//!
//! The store owns the only mutable shared state in the simulation: a flat
//! array of 32-byte particle records. The same records are uploaded verbatim
//! as the renderer's instance buffer, so the field order and widths here are
//! a contract with `shaders/particles.wgsl`.

use glam::Vec3;
use rand::Rng;
use std::f32::consts::TAU;

use crate::error::{Error, Result};

/// Upper bound on the particle count; O(n²) force evaluation makes larger
/// stores uninteractive long before memory becomes a concern.
pub const MAX_PARTICLES: usize = 10_000;

/// Inner radius of the spawn shell.
pub const SPAWN_INNER_RADIUS: f32 = 5.0;
/// Outer radius of the spawn shell.
pub const SPAWN_OUTER_RADIUS: f32 = 25.0;

/// Mass of the implicit central body used when seeding orbital speeds.
const CENTRAL_MASS: f32 = 100.0;
/// Fraction of the circular-orbit speed given to freshly seeded particles;
/// sub-orbital speeds make the cloud slowly collapse inward, which reads
/// better than a static shell.
const ORBIT_SPEED_FACTOR: f32 = 0.3;

/// One gravitating body. Exactly 8 contiguous floats (32-byte stride):
/// position.xyz, mass, velocity.xyz, padding.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Particle {
    pub position: Vec3,
    pub mass: f32,
    pub velocity: Vec3,
    _pad: f32,
}

impl Particle {
    pub fn new(position: Vec3, velocity: Vec3, mass: f32) -> Self {
        Self {
            position,
            mass,
            velocity,
            _pad: 0.0,
        }
    }
}

/// Per-frame parameter record consumed by both kernels.
///
/// Written once before kernel dispatch and read-only for the rest of the
/// frame. `particle_count` must match the live store length; kernels no-op
/// for indices at or beyond it.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SimParams {
    pub particle_count: u32,
    pub delta_time: f32,
    pub gravity_strength: f32,
    pub damping: f32,
}

/// Canonical per-particle state, created in a single batch and only ever
/// replaced wholesale.
#[derive(Debug)]
pub struct ParticleStore {
    particles: Vec<Particle>,
}

impl ParticleStore {
    /// Build a store of `count` particles seeded on a spherical shell.
    ///
    /// `gravity_strength` feeds the initial tangential speed so the cloud
    /// starts near circular orbits around the anchor at the origin.
    pub fn new<R: Rng>(count: usize, gravity_strength: f32, rng: &mut R) -> Result<Self> {
        if count < 1 || count > MAX_PARTICLES {
            return Err(Error::ParticleCountOutOfRange {
                requested: count,
                max: MAX_PARTICLES,
            });
        }
        let mut store = Self {
            particles: Vec::with_capacity(count),
        };
        store.seed(count, gravity_strength, rng);
        Ok(store)
    }

    /// Wrap an externally built particle set, rejecting degenerate masses
    /// before they can reach the integration kernel's division.
    pub fn from_particles(particles: Vec<Particle>) -> Result<Self> {
        if particles.is_empty() || particles.len() > MAX_PARTICLES {
            return Err(Error::ParticleCountOutOfRange {
                requested: particles.len(),
                max: MAX_PARTICLES,
            });
        }
        for (index, particle) in particles.iter().enumerate() {
            if !(particle.mass > 0.0) {
                return Err(Error::InvalidMass {
                    index,
                    mass: particle.mass,
                });
            }
        }
        Ok(Self { particles })
    }

    /// Discard all state and re-seed with fresh randomness.
    pub fn reset<R: Rng>(&mut self, gravity_strength: f32, rng: &mut R) {
        let count = self.particles.len();
        self.seed(count, gravity_strength, rng);
    }

    /// Destructive resize: the whole store is rebuilt from scratch, there is
    /// no continuity of trajectories across a count change.
    pub fn resize<R: Rng>(
        &mut self,
        new_count: usize,
        gravity_strength: f32,
        rng: &mut R,
    ) -> Result<()> {
        if new_count < 1 || new_count > MAX_PARTICLES {
            return Err(Error::ParticleCountOutOfRange {
                requested: new_count,
                max: MAX_PARTICLES,
            });
        }
        self.seed(new_count, gravity_strength, rng);
        Ok(())
    }

    fn seed<R: Rng>(&mut self, count: usize, gravity_strength: f32, rng: &mut R) {
        self.particles.clear();
        self.particles.reserve(count);

        for _ in 0..count {
            // Uniform direction on the sphere: uniform azimuth, polar angle
            // from arccos(2u - 1).
            let azimuth = rng.gen::<f32>() * TAU;
            let polar = (2.0 * rng.gen::<f32>() - 1.0).acos();
            let radius = rng.gen_range(SPAWN_INNER_RADIUS..SPAWN_OUTER_RADIUS);

            let position = radius
                * Vec3::new(
                    polar.sin() * azimuth.cos(),
                    polar.cos(),
                    polar.sin() * azimuth.sin(),
                );

            // Tangential start, perpendicular to the radius in the azimuthal
            // plane, at a fraction of circular-orbit speed about the anchor.
            let orbital_speed =
                (gravity_strength * CENTRAL_MASS / radius).sqrt() * ORBIT_SPEED_FACTOR;
            let velocity = Vec3::new(-azimuth.sin(), 0.0, azimuth.cos()) * orbital_speed;

            let mass = rng.gen_range(0.5..1.0);
            self.particles.push(Particle::new(position, velocity, mass));
        }

        // Particle 0 anchors the cloud: at rest at the origin with unit mass.
        self.particles[0] = Particle::new(Vec3::ZERO, Vec3::ZERO, 1.0);
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub(crate) fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn particle_record_is_eight_floats() {
        assert_eq!(std::mem::size_of::<Particle>(), 32);
        assert_eq!(std::mem::size_of::<SimParams>(), 16);
    }

    #[test]
    fn seeding_places_particles_in_the_shell() {
        let mut rng = StdRng::seed_from_u64(7);
        let store = ParticleStore::new(500, 1.0, &mut rng).unwrap();
        assert_eq!(store.len(), 500);

        let anchor = store.particles()[0];
        assert_eq!(anchor.position, Vec3::ZERO);
        assert_eq!(anchor.velocity, Vec3::ZERO);
        assert_eq!(anchor.mass, 1.0);

        for particle in &store.particles()[1..] {
            let radius = particle.position.length();
            assert!(
                (SPAWN_INNER_RADIUS..SPAWN_OUTER_RADIUS).contains(&radius),
                "particle outside spawn shell: r = {radius}"
            );
            assert!((0.5..1.0).contains(&particle.mass));
            // Tangential seeding: velocity is perpendicular to the radius
            // projected into the azimuthal plane.
            let planar = Vec3::new(particle.position.x, 0.0, particle.position.z);
            assert!(planar.dot(particle.velocity).abs() < 1e-3);
        }
    }

    #[test]
    fn resize_is_a_full_reset() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut store = ParticleStore::new(100, 1.0, &mut rng).unwrap();
        let before = store.particles()[5];

        store.resize(250, 1.0, &mut rng).unwrap();
        assert_eq!(store.len(), 250);
        assert_ne!(
            store.particles()[5], before,
            "resize must rebuild, not preserve, existing trajectories"
        );
        assert_eq!(store.particles()[0].position, Vec3::ZERO);
        for particle in &store.particles()[1..] {
            let radius = particle.position.length();
            assert!((SPAWN_INNER_RADIUS..SPAWN_OUTER_RADIUS).contains(&radius));
        }
    }

    #[test]
    fn out_of_range_counts_are_rejected() {
        let mut rng = StdRng::seed_from_u64(3);
        assert!(matches!(
            ParticleStore::new(0, 1.0, &mut rng),
            Err(Error::ParticleCountOutOfRange { .. })
        ));
        assert!(matches!(
            ParticleStore::new(MAX_PARTICLES + 1, 1.0, &mut rng),
            Err(Error::ParticleCountOutOfRange { .. })
        ));

        let mut store = ParticleStore::new(10, 1.0, &mut rng).unwrap();
        assert!(store.resize(0, 1.0, &mut rng).is_err());
        assert_eq!(store.len(), 10, "failed resize must leave the store intact");
    }

    #[test]
    fn non_positive_mass_is_rejected_at_construction() {
        let particles = vec![
            Particle::new(Vec3::ZERO, Vec3::ZERO, 1.0),
            Particle::new(Vec3::X, Vec3::ZERO, 0.0),
        ];
        match ParticleStore::from_particles(particles) {
            Err(Error::InvalidMass { index, .. }) => assert_eq!(index, 1),
            other => panic!("expected InvalidMass, got {other:?}"),
        }

        let nan_mass = vec![Particle::new(Vec3::ZERO, Vec3::ZERO, f32::NAN)];
        assert!(ParticleStore::from_particles(nan_mass).is_err());
    }
}
