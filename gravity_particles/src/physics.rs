//! Data-parallel force and integration kernels
//!
//! Each frame runs two kernels over the particle store: an O(n²) all-pairs
//! force pass and an integration pass. Both are parallel maps over particle
//! indices with one disjoint output slot per particle, so invocations never
//! contend on writes. Running them as two sequential passes gives the
//! integration kernel a fully settled force field; there is no per-particle
//! synchronization anywhere.

use glam::Vec3;
use rayon::prelude::*;

use common::constants::{BOUNDS, RESTITUTION, SOFTENING};

use crate::error::Result;
use crate::particles::{Particle, ParticleStore, SimParams};

pub const DEFAULT_PARTICLE_COUNT: usize = 1000;
pub const DEFAULT_GRAVITY: f32 = 1.0;
pub const DEFAULT_DAMPING: f32 = 0.99;
pub const DEFAULT_TIME_SCALE: f32 = 1.0;

/// Force kernel: one accumulated force vector per particle.
///
/// `F_i = g · Σ_{j≠i} (m_i · m_j / d²) · r̂`, with `d² = |r|² + ε²` so the
/// magnitude stays bounded as two particles approach coincidence. Every pair
/// is evaluated from both endpoints rather than computed once and mirrored;
/// at the counts this runs at, the uniform inner loop beats the bookkeeping
/// a shared-pair scheme would need.
///
/// Slots at or beyond `params.particle_count` come back zero.
pub fn compute_forces(particles: &[Particle], params: &SimParams) -> Vec<Vec3> {
    let live = (params.particle_count as usize).min(particles.len());
    particles
        .par_iter()
        .enumerate()
        .map(|(i, particle)| {
            if i >= live {
                return Vec3::ZERO;
            }
            let mut force = Vec3::ZERO;
            for (j, other) in particles[..live].iter().enumerate() {
                if j == i {
                    continue;
                }
                let offset = other.position - particle.position;
                let dist_sq = offset.length_squared() + SOFTENING * SOFTENING;
                let dist = dist_sq.sqrt();
                let magnitude =
                    params.gravity_strength * particle.mass * other.mass / dist_sq;
                force += offset * (magnitude / dist);
            }
            force
        })
        .collect()
}

/// Integration kernel: advance velocity and position in place.
///
/// Semi-implicit Euler: the velocity update uses the force evaluated at the
/// start of the step, then the position update uses the new velocity. After
/// stepping, each axis is reflected independently at ±`BOUNDS` with the
/// bounce losing `1 - RESTITUTION` of that axis's speed. Mass is never
/// touched; indices beyond the live count are skipped.
pub fn integrate(particles: &mut [Particle], forces: &[Vec3], params: &SimParams) {
    let live = (params.particle_count as usize)
        .min(particles.len())
        .min(forces.len());
    particles[..live]
        .par_iter_mut()
        .zip(&forces[..live])
        .for_each(|(particle, force)| {
            let acceleration = *force / particle.mass;
            particle.velocity += acceleration * params.delta_time;
            particle.velocity *= params.damping;
            particle.position += particle.velocity * params.delta_time;

            // Axes reflect independently; a corner overshoot gets corrected
            // on each axis it exceeds.
            for axis in 0..3 {
                if particle.position[axis].abs() > BOUNDS {
                    particle.position[axis] = BOUNDS.copysign(particle.position[axis]);
                    particle.velocity[axis] *= -RESTITUTION;
                }
            }
        });
}

/// Owns the particle store and the frame-to-frame tunables, and drives the
/// two kernels in order once per frame.
pub struct Simulation {
    store: ParticleStore,
    pub gravity_strength: f32,
    pub damping: f32,
    pub time_scale: f32,
    pub paused: bool,
    elapsed_time: f32,
}

impl Simulation {
    pub fn new(count: usize) -> Result<Self> {
        let mut rng = rand::thread_rng();
        let store = ParticleStore::new(count, DEFAULT_GRAVITY, &mut rng)?;
        Ok(Self::from_store(store))
    }

    /// Wrap a pre-built store; tunables start at their defaults.
    pub fn from_store(store: ParticleStore) -> Self {
        Self {
            store,
            gravity_strength: DEFAULT_GRAVITY,
            damping: DEFAULT_DAMPING,
            time_scale: DEFAULT_TIME_SCALE,
            paused: false,
            elapsed_time: 0.0,
        }
    }

    /// Snapshot the frame parameters for one step.
    pub fn frame_params(&self, dt: f32) -> SimParams {
        SimParams {
            particle_count: self.store.len() as u32,
            delta_time: dt * self.time_scale,
            gravity_strength: self.gravity_strength,
            damping: self.damping,
        }
    }

    /// Advance one frame: parameter snapshot, force pass, integration pass.
    pub fn step(&mut self, dt: f32) {
        if self.paused {
            return;
        }
        let params = self.frame_params(dt);
        let forces = compute_forces(self.store.particles(), &params);
        integrate(self.store.particles_mut(), &forces, &params);
        self.elapsed_time += params.delta_time;
    }

    /// Re-seed every particle with fresh randomness.
    pub fn reset(&mut self) {
        let mut rng = rand::thread_rng();
        self.store.reset(self.gravity_strength, &mut rng);
        self.elapsed_time = 0.0;
        log::info!("simulation reset with {} particles", self.store.len());
    }

    /// Change the particle count. This is a full rebuild of the store; it
    /// must be sequenced between frames, never during one.
    pub fn set_particle_count(&mut self, count: usize) -> Result<()> {
        if count == self.store.len() {
            return Ok(());
        }
        let mut rng = rand::thread_rng();
        self.store.resize(count, self.gravity_strength, &mut rng)?;
        self.elapsed_time = 0.0;
        log::info!("particle store rebuilt with {count} particles");
        Ok(())
    }

    pub fn particle_count(&self) -> usize {
        self.store.len()
    }

    pub fn particles(&self) -> &[Particle] {
        self.store.particles()
    }

    pub fn elapsed_time(&self) -> f32 {
        self.elapsed_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(count: u32, delta_time: f32, gravity: f32, damping: f32) -> SimParams {
        SimParams {
            particle_count: count,
            delta_time,
            gravity_strength: gravity,
            damping,
        }
    }

    #[test]
    fn coincident_particles_produce_finite_force() {
        let particles = vec![
            Particle::new(Vec3::new(1.0, 2.0, 3.0), Vec3::ZERO, 0.8),
            Particle::new(Vec3::new(1.0, 2.0, 3.0), Vec3::ZERO, 0.6),
        ];
        let forces = compute_forces(&particles, &params(2, 0.016, 1.0, 1.0));
        for force in &forces {
            assert!(force.is_finite(), "softening must bound the force: {force:?}");
        }
        // Zero separation has no direction to push along.
        assert!(forces[0].length() < 1e-6);
    }

    #[test]
    fn two_body_attraction_is_equal_and_opposite() {
        let mut particles = vec![
            Particle::new(Vec3::new(-10.0, 0.0, 0.0), Vec3::ZERO, 1.0),
            Particle::new(Vec3::new(10.0, 0.0, 0.0), Vec3::ZERO, 1.0),
        ];
        let p = params(2, 0.016, 1.0, 1.0);
        let forces = compute_forces(&particles, &p);
        assert!((forces[0] + forces[1]).length() < 1e-6);
        assert!(forces[0].x > 0.0 && forces[1].x < 0.0);

        integrate(&mut particles, &forces, &p);
        // v ≈ g · m·m / r² · dt with r = 20; softening is negligible here.
        let expected = 1.0 * 1.0 * 1.0 / 400.0 * 0.016;
        assert!((particles[0].velocity.x - expected).abs() / expected < 1e-3);
        assert!((particles[0].velocity.x + particles[1].velocity.x).abs() < 1e-9);
        assert!(particles[0].position.x > -10.0 && particles[1].position.x < 10.0);
    }

    #[test]
    fn boundary_reflection_clamps_and_applies_restitution() {
        let mut particles = vec![
            Particle::new(Vec3::new(51.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0), 1.0),
            Particle::new(Vec3::new(-51.0, 3.0, 0.0), Vec3::new(-4.0, 1.0, 0.0), 1.0),
        ];
        let forces = vec![Vec3::ZERO; 2];
        // dt = 0 isolates the reflection from the motion update.
        integrate(&mut particles, &forces, &params(2, 0.0, 0.0, 1.0));

        assert_eq!(particles[0].position.x, 50.0);
        assert_eq!(particles[0].velocity.x, -1.6);
        assert_eq!(particles[1].position.x, -50.0);
        assert_eq!(particles[1].velocity.x, 3.2);
        // Other axes are untouched.
        assert_eq!(particles[1].position.y, 3.0);
        assert_eq!(particles[1].velocity.y, 1.0);
    }

    #[test]
    fn corner_overshoot_reflects_each_axis_independently() {
        let mut particles = vec![Particle::new(
            Vec3::new(52.0, -53.0, 0.0),
            Vec3::new(1.0, -2.0, 0.5),
            1.0,
        )];
        let forces = vec![Vec3::ZERO];
        integrate(&mut particles, &forces, &params(1, 0.0, 0.0, 1.0));

        assert_eq!(particles[0].position, Vec3::new(50.0, -50.0, 0.0));
        assert_eq!(particles[0].velocity, Vec3::new(-0.8, 1.6, 0.5));
    }

    #[test]
    fn damping_dissipates_kinetic_energy_monotonically() {
        let mut particles = vec![Particle::new(
            Vec3::ZERO,
            Vec3::new(3.0, -1.0, 2.0),
            1.0,
        )];
        let p = params(1, 0.016, 0.0, 0.9);
        let mut previous = 0.5 * particles[0].velocity.length_squared();
        for _ in 0..100 {
            let forces = compute_forces(&particles, &p);
            integrate(&mut particles, &forces, &p);
            let kinetic = 0.5 * particles[0].velocity.length_squared();
            assert!(kinetic < previous, "damping < 1 must dissipate energy");
            previous = kinetic;
        }
    }

    #[test]
    fn mirrored_configuration_stays_symmetric() {
        let mut particles = vec![
            Particle::new(Vec3::new(-10.0, 0.0, 0.0), Vec3::new(0.0, 0.2, 0.0), 0.7),
            Particle::new(Vec3::new(10.0, 0.0, 0.0), Vec3::new(0.0, -0.2, 0.0), 0.7),
        ];
        let p = params(2, 0.016, 1.0, 0.99);
        for _ in 0..500 {
            let forces = compute_forces(&particles, &p);
            integrate(&mut particles, &forces, &p);
            assert!((particles[0].position + particles[1].position).length() < 1e-3);
            assert!((particles[0].velocity + particles[1].velocity).length() < 1e-3);
        }
    }

    #[test]
    fn indices_beyond_the_live_count_are_skipped() {
        let mut particles = vec![
            Particle::new(Vec3::new(-5.0, 0.0, 0.0), Vec3::ZERO, 1.0),
            Particle::new(Vec3::new(5.0, 0.0, 0.0), Vec3::ZERO, 1.0),
            Particle::new(Vec3::new(0.0, 7.0, 0.0), Vec3::ZERO, 1.0),
        ];
        let p = params(2, 0.016, 1.0, 1.0);
        let forces = compute_forces(&particles, &p);
        assert_eq!(forces.len(), 3);
        assert_eq!(forces[2], Vec3::ZERO);

        let before = particles[2];
        integrate(&mut particles, &forces, &p);
        assert_eq!(particles[2], before, "dead slot must not move");
        // The live pair must not feel the dead particle either.
        assert_eq!(particles[0].velocity.y, 0.0);
    }

    #[test]
    fn mass_is_never_modified_by_integration() {
        let mut particles = vec![
            Particle::new(Vec3::new(-1.0, 0.0, 0.0), Vec3::ZERO, 0.55),
            Particle::new(Vec3::new(1.0, 0.0, 0.0), Vec3::ZERO, 0.95),
        ];
        let p = params(2, 0.016, 2.0, 0.98);
        for _ in 0..50 {
            let forces = compute_forces(&particles, &p);
            integrate(&mut particles, &forces, &p);
        }
        assert_eq!(particles[0].mass, 0.55);
        assert_eq!(particles[1].mass, 0.95);
    }
}
