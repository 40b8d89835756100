//! Synthetic body distributions for the driver, benchmarks and tests.
//!
//! Bodies follow a Plummer model: positions are drawn from the Plummer density
//! profile and speeds by rejection sampling from its distribution function.
//! The set is then shifted so its center of mass and mean velocity are zero.

use std::f64::consts;
use std::ops::{Deref, DerefMut};

use rand::Rng;
use rand_chacha::{ChaCha8Rng, rand_core::SeedableRng};

use crate::physics::math::{Scalar, Vector};
use crate::physics::octree::Particle;

/// Length scale of the Plummer sphere in virial units.
const RADIUS_SCALE: Scalar = 3.0 * consts::PI / 16.0;
/// Largest cumulative mass fraction sampled; clips the unbounded tail.
const MAX_MASS_FRACTION: Scalar = 0.999;

#[derive(Debug, Clone, PartialEq)]
pub struct SharedRng(pub ChaCha8Rng);

impl SharedRng {
    pub fn from_seed(seed: u64) -> Self {
        Self(ChaCha8Rng::seed_from_u64(seed))
    }

    pub fn from_optional_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::from_seed(seed),
            None => Self::default(),
        }
    }
}

impl Default for SharedRng {
    fn default() -> Self {
        Self(ChaCha8Rng::from_rng(&mut rand::rng()))
    }
}

impl Deref for SharedRng {
    type Target = ChaCha8Rng;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for SharedRng {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

pub fn random_unit_vector(rng: &mut SharedRng) -> Vector {
    let theta = rng.random_range(0.0..=2.0 * consts::PI);
    let phi = libm::acos(rng.random_range(-1.0..=1.0));

    Vector::new(
        libm::sin(phi) * libm::cos(theta),
        libm::sin(phi) * libm::sin(theta),
        libm::cos(phi),
    )
}

fn plummer_radius(rng: &mut SharedRng) -> Scalar {
    let mass_fraction: Scalar = rng.random_range(0.0..MAX_MASS_FRACTION);
    1.0 / libm::sqrt(libm::pow(mass_fraction, -2.0 / 3.0) - 1.0)
}

/// Draw `q = v / v_escape` from `g(q) = q^2 (1 - q^2)^3.5` by rejection.
fn plummer_speed_ratio(rng: &mut SharedRng) -> Scalar {
    loop {
        let q: Scalar = rng.random_range(0.0..1.0);
        let y: Scalar = rng.random_range(0.0..0.1);
        if y <= q * q * libm::pow(1.0 - q * q, 3.5) {
            return q;
        }
    }
}

/// `count` bodies of a Plummer sphere. `next` links each body to the one
/// generated after it, forming the caller's body list.
pub fn plummer_bodies(count: usize, rng: &mut SharedRng) -> Vec<Particle> {
    let velocity_scale = libm::sqrt(1.0 / RADIUS_SCALE);
    let mut bodies = Vec::with_capacity(count);

    for i in 0..count {
        let radius = plummer_radius(rng);
        let position = random_unit_vector(rng) * (RADIUS_SCALE * radius);

        let escape_speed = consts::SQRT_2 / libm::pow(1.0 + radius * radius, 0.25);
        let speed = plummer_speed_ratio(rng) * escape_speed * velocity_scale;
        let velocity = random_unit_vector(rng) * speed;

        bodies.push(Particle {
            next: (i + 1 < count).then_some(i + 1),
            ..Particle::at(position).with_velocity(velocity)
        });
    }

    recenter(&mut bodies);
    bodies
}

fn recenter(bodies: &mut [Particle]) {
    if bodies.is_empty() {
        return;
    }

    let count = bodies.len() as Scalar;
    let (position_sum, velocity_sum) = bodies
        .iter()
        .fold((Vector::ZERO, Vector::ZERO), |(p, v), body| {
            (p + body.position, v + body.velocity)
        });
    let center = position_sum / count;
    let drift = velocity_sum / count;

    for body in bodies.iter_mut() {
        body.position -= center;
        body.velocity -= drift;
    }
}

/// Advance every body along its velocity. Stands in for the integrator
/// between tree rebuilds.
pub fn drift(bodies: &mut [Particle], time_step: Scalar) {
    for body in bodies.iter_mut() {
        body.position += body.velocity * time_step;
    }
}
