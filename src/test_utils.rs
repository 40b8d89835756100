//! Helpers shared by unit tests

use rand::Rng;

use crate::generation::{SharedRng, random_unit_vector};
use crate::physics::math::{Scalar, Vector};
use crate::physics::octree::Particle;

pub fn particle(x: Scalar, y: Scalar, z: Scalar) -> Particle {
    Particle::at(Vector::new(x, y, z))
}

/// Bodies spread through a ball of `radius` around the origin, linked in
/// generation order through `next`.
pub fn sample_particles(count: usize, seed: u64, radius: Scalar) -> Vec<Particle> {
    let mut rng = SharedRng::from_seed(seed);
    (0..count)
        .map(|i| {
            let r = radius * libm::cbrt(rng.random_range(0.0..1.0));
            Particle {
                next: (i + 1 < count).then_some(i + 1),
                ..Particle::at(random_unit_vector(&mut rng) * r)
            }
        })
        .collect()
}
