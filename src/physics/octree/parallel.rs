//! Two-phase parallel construction.
//!
//! Growing the cube rewrites the root, so every `expand_to_fit` runs on the
//! calling thread first. Once the cube is final the particles are partitioned
//! by top-level octant; the eight subtrees are disjoint and are built on the
//! rayon pool, then grafted under a single top-level cell.

use bevy::log::info;
use rayon::prelude::*;

use super::node::{Arena, Particle, Slot};
use super::{Frame, Octree, OctreeError, index};

struct Subtree {
    arena: Arena,
    root: Slot,
}

impl Subtree {
    fn build(frame: Frame, particles: Vec<Particle>) -> Result<Self, OctreeError> {
        let mut arena = Arena::with_capacity(particles.len());
        let mut root = Slot::Empty;
        for particle in particles {
            frame.insert(&mut arena, &mut root, particle, index::ROOT_LEVEL >> 1)?;
        }
        Ok(Self { arena, root })
    }
}

impl Octree {
    /// Rebuild the tree from `particles`, inserting into the eight top-level
    /// octants concurrently.
    ///
    /// Produces the same shape as [`build`](Self::build) for the same input
    /// order; only the arena layout differs. On error the tree is left empty.
    pub fn build_parallel(&mut self, particles: Vec<Particle>) -> Result<(), OctreeError> {
        if particles.len() < 2 {
            return self.build(particles);
        }

        self.clear();
        let result = self.build_partitioned(particles);
        if result.is_err() {
            self.clear();
        }
        result
    }

    fn build_partitioned(&mut self, particles: Vec<Particle>) -> Result<(), OctreeError> {
        self.expand_all(&particles)?;

        let frame = Frame::of(self);
        let mut buckets: Vec<Vec<Particle>> = (0..8).map(|_| Vec::new()).collect();
        for particle in particles {
            let coord = frame.intcoord(particle.position)?;
            buckets[index::octant_of(coord, index::ROOT_LEVEL)].push(particle);
        }

        let subtrees: Vec<Result<Subtree, OctreeError>> = buckets
            .into_par_iter()
            .map(|bucket| Subtree::build(frame, bucket))
            .collect();

        let top = self.arena.push_cell();
        for (octant, subtree) in subtrees.into_iter().enumerate() {
            let subtree = subtree?;
            let slot = self.arena.absorb(subtree.arena, subtree.root);
            self.arena.cell_mut(top).slots[octant] = slot;
        }
        self.root = Slot::Cell(top);

        info!(
            "Built octree in parallel with {} particles in {} cells",
            self.len(),
            self.cell_count()
        );
        Ok(())
    }
}
