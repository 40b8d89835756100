//! Barnes-Hut octree over particle positions.
//!
//! The tree covers the cube `[origin, origin + edge)`. Before a particle is
//! inserted the cube is grown with [`Octree::expand_to_fit`], which doubles the
//! edge and wraps the existing root in a new top-level cell so that no
//! previously built structure is discarded. Insertion then descends by octant
//! codes derived from fixed-point coordinates (see [`index`]) and allocates a
//! cell only where two particles would collide in the same slot.

pub mod error;
pub mod index;
pub mod iter;
pub mod node;
mod parallel;

use bevy::log::{debug, info, trace};

use crate::config::{BuildStrategy, TreeConfig};
use crate::physics::aabb3d::Aabb3d;
use crate::physics::math::{DIMENSIONS, Scalar, Vector};

pub use error::OctreeError;
pub use index::{IMAX, IntCoord, ROOT_LEVEL};
pub use iter::{ParticleIds, Particles};
pub use node::{Cell, CellId, NodeRef, Particle, ParticleId, Slot, SpatialNode};

use node::Arena;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OctreeStats {
    pub cell_count: usize,
    pub particle_count: usize,
    /// Depth of the deepest particle; a lone root particle has depth 0.
    pub max_depth: usize,
    pub origin: Vector,
    pub edge: Scalar,
}

#[derive(Debug, Clone)]
pub struct Octree {
    root: Slot,
    origin: Vector,
    edge: Scalar,
    arena: Arena,
}

impl Octree {
    pub fn new(origin: Vector, edge: Scalar) -> Self {
        Self {
            root: Slot::Empty,
            origin,
            edge,
            arena: Arena::default(),
        }
    }

    pub fn from_config(config: &TreeConfig) -> Self {
        Self::new(Vector::from_array(config.origin), config.edge)
    }

    pub fn with_capacity(mut self, particles: usize) -> Self {
        self.arena = Arena::with_capacity(particles);
        self
    }

    #[inline]
    pub fn origin(&self) -> Vector {
        self.origin
    }

    #[inline]
    pub fn edge(&self) -> Scalar {
        self.edge
    }

    pub fn bounds(&self) -> Aabb3d {
        Aabb3d::cube(self.origin, self.edge)
    }

    /// Number of particles stored in the tree.
    pub fn len(&self) -> usize {
        self.arena.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    pub fn cell_count(&self) -> usize {
        self.arena.cells.len()
    }

    /// Strict containment of `position` in the current cube.
    pub fn in_bounds(&self, position: Vector) -> bool {
        index::in_bounds(position, self.origin, self.edge)
    }

    pub fn intcoord(&self, position: Vector) -> Result<IntCoord, OctreeError> {
        index::intcoord(position, self.origin, self.edge)
    }

    pub fn root(&self) -> Option<SpatialNode<'_>> {
        self.root.node().map(|node| self.node(node))
    }

    pub fn root_ref(&self) -> Option<NodeRef> {
        self.root.node()
    }

    pub fn node(&self, node: NodeRef) -> SpatialNode<'_> {
        match node {
            NodeRef::Particle(id) => SpatialNode::Particle(self.arena.particle(id)),
            NodeRef::Cell(id) => SpatialNode::Cell(self.arena.cell(id)),
        }
    }

    pub fn cell(&self, id: CellId) -> &Cell {
        self.arena.cell(id)
    }

    pub fn cell_mut(&mut self, id: CellId) -> &mut Cell {
        self.arena.cell_mut(id)
    }

    pub fn particle(&self, id: ParticleId) -> &Particle {
        self.arena.particle(id)
    }

    /// Mutable access for the integrator. Changing `position` here does not
    /// move the particle within the tree; rebuild for that.
    pub fn particle_mut(&mut self, id: ParticleId) -> &mut Particle {
        &mut self.arena.particles[id.0]
    }

    /// Drop every node but keep the grown cube and the arena's capacity, so
    /// the next timestep starts from the previous extent.
    pub fn clear(&mut self) {
        self.root = Slot::Empty;
        self.arena.clear();
    }

    /// Drop every node and restore the given cube.
    pub fn reset(&mut self, origin: Vector, edge: Scalar) {
        self.clear();
        self.origin = origin;
        self.edge = edge;
    }

    /// Grow the cube until `particle` lies strictly inside it, salvaging the
    /// existing tree. Returns the number of doublings performed.
    ///
    /// Each doubling shifts the origin down by one edge on every axis where
    /// the particle lies below the current midpoint, doubles the edge, and
    /// moves the old root into the slot of a new top-level cell that covers
    /// the old cube.
    ///
    /// Fails with [`OctreeError::OutOfBounds`] if the grown cube would stop
    /// being finite; the tree is then left exactly as it was.
    pub fn expand_to_fit(&mut self, particle: &Particle) -> Result<u32, OctreeError> {
        let position = particle.position;
        if !position.is_finite() {
            return Err(OctreeError::OutOfBounds { position });
        }

        // Plan the whole growth against a scratch cube first; nothing is
        // written to the tree unless every doubling is representable.
        let mut origin = self.origin;
        let mut edge = self.edge;
        let mut wraps = Vec::new();
        while !index::in_bounds(position, origin, edge) {
            if !(edge.is_finite() && edge > 0.0) {
                return Err(OctreeError::OutOfBounds { position });
            }

            let mid = origin + Vector::splat(0.5 * edge);
            for axis in 0..DIMENSIONS {
                if position[axis] < mid[axis] {
                    origin[axis] -= edge;
                }
            }
            edge *= 2.0;

            if !(edge.is_finite() && origin.is_finite()) {
                return Err(OctreeError::OutOfBounds { position });
            }
            let coord = index::intcoord(mid, origin, edge)?;
            wraps.push(index::octant_of(coord, ROOT_LEVEL));
        }

        if wraps.is_empty() {
            return Ok(0);
        }

        self.origin = origin;
        self.edge = edge;
        if self.root.node().is_some() {
            for &octant in &wraps {
                let old_root = self.root;
                let cell = self.arena.push_cell();
                self.arena.cell_mut(cell).slots[octant] = old_root;
                self.root = Slot::Cell(cell);
            }
        }

        debug!(
            "Expanded octree by {} doublings to origin {} edge {} for position {}",
            wraps.len(),
            self.origin,
            self.edge,
            position
        );
        Ok(wraps.len() as u32)
    }

    /// Insert a particle whose position is already inside the cube.
    ///
    /// An empty tree takes the particle as its root. Otherwise the tree is
    /// descended by octant; a collision with a resident particle is resolved by
    /// allocating cells down to the first level at which the two differ.
    pub fn insert(&mut self, particle: Particle) -> Result<ParticleId, OctreeError> {
        let frame = Frame::of(self);
        frame.insert(&mut self.arena, &mut self.root, particle, ROOT_LEVEL)
    }

    /// Every particle, in deterministic pre-order.
    pub fn iter_particles(&self) -> Particles<'_> {
        Particles::new(&self.arena, self.root)
    }

    /// Every particle with its handle, in the same order as
    /// [`iter_particles`](Self::iter_particles).
    pub fn iter_particle_ids(&self) -> ParticleIds<'_> {
        ParticleIds::new(&self.arena, self.root)
    }

    /// Rebuild the tree from `particles`: grow the cube for all of them first,
    /// then insert them in order. On error the tree is left empty.
    pub fn build(&mut self, particles: impl IntoIterator<Item = Particle>) -> Result<(), OctreeError> {
        let particles: Vec<Particle> = particles.into_iter().collect();
        self.clear();

        let result = self.build_sequential(particles);
        if result.is_err() {
            self.clear();
        }
        result
    }

    fn build_sequential(&mut self, particles: Vec<Particle>) -> Result<(), OctreeError> {
        self.expand_all(&particles)?;
        for particle in particles {
            self.insert(particle)?;
        }
        info!(
            "Built octree with {} particles in {} cells",
            self.len(),
            self.cell_count()
        );
        Ok(())
    }

    /// Rebuild with the given strategy. Batches smaller than
    /// `parallel_threshold` are always built sequentially.
    pub fn build_with(
        &mut self,
        strategy: BuildStrategy,
        parallel_threshold: usize,
        particles: Vec<Particle>,
    ) -> Result<(), OctreeError> {
        match strategy {
            BuildStrategy::Parallel if particles.len() >= parallel_threshold => {
                self.build_parallel(particles)
            }
            _ => self.build(particles),
        }
    }

    fn expand_all(&mut self, particles: &[Particle]) -> Result<(), OctreeError> {
        let doublings = particles.iter().try_fold(0, |total, particle| {
            self.expand_to_fit(particle).map(|count| total + count)
        })?;
        if doublings > 0 {
            debug!("Cube grew by {doublings} doublings to edge {}", self.edge);
        }
        Ok(())
    }

    pub fn stats(&self) -> OctreeStats {
        let mut max_depth = 0;
        let mut stack = vec![(self.root, 0)];
        while let Some((slot, depth)) = stack.pop() {
            match slot {
                Slot::Empty => {}
                Slot::Particle(_) => max_depth = max_depth.max(depth),
                Slot::Cell(id) => stack.extend(
                    self.arena
                        .cell(id)
                        .slots
                        .iter()
                        .map(|&child| (child, depth + 1)),
                ),
            }
        }

        OctreeStats {
            cell_count: self.cell_count(),
            particle_count: self.len(),
            max_depth,
            origin: self.origin,
            edge: self.edge,
        }
    }
}

impl<'a> IntoIterator for &'a Octree {
    type Item = &'a Particle;
    type IntoIter = Particles<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_particles()
    }
}

/// The cube a subtree is indexed against. Copied out of the tree so that
/// insertion can borrow the arena and root mutably.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Frame {
    origin: Vector,
    edge: Scalar,
}

impl Frame {
    fn of(tree: &Octree) -> Self {
        Self {
            origin: tree.origin,
            edge: tree.edge,
        }
    }

    #[inline]
    fn intcoord(&self, position: Vector) -> Result<IntCoord, OctreeError> {
        index::intcoord(position, self.origin, self.edge)
    }

    /// Insert `particle` into the subtree held by `root`, whose octant codes
    /// start at `level`.
    ///
    /// The collision depth is resolved before anything is written, so a
    /// [`OctreeError::DuplicatePosition`] leaves the arena untouched.
    pub(crate) fn insert(
        &self,
        arena: &mut Arena,
        root: &mut Slot,
        particle: Particle,
        level: u32,
    ) -> Result<ParticleId, OctreeError> {
        let coord = self.intcoord(particle.position)?;

        let mut parent: Option<(CellId, usize)> = None;
        let mut current = *root;
        let mut level = level;

        loop {
            match current {
                Slot::Empty => {
                    let id = arena.push_particle(particle);
                    Self::attach(arena, root, parent, Slot::Particle(id));
                    return Ok(id);
                }
                Slot::Cell(cell) => {
                    if level == 0 {
                        return Err(OctreeError::DuplicatePosition {
                            particle: Box::new(particle),
                            occupant: NodeRef::Cell(cell),
                        });
                    }
                    let octant = index::octant_of(coord, level);
                    parent = Some((cell, octant));
                    current = arena.cell(cell).slots[octant];
                    level >>= 1;
                }
                Slot::Particle(resident) => {
                    let resident_coord = self.intcoord(arena.particle(resident).position)?;

                    let mut split = level;
                    while split != 0
                        && index::octant_of(resident_coord, split) == index::octant_of(coord, split)
                    {
                        split >>= 1;
                    }
                    if split == 0 {
                        return Err(OctreeError::DuplicatePosition {
                            particle: Box::new(particle),
                            occupant: NodeRef::Particle(resident),
                        });
                    }

                    let id = arena.push_particle(particle);
                    let top = arena.push_cell();
                    Self::attach(arena, root, parent, Slot::Cell(top));

                    // Shared octants above the split level become a chain of
                    // single-child cells.
                    let mut cell = top;
                    while level != split {
                        let next = arena.push_cell();
                        arena.cell_mut(cell).slots[index::octant_of(coord, level)] = Slot::Cell(next);
                        cell = next;
                        level >>= 1;
                    }

                    let slots = &mut arena.cell_mut(cell).slots;
                    slots[index::octant_of(resident_coord, split)] = Slot::Particle(resident);
                    slots[index::octant_of(coord, split)] = Slot::Particle(id);

                    trace!(
                        "Separated {} from resident particle {} below level {}",
                        arena.particle(id).position,
                        resident.0,
                        split
                    );
                    return Ok(id);
                }
            }
        }
    }

    #[inline]
    fn attach(arena: &mut Arena, root: &mut Slot, parent: Option<(CellId, usize)>, slot: Slot) {
        match parent {
            Some((cell, octant)) => arena.cell_mut(cell).slots[octant] = slot,
            None => *root = slot,
        }
    }
}
