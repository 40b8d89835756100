//! Node types stored in the octree arena.
//!
//! Cells and particles live in flat vectors owned by the tree and refer to
//! each other through typed indices. A slot of a cell is an explicit tri-state
//! so traversal and insertion match exhaustively on it.

use crate::physics::math::{Scalar, Vector};

/// Handle to a particle stored in an [`Octree`](super::Octree).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParticleId(pub(crate) usize);

impl ParticleId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Handle to a cell stored in an [`Octree`](super::Octree).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(pub(crate) usize);

impl CellId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A body of the simulation; the leaf of the octree.
///
/// Only `position` is read by the tree. The remaining fields belong to the
/// integrator and force pass and are carried through insertion unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Particle {
    pub position: Vector,
    pub velocity: Vector,
    pub acceleration: Vector,
    pub new_acceleration: Vector,
    pub potential: Scalar,
    /// Index of the following body in the caller's body list. Not a tree edge.
    pub next: Option<usize>,
}

impl Particle {
    pub fn at(position: Vector) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn with_velocity(mut self, velocity: Vector) -> Self {
        self.velocity = velocity;
        self
    }
}

/// Internal node with eight octant slots.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cell {
    /// Aggregate position written by the force pass; zero when allocated.
    pub position: Vector,
    pub(crate) slots: [Slot; 8],
}

impl Cell {
    pub fn slots(&self) -> &[Slot; 8] {
        &self.slots
    }

    pub fn slot(&self, octant: usize) -> Slot {
        self.slots[octant]
    }

    /// Occupied slots with their octant codes, in slot order.
    pub fn children(&self) -> impl Iterator<Item = (usize, NodeRef)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(octant, slot)| slot.node().map(|node| (octant, node)))
    }
}

/// Handle to either kind of node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeRef {
    Particle(ParticleId),
    Cell(CellId),
}

/// Contents of a cell slot (or of the tree's root).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Slot {
    #[default]
    Empty,
    Particle(ParticleId),
    Cell(CellId),
}

impl Slot {
    pub fn node(self) -> Option<NodeRef> {
        match self {
            Slot::Empty => None,
            Slot::Particle(id) => Some(NodeRef::Particle(id)),
            Slot::Cell(id) => Some(NodeRef::Cell(id)),
        }
    }

    pub fn is_empty(self) -> bool {
        matches!(self, Slot::Empty)
    }
}

impl From<NodeRef> for Slot {
    fn from(node: NodeRef) -> Self {
        match node {
            NodeRef::Particle(id) => Slot::Particle(id),
            NodeRef::Cell(id) => Slot::Cell(id),
        }
    }
}

/// Borrowed view of a node, for collaborators walking the finished tree.
#[derive(Debug, Clone, Copy)]
pub enum SpatialNode<'a> {
    Particle(&'a Particle),
    Cell(&'a Cell),
}

impl SpatialNode<'_> {
    pub fn position(&self) -> Vector {
        match self {
            SpatialNode::Particle(particle) => particle.position,
            SpatialNode::Cell(cell) => cell.position,
        }
    }
}

/// Backing storage for every node of one tree. Nodes are never freed
/// individually; the whole arena is cleared at once.
#[derive(Debug, Clone, Default)]
pub(crate) struct Arena {
    pub(crate) cells: Vec<Cell>,
    pub(crate) particles: Vec<Particle>,
}

impl Arena {
    pub(crate) fn with_capacity(particles: usize) -> Self {
        Self {
            cells: Vec::with_capacity(particles),
            particles: Vec::with_capacity(particles),
        }
    }

    pub(crate) fn push_cell(&mut self) -> CellId {
        self.cells.push(Cell::default());
        CellId(self.cells.len() - 1)
    }

    pub(crate) fn push_particle(&mut self, particle: Particle) -> ParticleId {
        self.particles.push(particle);
        ParticleId(self.particles.len() - 1)
    }

    #[inline]
    pub(crate) fn cell(&self, id: CellId) -> &Cell {
        &self.cells[id.0]
    }

    #[inline]
    pub(crate) fn cell_mut(&mut self, id: CellId) -> &mut Cell {
        &mut self.cells[id.0]
    }

    #[inline]
    pub(crate) fn particle(&self, id: ParticleId) -> &Particle {
        &self.particles[id.0]
    }

    pub(crate) fn clear(&mut self) {
        self.cells.clear();
        self.particles.clear();
    }

    /// Move every node of `other` into this arena, re-basing its handles.
    /// Returns `root` translated into this arena's handle space.
    pub(crate) fn absorb(&mut self, other: Arena, root: Slot) -> Slot {
        let cell_base = self.cells.len();
        let particle_base = self.particles.len();
        let rebase = |slot: Slot| match slot {
            Slot::Empty => Slot::Empty,
            Slot::Particle(id) => Slot::Particle(ParticleId(id.0 + particle_base)),
            Slot::Cell(id) => Slot::Cell(CellId(id.0 + cell_base)),
        };

        self.particles.extend(other.particles);
        self.cells.extend(other.cells.into_iter().map(|mut cell| {
            for slot in cell.slots.iter_mut() {
                *slot = rebase(*slot);
            }
            cell
        }));

        rebase(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_children_skip_empty_slots() {
        let mut cell = Cell::default();
        cell.slots[2] = Slot::Particle(ParticleId(7));
        cell.slots[5] = Slot::Cell(CellId(1));

        let children: Vec<_> = cell.children().collect();
        assert_eq!(
            children,
            vec![
                (2, NodeRef::Particle(ParticleId(7))),
                (5, NodeRef::Cell(CellId(1)))
            ]
        );
    }

    #[test]
    fn test_slot_round_trips_through_node_ref() {
        let node = NodeRef::Cell(CellId(3));
        assert_eq!(Slot::from(node).node(), Some(node));
        assert_eq!(Slot::Empty.node(), None);
    }

    #[test]
    fn test_absorb_rebases_handles() {
        let mut arena = Arena::default();
        arena.push_particle(Particle::at(Vector::ZERO));
        arena.push_cell();

        let mut other = Arena::default();
        let particle = other.push_particle(Particle::at(Vector::ONE));
        let cell = other.push_cell();
        other.cell_mut(cell).slots[7] = Slot::Particle(particle);

        let root = arena.absorb(other, Slot::Cell(cell));

        assert_eq!(root, Slot::Cell(CellId(1)));
        assert_eq!(arena.cell(CellId(1)).slot(7), Slot::Particle(ParticleId(1)));
        assert_eq!(arena.particle(ParticleId(1)).position, Vector::ONE);
    }

    #[test]
    fn test_simulation_fields_survive_copy() {
        let particle = Particle {
            potential: -3.5,
            next: Some(4),
            ..Particle::at(Vector::X).with_velocity(Vector::Y)
        };

        assert_eq!(particle.velocity, Vector::Y);
        assert_eq!(particle.next, Some(4));
        assert_eq!(particle.potential, -3.5);
    }
}
