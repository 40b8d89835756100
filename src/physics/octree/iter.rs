use std::iter::FusedIterator;

use super::node::{Arena, Particle, ParticleId, Slot};

/// Lazy pre-order walk over the leaves of a tree.
///
/// Slots of each cell are visited in octant order `0..8`; cells themselves are
/// never yielded. Holding the iterator borrows the tree, so it cannot overlap
/// with insertion.
#[derive(Debug, Clone)]
pub struct ParticleIds<'a> {
    arena: &'a Arena,
    stack: Vec<Slot>,
}

impl<'a> ParticleIds<'a> {
    pub(crate) fn new(arena: &'a Arena, root: Slot) -> Self {
        let mut stack = Vec::with_capacity(64);
        stack.push(root);
        Self { arena, stack }
    }
}

impl<'a> Iterator for ParticleIds<'a> {
    type Item = (ParticleId, &'a Particle);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(slot) = self.stack.pop() {
            match slot {
                Slot::Empty => {}
                Slot::Particle(id) => return Some((id, self.arena.particle(id))),
                Slot::Cell(id) => self
                    .stack
                    .extend(self.arena.cell(id).slots.iter().rev().copied()),
            }
        }
        None
    }
}

impl FusedIterator for ParticleIds<'_> {}

/// Every particle of a tree, in the same order as [`ParticleIds`].
#[derive(Debug, Clone)]
pub struct Particles<'a> {
    inner: ParticleIds<'a>,
}

impl<'a> Particles<'a> {
    pub(crate) fn new(arena: &'a Arena, root: Slot) -> Self {
        Self {
            inner: ParticleIds::new(arena, root),
        }
    }
}

impl<'a> Iterator for Particles<'a> {
    type Item = &'a Particle;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, particle)| particle)
    }
}

impl FusedIterator for Particles<'_> {}
