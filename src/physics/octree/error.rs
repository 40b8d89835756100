use std::fmt;

use super::node::{NodeRef, Particle};
use crate::physics::math::Vector;

/// Failures reported by octree construction.
#[derive(Debug, Clone, PartialEq)]
pub enum OctreeError {
    /// A coordinate fell outside the bounding cube after it was supposed to
    /// have been grown to contain it. This is an invariant violation and is
    /// never retried.
    OutOfBounds { position: Vector },
    /// Two particles share an octant at every representable level. The
    /// rejected particle is handed back untouched; the tree is unchanged.
    DuplicatePosition {
        particle: Box<Particle>,
        occupant: NodeRef,
    },
}

impl fmt::Display for OctreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OctreeError::OutOfBounds { position } => {
                write!(f, "Position {position} is outside the octree bounds")
            }
            OctreeError::DuplicatePosition { particle, occupant } => write!(
                f,
                "Position {} cannot be separated from {occupant:?} at the finest grid resolution",
                particle.position
            ),
        }
    }
}

impl std::error::Error for OctreeError {}
