//! bhtree prelude module
//!
//! Re-exports the types most callers need to build and walk a tree.

pub use crate::config::{BhTreeConfig, BuildStrategy};
pub use crate::identity_table::IdentityTable;
pub use crate::physics::aabb3d::Aabb3d;
pub use crate::physics::math::{Scalar, Vector};
pub use crate::physics::octree::{
    Cell, CellId, NodeRef, Octree, OctreeError, OctreeStats, Particle, ParticleId, Slot,
    SpatialNode,
};
