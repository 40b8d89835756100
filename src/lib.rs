//! bhtree library
//!
//! Spatial decomposition for Barnes-Hut N-body approximation: an octree over
//! particle positions that grows its bounding cube without discarding built
//! structure, plus the configuration and body generation used by the driver.

pub mod cli;
pub mod config;
pub mod generation;
pub mod identity_table;
pub mod physics;
pub mod prelude;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used items
pub use crate::config::BhTreeConfig;
pub use crate::physics::math::{Scalar, Vector};
pub use crate::physics::octree::{Octree, OctreeError, Particle};
