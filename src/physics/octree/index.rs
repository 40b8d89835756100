//! Fixed-point indexing of positions within the octree's bounding cube.
//!
//! Positions are rescaled into `[0, 1)` against the cube and discretized to
//! integers in `[0, IMAX)` per axis. Octant membership at a subdivision level
//! is then a single bit test on each axis.

use super::error::OctreeError;
use crate::physics::math::{DIMENSIONS, Scalar, Vector};

/// Grid resolution. Level masks start at `IMAX >> 1` and halve toward 1, so
/// the deepest representable cell is 30 levels below the root.
pub const IMAX: u32 = 1 << 30;

/// Level mask of the root cell.
pub const ROOT_LEVEL: u32 = IMAX >> 1;

/// Per-axis integer grid coordinate.
pub type IntCoord = [u32; DIMENSIONS];

#[inline]
fn scaled(position: Vector, origin: Vector, edge: Scalar, axis: usize) -> Scalar {
    (position[axis] - origin[axis]) / edge
}

/// Discretize `position` against the cube `[origin, origin + edge)`.
///
/// Fails with [`OctreeError::OutOfBounds`] when any axis falls outside
/// `[0, 1)` after rescaling, including NaN.
pub fn intcoord(position: Vector, origin: Vector, edge: Scalar) -> Result<IntCoord, OctreeError> {
    let mut coord = [0; DIMENSIONS];
    for (axis, value) in coord.iter_mut().enumerate() {
        let xsc = scaled(position, origin, edge, axis);
        if !(0.0..1.0).contains(&xsc) {
            return Err(OctreeError::OutOfBounds { position });
        }
        *value = (IMAX as Scalar * xsc).floor() as u32;
    }
    Ok(coord)
}

/// Octant code of `coord` at the level selected by the single-bit mask
/// `level`. Axis 0 is the most significant bit of the code.
#[inline]
pub fn octant_of(coord: IntCoord, level: u32) -> usize {
    coord
        .iter()
        .enumerate()
        .filter(|(_, value)| *value & level != 0)
        .fold(0, |octant, (axis, _)| octant | (4 >> axis))
}

/// Strict containment: `0 < xsc < 1` on every axis. A position lying exactly
/// on a face of the cube is out of bounds and forces another growth step.
#[inline]
pub fn in_bounds(position: Vector, origin: Vector, edge: Scalar) -> bool {
    (0..DIMENSIONS).all(|axis| {
        let xsc = scaled(position, origin, edge, axis);
        0.0 < xsc && xsc < 1.0
    })
}
