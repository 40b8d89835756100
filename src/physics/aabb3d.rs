use crate::physics::math::{Scalar, Vector};

/// Axis-aligned box, used to report the cube covered by an octree cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb3d {
    pub min: Vector,
    pub max: Vector,
}

impl Aabb3d {
    pub fn new(min: Vector, max: Vector) -> Self {
        Self { min, max }
    }

    /// The cube `[origin, origin + edge)` on every axis.
    pub fn cube(origin: Vector, edge: Scalar) -> Self {
        Self::new(origin, origin + Vector::splat(edge))
    }

    #[inline]
    pub fn center(&self) -> Vector {
        (self.min + self.max) * 0.5
    }

    #[inline]
    pub fn size(&self) -> Vector {
        self.max - self.min
    }

    /// Sub-box selected by an octant code. Axis 0 is the most significant of
    /// the three bits, matching the child ordering of a cell.
    pub fn octant(&self, octant: usize) -> Aabb3d {
        let center = self.center();
        let mut min = self.min;
        let mut max = self.max;

        for axis in 0..3 {
            if octant & (4 >> axis) != 0 {
                min[axis] = center[axis];
            } else {
                max[axis] = center[axis];
            }
        }

        Aabb3d::new(min, max)
    }

    /// Half-open containment test, `min <= p < max` on every axis.
    pub fn contains(&self, point: Vector) -> bool {
        point.cmpge(self.min).all() && point.cmplt(self.max).all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_octant_ordering_puts_axis_zero_in_high_bit() {
        let cube = Aabb3d::cube(Vector::ZERO, 2.0);

        assert_eq!(cube.octant(0), Aabb3d::cube(Vector::ZERO, 1.0));
        assert_eq!(cube.octant(4), Aabb3d::cube(Vector::new(1.0, 0.0, 0.0), 1.0));
        assert_eq!(cube.octant(2), Aabb3d::cube(Vector::new(0.0, 1.0, 0.0), 1.0));
        assert_eq!(cube.octant(1), Aabb3d::cube(Vector::new(0.0, 0.0, 1.0), 1.0));
        assert_eq!(cube.octant(7), Aabb3d::cube(Vector::ONE, 1.0));
    }

    #[test]
    fn test_octants_tile_parent() {
        let cube = Aabb3d::cube(Vector::new(-1.0, -1.0, -1.0), 2.0);
        let volume: Scalar = (0..8)
            .map(|octant| cube.octant(octant))
            .map(|child| {
                let size = child.size();
                size.x * size.y * size.z
            })
            .sum();

        assert!((volume - 8.0).abs() < 1e-12);
        assert!((0..8).all(|octant| cube.octant(octant).size() == Vector::ONE));
    }

    #[test]
    fn test_contains_is_half_open() {
        let cube = Aabb3d::cube(Vector::ZERO, 1.0);

        assert!(cube.contains(Vector::ZERO));
        assert!(cube.contains(Vector::splat(0.999)));
        assert!(!cube.contains(Vector::new(1.0, 0.5, 0.5)));
    }
}
