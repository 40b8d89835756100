pub mod aabb3d;
pub mod math;
pub mod octree;
