/// Scalar type for physics calculations (f64 for precision)
pub type Scalar = f64;

/// 3D vector type for positions, velocities, and accelerations
pub type Vector = bevy::math::DVec3;

/// Number of spatial dimensions; vectors are addressed by axis `0..DIMENSIONS`.
pub const DIMENSIONS: usize = 3;
