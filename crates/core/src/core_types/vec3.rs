//! Vector type alias for 3D points and offsets.

use nalgebra::Vector3;

/// 3D vector type for physical-space points (metres).
///
/// This is a simple alias for `nalgebra::Vector3<f64>`. FDTD time steps sit
/// around 1e-12 s, so the geometry layer works in double precision.
pub type Vec3 = Vector3<f64>;
