//! Discretisation helpers and physical constants

/// Speed of light in vacuum (m/s)
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

/// Round to the nearest integer, resolving ties toward zero.
///
/// Matches decimal `ROUND_HALF_DOWN`: `2.5 -> 2`, `2.51 -> 3`, `-2.5 -> -2`.
/// Used for every physical-to-cell conversion so that a coordinate sitting
/// exactly between two cells always lands on the lower one.
#[must_use]
pub fn round_value(value: f64) -> i64 {
    let magnitude = value.abs();
    let floor = magnitude.floor();
    let rounded = if magnitude - floor > 0.5 {
        floor + 1.0
    } else {
        floor
    };
    let sign = if value < 0.0 { -1 } else { 1 };
    sign * rounded as i64
}

/// Courant-Friedrichs-Lewy time step limit for a 3D Yee grid (s)
///
/// dt = 1 / (c * sqrt(1/dx² + 1/dy² + 1/dz²))
#[must_use]
pub fn courant_time_step(dx: f64, dy: f64, dz: f64) -> f64 {
    1.0 / (SPEED_OF_LIGHT * (1.0 / (dx * dx) + 1.0 / (dy * dy) + 1.0 / (dz * dz)).sqrt())
}
