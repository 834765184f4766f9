//! Quarter-turn rotation of two-point objects

use nalgebra::{Rotation3, Vector3};
use serde::{Deserialize, Serialize};

use crate::core_types::Vec3;
use crate::error::{GeometryError, Result};

/// Axis a two-point object is rotated about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RotationAxis {
    X,
    Y,
    Z,
}

impl RotationAxis {
    /// Parse `'x'`, `'y'` or `'z'`
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'x' => Some(Self::X),
            'y' => Some(Self::Y),
            'z' => Some(Self::Z),
            _ => None,
        }
    }

    fn unit(self) -> nalgebra::Unit<Vector3<f64>> {
        match self {
            Self::X => Vector3::x_axis(),
            Self::Y => Vector3::y_axis(),
            Self::Z => Vector3::z_axis(),
        }
    }
}

/// Rotation applied to an object's corner points before it is built
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rotation {
    pub axis: RotationAxis,
    /// Angle in degrees; must be a multiple of 90 in `[0, 360]`
    pub angle: f64,
    /// Centre of rotation (m); the midpoint of the two points when `None`
    pub origin: Option<Vec3>,
}

impl Rotation {
    /// Rotate the corner points of an axis-aligned object
    ///
    /// Returns the rotated box as `(min corner, max corner)`.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::InvalidParameter`] if the angle is not a
    /// quarter turn in `[0, 360]`
    pub fn apply(&self, p1: &Vec3, p2: &Vec3, cmd: &'static str) -> Result<(Vec3, Vec3)> {
        if !self.angle.is_finite() || !(0.0..=360.0).contains(&self.angle) {
            return Err(GeometryError::invalid_parameter(
                cmd,
                format!("rotation angle must be between 0 and 360 degrees, got {}", self.angle),
            ));
        }
        if (self.angle / 90.0).fract() != 0.0 {
            return Err(GeometryError::invalid_parameter(
                cmd,
                format!("can only be rotated by multiples of 90 degrees, got {}", self.angle),
            ));
        }

        let origin = self.origin.unwrap_or_else(|| p1 + (p2 - p1) / 2.0);
        let rot = Rotation3::from_axis_angle(&self.axis.unit(), self.angle.to_radians());
        let a = origin + rot * (p1 - origin);
        let b = origin + rot * (p2 - origin);

        // Quarter turns leave ~1e-16 residue on the zeroed sine/cosine terms
        let snap = |v: Vec3| v.map(|c| (c * 1e9).round() / 1e9);
        let (a, b) = (snap(a), snap(b));
        Ok((a.inf(&b), a.sup(&b)))
    }
}
