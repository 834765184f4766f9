//! Fractal volumes: axis-aligned boxes that carry feature surfaces

use serde::{Deserialize, Serialize};

use crate::error::{GeometryError, Result};
use crate::fractal::surface::{Extents, FractalSurfaceFeature};

/// Axis-aligned box in grid-index space with attached feature surfaces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FractalVolume {
    id: String,
    extents: Extents,
    surfaces: Vec<FractalSurfaceFeature>,
}

impl FractalVolume {
    /// Create a volume from `[xs, xf, ys, yf, zs, zf]`
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::InvalidGeometry`] if a start exceeds its finish
    pub fn new(id: impl Into<String>, extents: Extents) -> Result<Self> {
        let id = id.into();
        if extents[0] > extents[1] || extents[2] > extents[3] || extents[4] > extents[5] {
            return Err(GeometryError::invalid_geometry(
                "#fractal_box",
                format!("'{id}' has inverted extents {extents:?}"),
            ));
        }
        Ok(Self {
            id,
            extents,
            surfaces: Vec::new(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// `[xs, xf, ys, yf, zs, zf]`
    pub fn extents(&self) -> &Extents {
        &self.extents
    }

    /// Start index on `axis`
    pub fn start(&self, axis: usize) -> usize {
        self.extents[2 * axis]
    }

    /// Finish index on `axis`
    pub fn finish(&self, axis: usize) -> usize {
        self.extents[2 * axis + 1]
    }

    /// Surfaces attached so far, in attachment order
    pub fn surfaces(&self) -> &[FractalSurfaceFeature] {
        &self.surfaces
    }

    pub(crate) fn attach_surface(&mut self, surface: FractalSurfaceFeature) {
        self.surfaces.push(surface);
    }
}
