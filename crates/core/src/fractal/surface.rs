//! Fractal surface features attached to the face of a fractal volume

use serde::{Deserialize, Serialize};

use crate::core_types::FaceArray;
use crate::error::{GeometryError, Result};

/// Box extents in grid indices: `[xs, xf, ys, yf, zs, zf]`
pub type Extents = [usize; 6];

/// Which positive-direction face of a volume a surface sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SurfaceOrientation {
    XPlus,
    YPlus,
    ZPlus,
}

impl SurfaceOrientation {
    /// Orientation for the maximum face normal to `axis` (0 = x, 1 = y, 2 = z)
    pub fn from_axis(axis: usize) -> Option<Self> {
        match axis {
            0 => Some(Self::XPlus),
            1 => Some(Self::YPlus),
            2 => Some(Self::ZPlus),
            _ => None,
        }
    }

    /// Index of the face normal (0 = x, 1 = y, 2 = z)
    pub fn axis(self) -> usize {
        match self {
            Self::XPlus => 0,
            Self::YPlus => 1,
            Self::ZPlus => 2,
        }
    }

    /// Surface tag: `"xplus"`, `"yplus"` or `"zplus"`
    pub fn as_str(self) -> &'static str {
        match self {
            Self::XPlus => "xplus",
            Self::YPlus => "yplus",
            Self::ZPlus => "zplus",
        }
    }
}

/// In-plane cell counts of the face of `extents` normal to `orientation`
///
/// An x-normal face spans `(y, z)`, y-normal `(x, z)`, z-normal `(x, y)`.
pub fn face_shape(extents: &Extents, orientation: SurfaceOrientation) -> (usize, usize) {
    let [xs, xf, ys, yf, zs, zf] = *extents;
    match orientation {
        SurfaceOrientation::XPlus => (yf - ys, zf - zs),
        SurfaceOrientation::YPlus => (xf - xs, zf - zs),
        SurfaceOrientation::ZPlus => (xf - xs, yf - ys),
    }
}

/// One batch of grass blades drawn onto a surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureBatch {
    count: usize,
    seed: Option<u64>,
}

impl FeatureBatch {
    pub fn new(count: usize, seed: Option<u64>) -> Self {
        Self { count, seed }
    }

    /// Number of blades in the batch
    pub fn count(&self) -> usize {
        self.count
    }

    /// Seed the blades were drawn with
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }
}

/// Planar feature surface on a fractal volume
///
/// Immutable once built; construct through [`FractalSurfaceBuilder`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FractalSurfaceFeature {
    id: String,
    extents: Extents,
    dimension: f64,
    orientation: SurfaceOrientation,
    fractal_range: (u32, u32),
    seed: Option<u64>,
    heights: FaceArray<u32>,
    batches: Vec<FeatureBatch>,
    operating_on: String,
}

impl FractalSurfaceFeature {
    /// Surface identifier (material class, e.g. `"grass"`)
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Face extents in grid indices
    pub fn extents(&self) -> &Extents {
        &self.extents
    }

    /// Fractal dimension
    pub fn dimension(&self) -> f64 {
        self.dimension
    }

    /// Face orientation
    pub fn orientation(&self) -> SurfaceOrientation {
        self.orientation
    }

    /// Height range `[lo, hi)` in cells
    pub fn fractal_range(&self) -> (u32, u32) {
        self.fractal_range
    }

    /// Seed used for sampling
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Per-cell feature heights (0 = no feature)
    pub fn heights(&self) -> &FaceArray<u32> {
        &self.heights
    }

    /// Feature batches drawn onto this surface
    pub fn batches(&self) -> &[FeatureBatch] {
        &self.batches
    }

    /// Identifier of the volume the surface belongs to
    pub fn operating_on(&self) -> &str {
        &self.operating_on
    }
}

/// Staged construction of a [`FractalSurfaceFeature`]
#[derive(Debug, Clone)]
pub struct FractalSurfaceBuilder {
    id: String,
    extents: Extents,
    dimension: f64,
    orientation: SurfaceOrientation,
    fractal_range: (u32, u32),
    seed: Option<u64>,
    heights: Option<FaceArray<u32>>,
    batches: Vec<FeatureBatch>,
    operating_on: String,
}

impl FractalSurfaceBuilder {
    pub fn new(
        id: impl Into<String>,
        extents: Extents,
        orientation: SurfaceOrientation,
        dimension: f64,
    ) -> Self {
        Self {
            id: id.into(),
            extents,
            dimension,
            orientation,
            fractal_range: (0, 1),
            seed: None,
            heights: None,
            batches: Vec::new(),
            operating_on: String::new(),
        }
    }

    /// In-plane shape the height array must have
    pub fn face_shape(&self) -> (usize, usize) {
        face_shape(&self.extents, self.orientation)
    }

    pub fn seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn fractal_range(mut self, range: (u32, u32)) -> Self {
        self.fractal_range = range;
        self
    }

    pub fn operating_on(mut self, volume_id: impl Into<String>) -> Self {
        self.operating_on = volume_id.into();
        self
    }

    pub fn heights(mut self, heights: FaceArray<u32>) -> Self {
        self.heights = Some(heights);
        self
    }

    pub fn batch(mut self, batch: FeatureBatch) -> Self {
        self.batches.push(batch);
        self
    }

    /// Finish construction
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::InvalidGeometry`] if no height array was
    /// supplied or its shape does not match the face
    pub fn build(self) -> Result<FractalSurfaceFeature> {
        const CMD: &str = "#fractal_surface";
        let expected = self.face_shape();
        let heights = self
            .heights
            .ok_or_else(|| GeometryError::invalid_geometry(CMD, "surface has no height array"))?;
        if heights.shape() != expected {
            return Err(GeometryError::invalid_geometry(
                CMD,
                format!(
                    "height array shape {:?} does not match face shape {expected:?}",
                    heights.shape()
                ),
            ));
        }
        Ok(FractalSurfaceFeature {
            id: self.id,
            extents: self.extents,
            dimension: self.dimension,
            orientation: self.orientation,
            fractal_range: self.fractal_range,
            seed: self.seed,
            heights,
            batches: self.batches,
            operating_on: self.operating_on,
        })
    }
}
