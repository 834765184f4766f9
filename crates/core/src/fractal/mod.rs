//! Fractal volumes, their feature surfaces and the probability fields used
//! to scatter features over a face

pub mod field;
pub mod surface;
pub mod volume;

pub use field::{GradientNoiseField, SurfaceProbabilityField, UniformField};
pub use surface::{
    face_shape, Extents, FeatureBatch, FractalSurfaceBuilder, FractalSurfaceFeature,
    SurfaceOrientation,
};
pub use volume::FractalVolume;
