//! FDTD Geometry Core Library
//!
//! Grid-mutating operators for a volumetric finite-difference time-domain
//! model: stochastic placement of grass blades on the external face of a
//! fractal box, and import of pre-built voxel geometry with its materials.
//!
//! ## Grid model
//!
//! - `solid` holds one material id per cell
//! - `rigid_e` / `rigid_h` flag cells whose edges and faces are not averaged
//! - `id` holds the material id of every Yee field component
//!
//! Material ids index the grid's [`MaterialRegistry`]; `pec` (0) and
//! `free_space` (1) are always present.

// Core types and utilities
pub mod core_types;
pub mod error;

// Grid state and fractal volumes
pub mod fractal;
pub mod grid;

// Operators
pub mod geometry;

// Re-export core types
pub use core_types::{ComponentArray, FaceArray, Vec3, VoxelArray};
pub use error::{GeometryError, Result};

// Re-export grid and fractal types
pub use fractal::{
    FeatureBatch, FractalSurfaceFeature, FractalVolume, GradientNoiseField, SurfaceOrientation,
    SurfaceProbabilityField, UniformField,
};
pub use grid::{GridConfig, GridState, Material, MaterialRegistry, MaterialSpec};

// Re-export operators
pub use geometry::{
    AddGrass, CompositePath, GeometryDataset, GeometryObjectsRead, HashCommandProcessor,
    MaterialCommandProcessor, MergeReport, RotationAxis,
};
