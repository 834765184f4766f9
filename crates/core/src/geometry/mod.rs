//! Operators that mutate the grid geometry
//!
//! - [`AddGrass`] scatters grass blades over the external face of a fractal box
//! - [`GeometryObjectsRead`] imports a voxel dataset and its material file

pub mod add_grass;
pub mod compositor;
pub mod dataset;
pub mod geometry_objects_read;
pub mod material_file;
pub mod rotation;

pub use add_grass::AddGrass;
pub use compositor::{
    select_compositor, ArrayCopyCompositor, CompositePath, Compositor, VoxelCompositor,
};
pub use dataset::{
    AuxiliaryVolumes, GeometryDataset, ImportedGeometry, StoredValues, StoredVolume, BACKGROUND_ID,
};
pub use geometry_objects_read::{GeometryObjectsRead, MergeReport};
pub use material_file::{
    material_commands, read_material_commands, HashCommandProcessor, MaterialCommandProcessor,
};
pub use rotation::{Rotation, RotationAxis};
