//! Geometry object datasets
//!
//! A dataset is a hierarchical document holding the pitch it was produced
//! at, a required material-id volume and, when it was exported from a grid,
//! the rigidity and component-id volumes of the same region. Documents are
//! encoded with `serde_json`.
//!
//! ```text
//! {
//!   "dx_dy_dz": [0.01, 0.01, 0.01],
//!   "data":   { "shape": [nx, ny, nz], "ids": { "dtype": "i16", "values": [...] } },
//!   "rigidE": { "components": 12, "shape": [nx, ny, nz], "data": [...] },
//!   "rigidH": { "components": 6,  "shape": [nx, ny, nz], "data": [...] },
//!   "ID":     { "components": 6,  "shape": [nx+1, ny+1, nz+1], "data": [...] }
//! }
//! ```
//!
//! `ID` entries use the same `-1` background marker as `data`: an edge or
//! face whose material is not part of the export keeps its destination id.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core_types::{element_count, ComponentArray, VoxelArray};
use crate::error::{GeometryError, Result};
use crate::grid::{GridState, ID_COMPONENTS, RIGID_E_COMPONENTS, RIGID_H_COMPONENTS};

/// Material id marking a voxel that must not be built
pub const BACKGROUND_ID: i32 = -1;

/// Material ids in their on-disk integer type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "dtype", content = "values", rename_all = "lowercase")]
pub enum StoredValues {
    U8(Vec<u8>),
    U16(Vec<u16>),
    U32(Vec<u32>),
    I8(Vec<i8>),
    I16(Vec<i16>),
    I32(Vec<i32>),
}

impl StoredValues {
    fn len(&self) -> usize {
        match self {
            Self::U8(v) => v.len(),
            Self::U16(v) => v.len(),
            Self::U32(v) => v.len(),
            Self::I8(v) => v.len(),
            Self::I16(v) => v.len(),
            Self::I32(v) => v.len(),
        }
    }

    /// Widen to `i32` so the background sentinel is representable
    fn to_signed(&self) -> Option<Vec<i32>> {
        match self {
            Self::U8(v) => Some(v.iter().map(|&x| i32::from(x)).collect()),
            Self::U16(v) => Some(v.iter().map(|&x| i32::from(x)).collect()),
            Self::U32(v) => v.iter().map(|&x| i32::try_from(x).ok()).collect(),
            Self::I8(v) => Some(v.iter().map(|&x| i32::from(x)).collect()),
            Self::I16(v) => Some(v.iter().map(|&x| i32::from(x)).collect()),
            Self::I32(v) => Some(v.clone()),
        }
    }
}

/// The primary material-id volume
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredVolume {
    pub shape: [usize; 3],
    #[serde(rename = "ids")]
    pub values: StoredValues,
}

/// On-disk geometry dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryDataset {
    /// Pitch the dataset was produced at (m)
    pub dx_dy_dz: [f64; 3],
    /// Material id per voxel; [`BACKGROUND_ID`] means "do not build"
    pub data: StoredVolume,
    #[serde(default, rename = "rigidE", skip_serializing_if = "Option::is_none")]
    pub rigid_e: Option<ComponentArray<i8>>,
    #[serde(default, rename = "rigidH", skip_serializing_if = "Option::is_none")]
    pub rigid_h: Option<ComponentArray<i8>>,
    #[serde(default, rename = "ID", skip_serializing_if = "Option::is_none")]
    pub id: Option<ComponentArray<i32>>,
}

/// Rigidity and component-id volumes exported alongside the material ids
#[derive(Debug, Clone, PartialEq)]
pub struct AuxiliaryVolumes {
    /// Shape `(12, sx, sy, sz)`
    pub rigid_e: ComponentArray<i8>,
    /// Shape `(6, sx, sy, sz)`
    pub rigid_h: ComponentArray<i8>,
    /// Shape `(6, sx + 1, sy + 1, sz + 1)`, [`BACKGROUND_ID`] = keep existing
    pub id: ComponentArray<i32>,
}

/// A dataset checked and converted for compositing
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedGeometry {
    /// Material ids relative to the imported material file, `-1` = background
    pub material_ids: VoxelArray<i32>,
    /// Present only when the dataset carried all three auxiliary volumes
    pub auxiliary: Option<AuxiliaryVolumes>,
}

impl ImportedGeometry {
    /// Extents of the imported region in cells
    pub fn shape(&self) -> [usize; 3] {
        self.material_ids.shape()
    }
}

impl GeometryDataset {
    /// Read a dataset document
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::Io`] if the file cannot be opened and
    /// [`GeometryError::Parse`] if it is not a valid document
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| GeometryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_reader(BufReader::new(file)).map_err(|source| GeometryError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write the dataset document
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::Io`] or [`GeometryError::Parse`] on failure
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|source| GeometryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::to_writer(BufWriter::new(file), self).map_err(|source| GeometryError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Export the box `[start, start + extent)` of a grid
    ///
    /// Material ids below `base` become background and the rest are stored
    /// relative to `base`, so the region can be re-imported alongside a
    /// material file that defines only the materials above `base`.
    pub fn from_grid_region(grid: &GridState, start: [usize; 3], extent: [usize; 3], base: u32) -> Self {
        let rebase = |v: u32| {
            v.checked_sub(base)
                .and_then(|v| i32::try_from(v).ok())
                .unwrap_or(BACKGROUND_ID)
        };
        let solid = grid.solid.slice(start, extent);
        let values = solid.as_slice().iter().map(|&v| rebase(v)).collect();
        let id_extent = extent.map(|e| e + 1);
        Self {
            dx_dy_dz: grid.pitch(),
            data: StoredVolume {
                shape: extent,
                values: StoredValues::I32(values),
            },
            rigid_e: Some(grid.rigid_e.slice(start, extent)),
            rigid_h: Some(grid.rigid_h.slice(start, extent)),
            id: Some(grid.id.slice(start, id_extent).map(rebase)),
        }
    }

    /// Check structure and convert to an [`ImportedGeometry`]
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::Dataset`] if the volume length disagrees with
    /// its shape, an id does not fit a signed 32-bit integer or is below -1,
    /// or the auxiliary volumes are not aligned with the material volume
    pub fn into_imported(self, path: &Path) -> Result<ImportedGeometry> {
        let shape = self.data.shape;
        let expected = element_count(&shape).ok_or_else(|| {
            GeometryError::dataset(path, format!("shape {shape:?} is too large"))
        })?;
        if self.data.values.len() != expected {
            return Err(GeometryError::dataset(
                path,
                format!(
                    "data holds {} values but declares shape {shape:?}",
                    self.data.values.len()
                ),
            ));
        }
        let values = self.data.values.to_signed().ok_or_else(|| {
            GeometryError::dataset(path, "material ids exceed the signed 32-bit range")
        })?;
        if values.iter().any(|&v| v < BACKGROUND_ID) {
            return Err(GeometryError::dataset(path, "material ids below -1 are not allowed"));
        }
        let material_ids = VoxelArray::from_vec(shape, values)
            .ok_or_else(|| GeometryError::dataset(path, "data does not match its shape"))?;

        let auxiliary = match (self.rigid_e, self.rigid_h, self.id) {
            (Some(rigid_e), Some(rigid_h), Some(id)) => {
                let id_shape = shape.map(|e| e.saturating_add(1));
                check_component(path, "rigidE", &rigid_e, RIGID_E_COMPONENTS, shape)?;
                check_component(path, "rigidH", &rigid_h, RIGID_H_COMPONENTS, shape)?;
                check_component(path, "ID", &id, ID_COMPONENTS, id_shape)?;
                if id.as_slice().iter().any(|&v| v < BACKGROUND_ID) {
                    return Err(GeometryError::dataset(path, "ID values below -1 are not allowed"));
                }
                Some(AuxiliaryVolumes {
                    rigid_e,
                    rigid_h,
                    id,
                })
            }
            _ => None,
        };

        Ok(ImportedGeometry {
            material_ids,
            auxiliary,
        })
    }
}

fn check_component<T: Copy>(
    path: &Path,
    name: &str,
    array: &ComponentArray<T>,
    components: usize,
    shape: [usize; 3],
) -> Result<()> {
    if !array.is_well_formed() || array.components() != components || array.shape() != shape {
        return Err(GeometryError::dataset(
            path,
            format!(
                "{name} has shape ({}, {:?}), expected ({components}, {shape:?})",
                array.components(),
                array.shape()
            ),
        ));
    }
    Ok(())
}
