//! Import of a pre-built geometry dataset and its materials into the grid

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::core_types::{round_value, Vec3};
use crate::error::{GeometryError, Result};
use crate::geometry::compositor::{select_compositor, CompositePath};
use crate::geometry::dataset::GeometryDataset;
use crate::geometry::material_file::{read_material_commands, MaterialCommandProcessor};
use crate::grid::{GridState, IMPORTED_TAG};

const CMD: &str = "#geometry_objects_read";

/// Request to insert a geometry dataset at a point in the domain.
#[derive(Debug, Clone, Default)]
pub struct GeometryObjectsRead {
    /// Lower-left corner of the inserted geometry (m)
    pub p1: Option<Vec3>,
    /// Geometry dataset
    pub geofile: Option<PathBuf>,
    /// Material definitions used by the dataset
    pub matfile: Option<PathBuf>,
}

/// What a successful merge did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeReport {
    /// Cell offset the dataset was written at
    pub offset: [usize; 3],
    /// Material count before import, added to every stored id
    pub base_material: u32,
    /// Number of materials registered from the material file
    pub new_materials: usize,
    /// Compositing strategy used
    pub path: CompositePath,
}

impl GeometryObjectsRead {
    /// Register the file's materials and write the dataset into the grid
    ///
    /// Relative paths that do not exist as given are looked up under
    /// `input_dir`. Every check, including the dataset pitch and bounds, runs
    /// before the first material is registered.
    ///
    /// # Errors
    ///
    /// - [`GeometryError::MissingParameter`] for an absent field
    /// - [`GeometryError::InvalidGeometry`] if `p1` is outside the domain
    /// - [`GeometryError::ResolutionMismatch`] if the dataset pitch differs
    ///   from the grid pitch on any axis
    /// - [`GeometryError::DomainOverflow`] if the dataset does not fit at `p1`
    /// - [`GeometryError::DuplicateMaterial`] if the file redefines a material
    /// - I/O, parse and dataset errors from reading either file
    pub fn create(
        &self,
        grid: &mut GridState,
        input_dir: &Path,
        processor: &dyn MaterialCommandProcessor,
    ) -> Result<MergeReport> {
        let missing = |param| GeometryError::MissingParameter { cmd: CMD, param };
        let p1 = self.p1.ok_or_else(|| missing("p1"))?;
        let geofile = self.geofile.as_deref().ok_or_else(|| missing("geofile"))?;
        let matfile = self.matfile.as_deref().ok_or_else(|| missing("matfile"))?;

        let offset = grid.check_point(&p1, CMD)?;
        let geofile = resolve(geofile, input_dir);
        let matfile = resolve(matfile, input_dir);

        let commands = read_material_commands(&matfile)?;
        let specs = processor.materials_from_commands(&commands)?;
        debug!("{CMD} {} material commands from {}", commands.len(), matfile.display());

        let dataset = GeometryDataset::load(&geofile)?;
        check_pitch(grid, dataset.dx_dy_dz)?;
        let geometry = dataset.into_imported(&geofile)?;

        let shape = geometry.shape();
        let cells = grid.cells();
        for axis in 0..3 {
            let end = offset[axis].saturating_add(shape[axis]);
            if end > cells[axis] {
                return Err(GeometryError::DomainOverflow {
                    cmd: CMD,
                    axis: ['x', 'y', 'z'][axis],
                    requested: end,
                    available: cells[axis],
                });
            }
        }
        for (i, spec) in specs.iter().enumerate() {
            if grid.materials.contains(&spec.id) || specs[..i].iter().any(|s| s.id == spec.id) {
                return Err(GeometryError::DuplicateMaterial(spec.id.clone()));
            }
        }

        let base = grid.materials.len() as u32;
        let new_materials = specs.len();
        for spec in specs {
            grid.materials.register(spec)?;
        }
        for material in grid.materials.iter_mut().filter(|m| m.num_id() >= base) {
            material.tag(IMPORTED_TAG);
        }

        let compositor = select_compositor(&geometry);
        debug!("{CMD} base material {base}, {:?} path", compositor.path());
        compositor.composite(grid, &geometry, offset, base);

        let path = compositor.path();
        let suffix = match path {
            CompositePath::ArrayCopy => "",
            CompositePath::VoxelOnly => " (voxels only)",
        };
        info!(
            "Geometry objects from file{suffix} {} inserted at {}m, {}m, {}m, with corresponding materials file {}.",
            geofile.display(),
            offset[0] as f64 * grid.dx,
            offset[1] as f64 * grid.dy,
            offset[2] as f64 * grid.dz,
            matfile.display()
        );

        Ok(MergeReport {
            offset,
            base_material: base,
            new_materials,
            path,
        })
    }
}

/// Use `path` as given if it exists, otherwise relative to `input_dir`
fn resolve(path: &Path, input_dir: &Path) -> PathBuf {
    if path.exists() {
        path.to_path_buf()
    } else {
        input_dir.join(path)
    }
}

fn check_pitch(grid: &GridState, file_pitch: [f64; 3]) -> Result<()> {
    let grid_pitch = grid.pitch();
    if (0..3).any(|a| round_value(file_pitch[a] / grid_pitch[a]) != 1) {
        return Err(GeometryError::ResolutionMismatch {
            cmd: CMD,
            file_pitch,
            grid_pitch,
        });
    }
    Ok(())
}
