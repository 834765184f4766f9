//! FDTD grid state shared by the geometry operators
//!
//! Holds the voxel material map, the per-edge rigidity flags, the per-component
//! material ids, the material registry and the registered fractal volumes.
//! Operators receive `&mut GridState` and mutate it in place.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core_types::{courant_time_step, round_value, ComponentArray, Vec3, VoxelArray};
use crate::error::{GeometryError, Result};
use crate::fractal::FractalVolume;
use crate::grid::material::MaterialRegistry;

/// Number of electric-field rigidity components per cell
pub const RIGID_E_COMPONENTS: usize = 12;
/// Number of magnetic-field rigidity components per cell
pub const RIGID_H_COMPONENTS: usize = 6;
/// Number of field components carrying a material id (Ex, Ey, Ez, Hx, Hy, Hz)
pub const ID_COMPONENTS: usize = 6;

/// Material id every cell starts with
pub const FREE_SPACE_NUM_ID: u32 = 1;

/// Grid construction parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    /// Domain size (m)
    pub domain: [f64; 3],
    /// Cell pitch (m)
    pub pitch: [f64; 3],
    /// Time step (s); the Courant limit is used when absent
    #[serde(default)]
    pub dt: Option<f64>,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            domain: [1.0, 1.0, 1.0],
            pitch: [0.01, 0.01, 0.01],
            dt: None,
        }
    }
}

impl GridConfig {
    /// Check that every extent is finite and positive
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::InvalidParameter`] naming the offending field
    pub fn validate(&self) -> Result<()> {
        const CMD: &str = "#domain";
        for (name, values) in [("domain", &self.domain), ("pitch", &self.pitch)] {
            if values.iter().any(|v| !v.is_finite() || *v <= 0.0) {
                return Err(GeometryError::invalid_parameter(
                    CMD,
                    format!("{name} must be finite and positive, got {values:?}"),
                ));
            }
        }
        if let Some(dt) = self.dt {
            if !dt.is_finite() || dt <= 0.0 {
                return Err(GeometryError::invalid_parameter(
                    CMD,
                    format!("time step must be finite and positive, got {dt}"),
                ));
            }
        }
        Ok(())
    }
}

/// The simulation domain
#[derive(Debug, Clone)]
pub struct GridState {
    /// Grid resolution (cells)
    pub nx: usize,
    pub ny: usize,
    pub nz: usize,

    /// Cell pitch (m)
    pub dx: f64,
    pub dy: f64,
    pub dz: f64,

    /// Time step (s)
    pub dt: f64,

    /// Material id per cell, shape `(nx, ny, nz)`
    pub solid: VoxelArray<u32>,
    /// Electric rigidity flags, shape `(12, nx, ny, nz)`
    pub rigid_e: ComponentArray<i8>,
    /// Magnetic rigidity flags, shape `(6, nx, ny, nz)`
    pub rigid_h: ComponentArray<i8>,
    /// Material id per field component, shape `(6, nx + 1, ny + 1, nz + 1)`
    pub id: ComponentArray<u32>,

    /// Registered materials
    pub materials: MaterialRegistry,

    fractal_volumes: Vec<FractalVolume>,
    volume_index: FxHashMap<String, usize>,
}

impl GridState {
    /// Create a grid of `(nx, ny, nz)` cells filled with free space
    pub fn new(cells: [usize; 3], pitch: [f64; 3], dt: f64) -> Self {
        let [nx, ny, nz] = cells;
        Self {
            nx,
            ny,
            nz,
            dx: pitch[0],
            dy: pitch[1],
            dz: pitch[2],
            dt,
            solid: VoxelArray::filled(cells, FREE_SPACE_NUM_ID),
            rigid_e: ComponentArray::filled(RIGID_E_COMPONENTS, cells, 0),
            rigid_h: ComponentArray::filled(RIGID_H_COMPONENTS, cells, 0),
            id: ComponentArray::filled(ID_COMPONENTS, [nx + 1, ny + 1, nz + 1], FREE_SPACE_NUM_ID),
            materials: MaterialRegistry::with_builtins(),
            fractal_volumes: Vec::new(),
            volume_index: FxHashMap::default(),
        }
    }

    /// Create a grid from a validated configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration fails [`GridConfig::validate`]
    pub fn from_config(config: &GridConfig) -> Result<Self> {
        config.validate()?;
        let cells = [0, 1, 2].map(|a| round_value(config.domain[a] / config.pitch[a]).max(1) as usize);
        let [dx, dy, dz] = config.pitch;
        let dt = config.dt.unwrap_or_else(|| courant_time_step(dx, dy, dz));
        debug!(
            "Grid {}x{}x{} cells, pitch {:?} m, dt {:e} s",
            cells[0], cells[1], cells[2], config.pitch, dt
        );
        Ok(Self::new(cells, config.pitch, dt))
    }

    /// Cell counts `[nx, ny, nz]`
    pub fn cells(&self) -> [usize; 3] {
        [self.nx, self.ny, self.nz]
    }

    /// Cell pitch `[dx, dy, dz]` (m)
    pub fn pitch(&self) -> [f64; 3] {
        [self.dx, self.dy, self.dz]
    }

    /// Convert a physical point to the nearest grid indices (may be negative)
    pub fn discretise_point(&self, p: &Vec3) -> [i64; 3] {
        [
            round_value(p.x / self.dx),
            round_value(p.y / self.dy),
            round_value(p.z / self.dz),
        ]
    }

    /// Discretise a point that must lie inside the domain, `0 ..= n` per axis
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::InvalidGeometry`] if any index falls outside
    pub fn check_point(&self, p: &Vec3, cmd: &'static str) -> Result<[usize; 3]> {
        let idx = self.discretise_point(p);
        let cells = self.cells();
        let mut out = [0; 3];
        for axis in 0..3 {
            if idx[axis] < 0 || idx[axis] as usize > cells[axis] {
                return Err(GeometryError::invalid_geometry(
                    cmd,
                    format!(
                        "point ({}m, {}m, {}m) is outside the domain",
                        p.x, p.y, p.z
                    ),
                ));
            }
            out[axis] = idx[axis] as usize;
        }
        Ok(out)
    }

    /// Discretise the two corners of a box and check their ordering
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::InvalidGeometry`] if either corner is outside
    /// the domain or the lower corner exceeds the upper on any axis
    pub fn check_box_points(
        &self,
        p1: &Vec3,
        p2: &Vec3,
        cmd: &'static str,
    ) -> Result<([usize; 3], [usize; 3])> {
        let lo = self.check_point(p1, cmd)?;
        let hi = self.check_point(p2, cmd)?;
        if lo.iter().zip(&hi).any(|(a, b)| a > b) {
            return Err(GeometryError::invalid_geometry(
                cmd,
                "the lower coordinates should be less than the upper coordinates",
            ));
        }
        Ok((lo, hi))
    }

    /// Register a fractal volume
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::DuplicateVolume`] if the identifier is taken
    pub fn add_fractal_volume(&mut self, volume: FractalVolume) -> Result<()> {
        if self.volume_index.contains_key(volume.id()) {
            return Err(GeometryError::DuplicateVolume(volume.id().to_string()));
        }
        self.volume_index
            .insert(volume.id().to_string(), self.fractal_volumes.len());
        self.fractal_volumes.push(volume);
        Ok(())
    }

    /// Fractal volume by identifier
    pub fn fractal_volume(&self, id: &str) -> Option<&FractalVolume> {
        self.volume_index.get(id).map(|&i| &self.fractal_volumes[i])
    }

    pub(crate) fn fractal_volume_mut(&mut self, id: &str) -> Option<&mut FractalVolume> {
        let idx = *self.volume_index.get(id)?;
        Some(&mut self.fractal_volumes[idx])
    }

    /// All fractal volumes in registration order
    pub fn fractal_volumes(&self) -> &[FractalVolume] {
        &self.fractal_volumes
    }
}
