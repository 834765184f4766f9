//! Stochastic placement of grass blades on a fractal volume face
//!
//! A request is validated in a fixed order, each step short-circuiting on
//! failure, before anything in the grid changes:
//!
//! 1. required parameters present
//! 2. optional rotation applied to the corner points
//! 3. target volume looked up
//! 4. fractal dimension and height limits non-negative, at least one blade
//! 5. corner points inside the domain
//! 6. face planar (exactly one pair of coordinates equal)
//! 7. face on the volume boundary
//! 8. face on the maximum side of the volume (`xplus` / `yplus` / `zplus`)
//! 9. height range fits the domain and is non-empty
//!
//! Sampling then draws blade positions from the normalised probability field
//! by inverse-CDF lookup and a random height for each. The grass timestep
//! check runs before the grass material is registered or the surface is
//! attached, so a rejected request leaves the grid untouched.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::core_types::{round_value, FaceArray, Vec3};
use crate::error::{GeometryError, Result};
use crate::fractal::{
    FeatureBatch, FractalSurfaceBuilder, FractalSurfaceFeature, FractalVolume,
    SurfaceOrientation, SurfaceProbabilityField,
};
use crate::geometry::rotation::{Rotation, RotationAxis};
use crate::grid::{grass_material, GridState, GRASS_MATERIAL_ID};

const CMD: &str = "#add_grass";

/// Request to add grass with roots to a fractal box.
///
/// Every field mirrors a named command parameter; all but `seed` are required.
#[derive(Debug, Clone, Default)]
pub struct AddGrass {
    /// Lower-left corner of a surface on the fractal box (m)
    pub p1: Option<Vec3>,
    /// Upper-right corner of the surface (m)
    pub p2: Option<Vec3>,
    /// Identifier of the fractal box the grass is applied to
    pub fractal_box_id: Option<String>,
    /// Fractal dimension of the blade distribution
    pub frac_dim: Option<f64>,
    /// Lower and upper blade heights (m)
    pub limits: Option<[f64; 2]>,
    /// Number of blades to place
    pub n_blades: Option<usize>,
    /// Seed for the blade distribution and heights
    pub seed: Option<u64>,
    /// Optional quarter-turn rotation applied to the corner points
    pub rotation: Option<Rotation>,
}

/// Parameters after presence checks
struct Params<'a> {
    p1: Vec3,
    p2: Vec3,
    volume_id: &'a str,
    frac_dim: f64,
    limits: [f64; 2],
    n_blades: usize,
}

/// A validated request, ready for sampling
#[derive(Debug, Clone)]
struct Placement {
    extents: [usize; 6],
    orientation: SurfaceOrientation,
    fractal_range: (u32, u32),
}

impl AddGrass {
    /// Rotate the surface corners before the grass is created
    pub fn rotate(&mut self, axis: RotationAxis, angle: f64, origin: Option<Vec3>) {
        self.rotation = Some(Rotation {
            axis,
            angle,
            origin,
        });
    }

    /// Validate the request, sample blade positions and heights, and attach
    /// the resulting surface to the target fractal box
    ///
    /// Registers the `grass` material on first use.
    ///
    /// # Errors
    ///
    /// Any validation failure listed in the module docs, plus
    /// [`GeometryError::CapacityExceeded`] when the face has fewer cells than
    /// requested blades and [`GeometryError::IncompatibleTimestep`] when a
    /// grass relaxation time is shorter than the grid time step. On error the
    /// grid is unchanged.
    pub fn create(&self, grid: &mut GridState, field: &dyn SurfaceProbabilityField) -> Result<()> {
        let params = self.required_params()?;
        let (p1, p2) = match &self.rotation {
            Some(rotation) => rotation.apply(&params.p1, &params.p2, CMD)?,
            None => (params.p1, params.p2),
        };

        let volume = grid
            .fractal_volume(params.volume_id)
            .ok_or_else(|| GeometryError::VolumeNotFound {
                cmd: CMD,
                id: params.volume_id.to_string(),
            })?;

        check_values(params.frac_dim, params.limits, params.n_blades)?;
        let (lo, hi) = grid.check_box_points(&p1, &p2, CMD)?;
        let placement = validate_face(grid, volume, lo, hi, params.limits)?;
        debug!(
            "{CMD} {} surface, blade heights {}..{} cells",
            placement.orientation.as_str(),
            placement.fractal_range.0,
            placement.fractal_range.1
        );

        let builder = FractalSurfaceBuilder::new(
            GRASS_MATERIAL_ID,
            placement.extents,
            placement.orientation,
            params.frac_dim,
        );
        let weights = field.generate(builder.face_shape(), params.frac_dim, self.seed)?;
        if params.n_blades > weights.len() {
            return Err(GeometryError::CapacityExceeded {
                cmd: CMD,
                requested: params.n_blades,
                available: weights.len(),
            });
        }

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };
        let heights = sample_blades(&weights, params.n_blades, placement.fractal_range, &mut rng)?;

        check_grass_timestep(grid)?;

        let surface = builder
            .seed(self.seed)
            .fractal_range(placement.fractal_range)
            .operating_on(params.volume_id)
            .heights(heights)
            .batch(FeatureBatch::new(params.n_blades, self.seed))
            .build()?;

        if !grid.materials.contains(GRASS_MATERIAL_ID) {
            grid.materials.register(grass_material())?;
        }
        log_summary(grid, &surface, params.n_blades, params.limits);
        grid.fractal_volume_mut(params.volume_id)
            .ok_or_else(|| GeometryError::VolumeNotFound {
                cmd: CMD,
                id: params.volume_id.to_string(),
            })?
            .attach_surface(surface);
        Ok(())
    }

    fn required_params(&self) -> Result<Params<'_>> {
        let missing = |param| GeometryError::MissingParameter { cmd: CMD, param };
        Ok(Params {
            p1: self.p1.ok_or_else(|| missing("p1"))?,
            p2: self.p2.ok_or_else(|| missing("p2"))?,
            volume_id: self
                .fractal_box_id
                .as_deref()
                .ok_or_else(|| missing("fractal_box_id"))?,
            frac_dim: self.frac_dim.ok_or_else(|| missing("frac_dim"))?,
            limits: self.limits.ok_or_else(|| missing("limits"))?,
            n_blades: self.n_blades.ok_or_else(|| missing("n_blades"))?,
        })
    }
}

fn check_values(frac_dim: f64, limits: [f64; 2], n_blades: usize) -> Result<()> {
    if frac_dim.is_nan() || frac_dim < 0.0 {
        return Err(GeometryError::invalid_parameter(
            CMD,
            "requires a positive value for the fractal dimension",
        ));
    }
    if limits.iter().any(|l| l.is_nan() || *l < 0.0) {
        return Err(GeometryError::invalid_parameter(
            CMD,
            "requires a positive value for the minimum and maximum heights for grass blades",
        ));
    }
    if n_blades == 0 {
        return Err(GeometryError::invalid_parameter(
            CMD,
            "requires at least one grass blade",
        ));
    }
    Ok(())
}

/// Axis normal to the face `[lo, hi]`, requiring exactly one equal pair
fn planar_axis(lo: [usize; 3], hi: [usize; 3]) -> Result<usize> {
    let degenerate = || GeometryError::invalid_geometry(CMD, "dimensions are not specified correctly");
    if lo[0] == hi[0] {
        if lo[1] == hi[1] || lo[2] == hi[2] {
            return Err(degenerate());
        }
        Ok(0)
    } else if lo[1] == hi[1] {
        if lo[2] == hi[2] {
            return Err(degenerate());
        }
        Ok(1)
    } else if lo[2] == hi[2] {
        Ok(2)
    } else {
        Err(degenerate())
    }
}

/// Steps 6 to 9: planarity, boundary, orientation and height range
fn validate_face(
    grid: &GridState,
    volume: &FractalVolume,
    lo: [usize; 3],
    hi: [usize; 3],
    limits: [f64; 2],
) -> Result<Placement> {
    const AXIS_NAMES: [char; 3] = ['x', 'y', 'z'];

    let axis = planar_axis(lo, hi)?;
    let plane = lo[axis];
    if plane != volume.start(axis) && plane != volume.finish(axis) {
        return Err(GeometryError::invalid_geometry(
            CMD,
            "must specify external surfaces on a fractal box",
        ));
    }
    for in_plane in (0..3).filter(|&a| a != axis) {
        if lo[in_plane] < volume.start(in_plane) || hi[in_plane] > volume.finish(in_plane) {
            return Err(GeometryError::invalid_geometry(
                CMD,
                format!("surface extends beyond fractal box '{}'", volume.id()),
            ));
        }
    }

    if plane == volume.start(axis) {
        return Err(GeometryError::UnsupportedOrientation {
            cmd: CMD,
            axis: AXIS_NAMES[axis],
        });
    }
    let orientation = SurfaceOrientation::from_axis(axis)
        .ok_or_else(|| GeometryError::invalid_geometry(CMD, "dimensions are not specified correctly"))?;

    let pitch = grid.pitch()[axis];
    let range = (
        round_value(limits[0] / pitch) as usize,
        round_value(limits[1] / pitch) as usize,
    );
    let available = grid.cells()[axis];
    if range.1 > available {
        return Err(GeometryError::DomainOverflow {
            cmd: CMD,
            axis: AXIS_NAMES[axis],
            requested: range.1,
            available,
        });
    }
    if range.0 >= range.1 {
        return Err(GeometryError::invalid_parameter(
            CMD,
            format!(
                "blade height range {}..{} cells is empty at this resolution",
                range.0, range.1
            ),
        ));
    }

    Ok(Placement {
        extents: [lo[0], hi[0], lo[1], hi[1], lo[2], hi[2]],
        orientation,
        fractal_range: (range.0 as u32, range.1 as u32),
    })
}

/// Scale weights so they sum to one
///
/// # Errors
///
/// Returns [`GeometryError::InvalidGeometry`] if a weight is negative or not
/// finite, or the weights sum to zero
pub fn normalise(weights: &FaceArray<f64>) -> Result<FaceArray<f64>> {
    if weights.as_slice().iter().any(|w| !w.is_finite() || *w < 0.0) {
        return Err(GeometryError::invalid_geometry(
            CMD,
            "probability field contains negative or non-finite weights",
        ));
    }
    let total: f64 = weights.as_slice().iter().sum();
    if total <= 0.0 {
        return Err(GeometryError::invalid_geometry(CMD, "probability field has no mass"));
    }
    let mut pmf = weights.clone();
    for w in pmf.as_mut_slice() {
        *w /= total;
    }
    Ok(pmf)
}

/// Running sum of a normalised field in row-major order, pinned to end at 1
pub fn cumulative(pmf: &FaceArray<f64>) -> Vec<f64> {
    let mut acc = 0.0;
    let mut cdf: Vec<f64> = pmf
        .as_slice()
        .iter()
        .map(|p| {
            acc += p;
            acc
        })
        .collect();
    if let Some(last) = cdf.last_mut() {
        *last = 1.0;
    }
    cdf
}

/// Flat index of the bin a uniform draw falls into
///
/// First index whose cumulative value exceeds `u`, so zero-mass cells are
/// never chosen.
pub fn locate(cdf: &[f64], u: f64) -> usize {
    cdf.partition_point(|&c| c <= u).min(cdf.len().saturating_sub(1))
}

/// Draw `count` blade positions from `weights` and a height in
/// `[range.0, range.1)` for each
///
/// Positions are drawn with replacement; a later blade on the same cell
/// overwrites the earlier height. Cells without a blade stay zero.
///
/// # Errors
///
/// Propagates [`normalise`] failures
pub fn sample_blades(
    weights: &FaceArray<f64>,
    count: usize,
    range: (u32, u32),
    rng: &mut StdRng,
) -> Result<FaceArray<u32>> {
    let pmf = normalise(weights)?;
    let cdf = cumulative(&pmf);

    let draws: Vec<f64> = (0..count).map(|_| rng.random::<f64>()).collect();
    let positions: Vec<(usize, usize)> = draws
        .iter()
        .map(|&u| pmf.unravel(locate(&cdf, u)))
        .collect();

    let (rows, cols) = pmf.shape();
    let mut heights = FaceArray::filled(rows, cols, 0_u32);
    for (a, b) in positions {
        heights.set(a, b, rng.random_range(range.0..range.1));
    }
    Ok(heights)
}

fn check_grass_timestep(grid: &GridState) -> Result<()> {
    let template;
    let tau = match grid.materials.get(GRASS_MATERIAL_ID) {
        Some(material) => material.tau(),
        None => {
            template = grass_material();
            template.tau()
        }
    };
    if let Some(&t) = tau.iter().find(|&&t| t < grid.dt) {
        return Err(GeometryError::IncompatibleTimestep {
            cmd: CMD,
            material: GRASS_MATERIAL_ID.to_string(),
            tau: t,
            dt: grid.dt,
        });
    }
    Ok(())
}

fn log_summary(grid: &GridState, surface: &FractalSurfaceFeature, n_blades: usize, limits: [f64; 2]) {
    let [xs, xf, ys, yf, zs, zf] = *surface.extents();
    let seed = surface
        .seed()
        .map_or_else(|| "None".to_string(), |s| s.to_string());
    info!(
        "{} blades of grass on surface from {}m, {}m, {}m, to {}m, {}m, {}m with fractal dimension {}, fractal seeding {}, and range {}m to {}m, added to {}.",
        n_blades,
        xs as f64 * grid.dx,
        ys as f64 * grid.dy,
        zs as f64 * grid.dz,
        xf as f64 * grid.dx,
        yf as f64 * grid.dy,
        zf as f64 * grid.dz,
        surface.dimension(),
        seed,
        limits[0],
        limits[1],
        surface.operating_on()
    );
}
