use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use fdtd_geometry_core::{
    AddGrass, FractalVolume, GeometryDataset, GeometryError, GeometryObjectsRead,
    GradientNoiseField, GridConfig, GridState, HashCommandProcessor, MaterialSpec, Vec3,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Grass placement and geometry import demo
#[derive(Parser, Debug)]
#[command(name = "fdtd-geometry-demo")]
#[command(about = "Scatter grass on a soil box, export it and import it elsewhere", long_about = None)]
struct Args {
    /// Domain size in metres (cube)
    #[arg(long, default_value_t = 0.2)]
    domain: f64,

    /// Cell size in metres
    #[arg(long, default_value_t = 0.01)]
    pitch: f64,

    /// Fractal dimension of the blade distribution
    #[arg(short = 'd', long, default_value_t = 1.5)]
    frac_dim: f64,

    /// Number of grass blades
    #[arg(short, long, default_value_t = 20)]
    blades: usize,

    /// Shortest blade in metres
    #[arg(long, default_value_t = 0.02)]
    min_height: f64,

    /// Tallest blade in metres
    #[arg(long, default_value_t = 0.05)]
    max_height: f64,

    /// Random seed (omit for a fresh distribution every run)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Geometry dataset to import instead of the exported soil box
    #[arg(long, requires = "materials")]
    geometry: Option<PathBuf>,

    /// Material file accompanying --geometry
    #[arg(long, requires = "geometry")]
    materials: Option<PathBuf>,

    /// Directory for exported files and relative import paths
    #[arg(short, long, default_value = "geometry-demo")]
    output: PathBuf,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), GeometryError> {
    println!("=== FDTD Geometry Demo ===\n");

    let config = GridConfig {
        domain: [args.domain; 3],
        pitch: [args.pitch; 3],
        dt: None,
    };
    let mut grid = GridState::from_config(&config)?;
    let [nx, ny, nz] = grid.cells();
    println!("Grid {nx}x{ny}x{nz} cells, dt {:.3e} s", grid.dt);

    // Soil box filling the lower half of one quadrant
    let half = [nx / 2, ny / 2, nz / 4];
    let soil = MaterialSpec::simple("soil", 6.0, 0.001, 1.0, 0.0);
    let soil_id = grid.materials.register(soil)?;
    for i in 0..half[0] {
        for j in 0..half[1] {
            for k in 0..half[2] {
                grid.solid.set(i, j, k, soil_id);
            }
        }
    }
    grid.add_fractal_volume(FractalVolume::new("soil_box", [0, half[0], 0, half[1], 0, half[2]])?)?;

    let top = half[2] as f64 * grid.dz;
    let grass = AddGrass {
        p1: Some(Vec3::new(0.0, 0.0, top)),
        p2: Some(Vec3::new(half[0] as f64 * grid.dx, half[1] as f64 * grid.dy, top)),
        fractal_box_id: Some("soil_box".to_string()),
        frac_dim: Some(args.frac_dim),
        limits: Some([args.min_height, args.max_height]),
        n_blades: Some(args.blades),
        seed: args.seed,
        ..Default::default()
    };
    grass.create(&mut grid, &GradientNoiseField::default())?;

    if let Some(surface) = grid
        .fractal_volume("soil_box")
        .and_then(|v| v.surfaces().last())
    {
        let heights = surface.heights();
        let (rows, cols) = heights.shape();
        let planted = heights.as_slice().iter().filter(|&&h| h > 0).count();
        println!(
            "Planted {} blades on {planted} of {} cells ({} surface)",
            args.blades,
            rows * cols,
            surface.orientation().as_str()
        );
        for a in 0..rows {
            let row: String = (0..cols)
                .map(|b| match heights.get(a, b) {
                    0 => '.',
                    h => char::from_digit(h.min(9), 10).unwrap_or('#'),
                })
                .collect();
            println!("  {row}");
        }
    }

    fs::create_dir_all(&args.output).map_err(|source| GeometryError::Io {
        path: args.output.clone(),
        source,
    })?;

    let request = match (&args.geometry, &args.materials) {
        (Some(geofile), Some(matfile)) => GeometryObjectsRead {
            p1: Some(Vec3::zeros()),
            geofile: Some(geofile.clone()),
            matfile: Some(matfile.clone()),
        },
        _ => export_soil_box(&grid, soil_id, half, &args.output)?,
    };

    let report = request.create(&mut grid, &args.output, &HashCommandProcessor)?;
    info!(
        "Imported {} materials from id {} via {:?}",
        report.new_materials, report.base_material, report.path
    );

    println!("\nMaterials:");
    for material in grid.materials.iter() {
        println!("  {:>3}  {:<24} {}", material.num_id(), material.id(), material.kind());
    }
    Ok(())
}

/// Write the soil box as a dataset plus material file and return a request
/// placing a copy of it in the opposite corner of the domain
fn export_soil_box(
    grid: &GridState,
    soil_id: u32,
    extent: [usize; 3],
    dir: &std::path::Path,
) -> Result<GeometryObjectsRead, GeometryError> {
    let dataset = GeometryDataset::from_grid_region(grid, [0, 0, 0], extent, soil_id);
    let geofile = dir.join("soil_box.json");
    dataset.save(&geofile)?;

    let matfile = dir.join("soil_box.txt");
    fs::write(&matfile, "## Exported soil\n#material: 6 0.001 1 0 soil\n").map_err(|source| {
        GeometryError::Io {
            path: matfile.clone(),
            source,
        }
    })?;
    println!("\nExported soil box to {}", geofile.display());

    let [nx, ny, _] = grid.cells();
    Ok(GeometryObjectsRead {
        p1: Some(Vec3::new(
            (nx - extent[0]) as f64 * grid.dx,
            (ny - extent[1]) as f64 * grid.dy,
            0.0,
        )),
        geofile: Some(geofile),
        matfile: Some(matfile),
    })
}
