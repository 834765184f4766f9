//! Importing geometry datasets and their material files into a grid

use std::fs;
use std::path::{Path, PathBuf};

use fdtd_geometry_core::{
    core_types::VoxelArray,
    geometry::{Compositor, ImportedGeometry, VoxelCompositor, BACKGROUND_ID},
    grid::IMPORTED_TAG,
    CompositePath, GeometryDataset, GeometryError, GeometryObjectsRead, GridState,
    HashCommandProcessor, MaterialSpec, Vec3,
};
use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

const MATERIALS: &str = "## Buried pipe\n\
                         #material: 6 0.001 1 0 soil\n\
                         #material: 3 0 1 0 pvc\n";

const PITCH: [f64; 3] = [0.01, 0.01, 0.01];

/// Scratch directory unique to one test
fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("fdtd-geometry-core-{}-{name}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

/// Stored id pattern over a 3x3x3 block: background, soil and pvc
fn stored_id(i: usize, j: usize, k: usize) -> i32 {
    ((i + j + k) % 3) as i32 - 1
}

/// Dataset exported from a grid built voxel by voxel
fn exported_dataset() -> GeometryDataset {
    let mut source = GridState::new([5, 5, 5], PITCH, 1e-12);
    source.materials.register(MaterialSpec::simple("soil", 6.0, 0.001, 1.0, 0.0)).unwrap();
    source.materials.register(MaterialSpec::simple("pvc", 3.0, 0.0, 1.0, 0.0)).unwrap();

    let mut ids = Vec::new();
    for i in 0..3 {
        for j in 0..3 {
            for k in 0..3 {
                ids.push(stored_id(i, j, k));
            }
        }
    }
    let block = ImportedGeometry {
        material_ids: VoxelArray::from_vec([3, 3, 3], ids).unwrap(),
        auxiliary: None,
    };
    VoxelCompositor::default().composite(&mut source, &block, [1, 1, 1], 2);
    GeometryDataset::from_grid_region(&source, [1, 1, 1], [3, 3, 3], 2)
}

/// Write the material file and dataset, returning a merge request for them
fn write_inputs(dir: &Path, dataset: &GeometryDataset, p1: Vec3) -> GeometryObjectsRead {
    fs::write(dir.join("pipe.txt"), MATERIALS).unwrap();
    dataset.save(&dir.join("pipe.json")).unwrap();
    GeometryObjectsRead {
        p1: Some(p1),
        geofile: Some(dir.join("pipe.json")),
        matfile: Some(dir.join("pipe.txt")),
    }
}

/// Destination grid with one material of its own, so imports start at 3
fn destination() -> GridState {
    let mut grid = GridState::new([10, 10, 10], PITCH, 1e-12);
    grid.materials.register(MaterialSpec::simple("concrete", 5.0, 0.01, 1.0, 0.0)).unwrap();
    grid
}

/// Component-id entries a voxel at `(i, j, k)` owns
#[rustfmt::skip]
fn owned_edges(i: usize, j: usize, k: usize) -> Vec<(usize, usize, usize, usize)> {
    vec![
        (0, i, j, k), (0, i, j + 1, k), (0, i, j + 1, k + 1), (0, i, j, k + 1),
        (1, i, j, k), (1, i + 1, j, k), (1, i + 1, j, k + 1), (1, i, j, k + 1),
        (2, i, j, k), (2, i + 1, j, k), (2, i + 1, j + 1, k), (2, i, j + 1, k),
        (3, i, j, k), (3, i + 1, j, k),
        (4, i, j, k), (4, i, j + 1, k),
        (5, i, j, k), (5, i, j, k + 1),
    ]
}

fn assert_rebased_solid(grid: &GridState, offset: [usize; 3], base: u32) {
    for i in 0..3 {
        for j in 0..3 {
            for k in 0..3 {
                let stored = stored_id(i, j, k);
                let expected = if stored == BACKGROUND_ID { 1 } else { stored as u32 + base };
                assert_eq!(
                    grid.solid.get(offset[0] + i, offset[1] + j, offset[2] + k),
                    expected,
                    "solid at block cell ({i}, {j}, {k})"
                );
            }
        }
    }
}

#[test]
fn test_merge_with_auxiliary_volumes() {
    let dir = scratch("array-copy");
    let request = write_inputs(&dir, &exported_dataset(), Vec3::new(0.02, 0.03, 0.04));
    let mut grid = destination();

    let report = request.create(&mut grid, &dir, &HashCommandProcessor).unwrap();
    assert_eq!(report.path, CompositePath::ArrayCopy);
    assert_eq!(report.offset, [2, 3, 4]);
    assert_eq!(report.base_material, 3);
    assert_eq!(report.new_materials, 2);

    assert_rebased_solid(&grid, [2, 3, 4], 3);
    assert_eq!(grid.materials.get("soil{pipe}").unwrap().num_id(), 3);
    assert_eq!(grid.materials.get("pvc{pipe}").unwrap().num_id(), 4);
    assert_eq!(grid.materials.get("soil{pipe}").unwrap().kind(), IMPORTED_TAG);
    assert_eq!(grid.materials.get("concrete").unwrap().kind(), "");
}

#[test]
fn test_merge_without_auxiliary_volumes() {
    let dir = scratch("voxel-only");
    let mut dataset = exported_dataset();
    dataset.rigid_h = None;
    let request = write_inputs(&dir, &dataset, Vec3::new(0.0, 0.0, 0.0));
    let mut grid = destination();

    let report = request.create(&mut grid, &dir, &HashCommandProcessor).unwrap();
    assert_eq!(report.path, CompositePath::VoxelOnly);
    assert_rebased_solid(&grid, [0, 0, 0], 3);
    // Background voxels are not built
    assert_eq!(grid.rigid_e.get(0, 0, 0, 0), 0);
    assert_eq!(grid.rigid_e.get(0, 0, 0, 1), 1);
}

#[test]
fn test_both_paths_produce_the_same_grid() {
    let dir = scratch("equivalence");
    let full = exported_dataset();
    let mut bare = full.clone();
    bare.rigid_e = None;
    bare.rigid_h = None;
    bare.id = None;

    let offset = Vec3::new(0.05, 0.01, 0.02);
    let mut fast = destination();
    let report = write_inputs(&dir, &full, offset)
        .create(&mut fast, &dir, &HashCommandProcessor)
        .unwrap();
    assert_eq!(report.path, CompositePath::ArrayCopy);

    let mut fallback = destination();
    let report = write_inputs(&dir, &bare, offset)
        .create(&mut fallback, &dir, &HashCommandProcessor)
        .unwrap();
    assert_eq!(report.path, CompositePath::VoxelOnly);

    assert_eq!(fast.solid, fallback.solid);
    assert_eq!(fast.rigid_e, fallback.rigid_e);
    assert_eq!(fast.rigid_h, fallback.rigid_h);
    assert_eq!(fast.id, fallback.id);

    let [xs, ys, zs] = report.offset;
    for i in 0..3 {
        for j in 0..3 {
            for k in 0..3 {
                if stored_id(i, j, k) == BACKGROUND_ID {
                    continue;
                }
                for (c, a, b, d) in owned_edges(xs + i, ys + j, zs + k) {
                    assert_eq!(
                        fast.id.get(c, a, b, d),
                        fallback.id.get(c, a, b, d),
                        "component {c} at ({a}, {b}, {d})"
                    );
                }
            }
        }
    }
}

#[test]
fn test_round_trip_keeps_background_component_ids() {
    let dir = scratch("round-trip");
    let mut source = GridState::new([5, 5, 5], PITCH, 1e-12);
    source.materials.register(MaterialSpec::simple("soil", 6.0, 0.001, 1.0, 0.0)).unwrap();
    VoxelCompositor::default().build_voxel(&mut source, 1, 1, 1, 2);
    let dataset = GeometryDataset::from_grid_region(&source, [0, 0, 0], [3, 3, 3], 2);

    let mut grid = GridState::new([5, 5, 5], PITCH, 1e-12);
    let report = write_inputs(&dir, &dataset, Vec3::zeros())
        .create(&mut grid, &dir, &HashCommandProcessor)
        .unwrap();
    assert_eq!(report.path, CompositePath::ArrayCopy);
    assert_eq!(report.base_material, 2);

    // Ex edge owned only by background voxels keeps free space
    assert_eq!(grid.solid.get(2, 2, 2), 1);
    assert_eq!(grid.id.get(0, 2, 2, 2), 1);
    // The soil voxel and its edges come back with the same id
    assert_eq!(grid.solid.get(1, 1, 1), 2);
    assert_eq!(grid.id.get(0, 1, 2, 2), 2);
    assert_eq!(grid.id.get(5, 1, 1, 2), 2);
    assert_eq!(grid.solid, source.solid);
    assert_eq!(grid.rigid_e, source.rigid_e);
    assert_eq!(grid.id, source.id);
}

#[test]
fn test_oversized_dataset_shape_is_an_error() {
    let dir = scratch("oversized");
    fs::write(dir.join("pipe.txt"), MATERIALS).unwrap();
    fs::write(
        dir.join("huge.json"),
        r#"{
            "dx_dy_dz": [0.01, 0.01, 0.01],
            "data": { "shape": [18446744073709551615, 2, 1], "ids": { "dtype": "u8", "values": [0, 0] } }
        }"#,
    )
    .unwrap();
    let request = GeometryObjectsRead {
        p1: Some(Vec3::zeros()),
        geofile: Some(dir.join("huge.json")),
        matfile: Some(dir.join("pipe.txt")),
    };
    let mut grid = destination();
    let err = request.create(&mut grid, &dir, &HashCommandProcessor).unwrap_err();
    assert!(matches!(err, GeometryError::Dataset { .. }));
    assert_eq!(grid.materials.len(), 3);
}

#[test]
fn test_resolution_mismatch_leaves_grid_untouched() {
    let dir = scratch("mismatch");
    let mut dataset = exported_dataset();
    dataset.dx_dy_dz = [0.02, 0.01, 0.01];
    let request = write_inputs(&dir, &dataset, Vec3::new(0.0, 0.0, 0.0));
    let mut grid = destination();
    let before = grid.clone();

    let err = request.create(&mut grid, &dir, &HashCommandProcessor).unwrap_err();
    assert!(matches!(err, GeometryError::ResolutionMismatch { .. }));
    assert_eq!(grid.materials.len(), before.materials.len());
    assert_eq!(grid.solid, before.solid);
    assert_eq!(grid.id, before.id);
}

#[test]
fn test_dataset_must_fit_at_the_insertion_point() {
    let dir = scratch("overflow");
    let request = write_inputs(&dir, &exported_dataset(), Vec3::new(0.08, 0.0, 0.0));
    let mut grid = destination();
    let err = request.create(&mut grid, &dir, &HashCommandProcessor).unwrap_err();
    assert!(matches!(
        err,
        GeometryError::DomainOverflow {
            axis: 'x',
            requested: 11,
            available: 10,
            ..
        }
    ));
    assert_eq!(grid.materials.len(), 3);
}

#[test]
fn test_relative_paths_resolve_against_input_dir() {
    let dir = scratch("relative");
    write_inputs(&dir, &exported_dataset(), Vec3::zeros());
    let request = GeometryObjectsRead {
        p1: Some(Vec3::zeros()),
        geofile: Some(PathBuf::from("pipe.json")),
        matfile: Some(PathBuf::from("pipe.txt")),
    };
    let mut grid = destination();
    request.create(&mut grid, &dir, &HashCommandProcessor).unwrap();
    assert!(grid.materials.contains("pvc{pipe}"));

    // Importing the same material file twice redefines its materials
    let err = request.create(&mut grid, &dir, &HashCommandProcessor).unwrap_err();
    assert!(matches!(err, GeometryError::DuplicateMaterial(_)));
}
