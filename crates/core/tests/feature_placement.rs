//! Grass placement on fractal box surfaces
//!
//! Run with `RUST_LOG=debug` to see the placement log lines.

use approx::assert_relative_eq;
use fdtd_geometry_core::{
    geometry::add_grass::{cumulative, normalise},
    AddGrass, FractalVolume, GeometryError, GradientNoiseField, GridState, RotationAxis,
    SurfaceOrientation, SurfaceProbabilityField, UniformField, Vec3,
};
use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// 20x20x10 grid at 1 cm with a 10x10x5 fractal box named `soil`
fn grid_with_soil(dt: f64) -> GridState {
    let mut grid = GridState::new([20, 20, 10], [0.01, 0.01, 0.01], dt);
    grid.add_fractal_volume(FractalVolume::new("soil", [0, 10, 0, 10, 0, 5]).unwrap())
        .unwrap();
    grid
}

/// Grass on the x = xf face of `soil`
fn x_face_request() -> AddGrass {
    AddGrass {
        p1: Some(Vec3::new(0.1, 0.0, 0.0)),
        p2: Some(Vec3::new(0.1, 0.1, 0.05)),
        fractal_box_id: Some("soil".to_string()),
        frac_dim: Some(1.5),
        limits: Some([0.02, 0.05]),
        n_blades: Some(20),
        seed: Some(42),
        ..Default::default()
    }
}

#[test]
fn test_grass_on_x_plus_face() {
    let mut grid = grid_with_soil(1e-12);
    x_face_request().create(&mut grid, &GradientNoiseField::default()).unwrap();

    let soil = grid.fractal_volume("soil").unwrap();
    assert_eq!(soil.surfaces().len(), 1);
    let surface = &soil.surfaces()[0];
    assert_eq!(surface.orientation(), SurfaceOrientation::XPlus);
    assert_eq!(surface.heights().shape(), (10, 5));
    assert_eq!(surface.fractal_range(), (2, 5));
    assert_eq!(surface.operating_on(), "soil");
    assert_relative_eq!(surface.dimension(), 1.5);

    assert_eq!(surface.batches().len(), 1);
    assert_eq!(surface.batches()[0].count(), 20);
    assert_eq!(surface.batches()[0].seed(), Some(42));

    // Positions are drawn with replacement, so at most 20 cells carry a blade
    let blades: Vec<u32> = surface.heights().as_slice().iter().copied().filter(|&h| h > 0).collect();
    assert!(!blades.is_empty() && blades.len() <= 20);
    assert!(blades.iter().all(|h| (2..5).contains(h)));

    assert!(grid.materials.contains("grass"));
}

#[test]
fn test_field_normalises_to_unit_mass() {
    let field = GradientNoiseField::default();
    for dimension in [0.0, 1.5, 2.5, 3.0] {
        let weights = field.generate((10, 5), dimension, Some(3)).unwrap();
        let pmf = normalise(&weights).unwrap();
        assert_relative_eq!(pmf.as_slice().iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        let cdf = cumulative(&pmf);
        assert!(cdf.windows(2).all(|w| w[0] <= w[1]));
        assert_relative_eq!(*cdf.last().unwrap(), 1.0);
    }
}

#[test]
fn test_same_seed_is_deterministic() {
    let mut a = grid_with_soil(1e-12);
    let mut b = grid_with_soil(1e-12);
    let field = GradientNoiseField::default();
    x_face_request().create(&mut a, &field).unwrap();
    x_face_request().create(&mut b, &field).unwrap();

    let ha = a.fractal_volume("soil").unwrap().surfaces()[0].heights().clone();
    let hb = b.fractal_volume("soil").unwrap().surfaces()[0].heights().clone();
    assert_eq!(ha, hb);

    let mut c = grid_with_soil(1e-12);
    let mut request = x_face_request();
    request.seed = Some(43);
    request.n_blades = Some(40);
    request.create(&mut c, &field).unwrap();
    let hc = c.fractal_volume("soil").unwrap().surfaces()[0].heights().clone();
    assert_ne!(ha, hc);
}

#[test]
fn test_minimum_side_faces_are_unsupported() {
    let faces = [
        (Vec3::new(0.0, 0.0, 0.0), Vec3::new(0.0, 0.1, 0.05), 'x'),
        (Vec3::new(0.0, 0.0, 0.0), Vec3::new(0.1, 0.0, 0.05), 'y'),
        (Vec3::new(0.0, 0.0, 0.0), Vec3::new(0.1, 0.1, 0.0), 'z'),
    ];
    for (p1, p2, expected) in faces {
        let mut grid = grid_with_soil(1e-12);
        let request = AddGrass {
            p1: Some(p1),
            p2: Some(p2),
            ..x_face_request()
        };
        let err = request.create(&mut grid, &UniformField).unwrap_err();
        assert!(
            matches!(err, GeometryError::UnsupportedOrientation { axis, .. } if axis == expected),
            "unexpected error for {expected} face: {err}"
        );
        assert_eq!(grid.materials.len(), 2);
        assert!(grid.fractal_volume("soil").unwrap().surfaces().is_empty());
    }
}

#[test]
fn test_other_faces_on_maximum_side() {
    let mut grid = grid_with_soil(1e-12);
    let request = AddGrass {
        p1: Some(Vec3::new(0.0, 0.0, 0.05)),
        p2: Some(Vec3::new(0.1, 0.1, 0.05)),
        limits: Some([0.01, 0.03]),
        ..x_face_request()
    };
    request.create(&mut grid, &UniformField).unwrap();
    let request = AddGrass {
        p1: Some(Vec3::new(0.0, 0.1, 0.0)),
        p2: Some(Vec3::new(0.1, 0.1, 0.05)),
        ..x_face_request()
    };
    request.create(&mut grid, &UniformField).unwrap();

    let surfaces = grid.fractal_volume("soil").unwrap().surfaces();
    assert_eq!(surfaces[0].orientation(), SurfaceOrientation::ZPlus);
    assert_eq!(surfaces[0].heights().shape(), (10, 10));
    assert_eq!(surfaces[1].orientation(), SurfaceOrientation::YPlus);
    assert_eq!(surfaces[1].heights().shape(), (10, 5));
    // Grass is registered once
    assert_eq!(grid.materials.len(), 3);
}

#[test]
fn test_blade_range_beyond_domain_overflows() {
    let mut grid = GridState::new([12, 12, 10], [0.01, 0.01, 0.01], 1e-12);
    grid.add_fractal_volume(FractalVolume::new("soil", [0, 10, 0, 10, 0, 5]).unwrap())
        .unwrap();
    let request = AddGrass {
        limits: Some([0.02, 0.2]),
        ..x_face_request()
    };
    let err = request.create(&mut grid, &UniformField).unwrap_err();
    assert!(matches!(
        err,
        GeometryError::DomainOverflow {
            axis: 'x',
            requested: 20,
            available: 12,
            ..
        }
    ));
}

#[test]
fn test_face_off_the_box_boundary() {
    let mut grid = grid_with_soil(1e-12);
    let request = AddGrass {
        p1: Some(Vec3::new(0.05, 0.0, 0.0)),
        p2: Some(Vec3::new(0.05, 0.1, 0.05)),
        ..x_face_request()
    };
    let err = request.create(&mut grid, &UniformField).unwrap_err();
    assert!(matches!(err, GeometryError::InvalidGeometry { .. }));

    let request = AddGrass {
        p1: Some(Vec3::new(0.1, 0.0, 0.0)),
        p2: Some(Vec3::new(0.1, 0.1, 0.0)),
        ..x_face_request()
    };
    let err = request.create(&mut grid, &UniformField).unwrap_err();
    assert!(matches!(err, GeometryError::InvalidGeometry { .. }));
}

#[test]
fn test_too_many_blades_for_the_face() {
    let mut grid = grid_with_soil(1e-12);
    let request = AddGrass {
        n_blades: Some(51),
        ..x_face_request()
    };
    let err = request.create(&mut grid, &UniformField).unwrap_err();
    assert!(matches!(
        err,
        GeometryError::CapacityExceeded {
            requested: 51,
            available: 50,
            ..
        }
    ));
}

#[test]
fn test_timestep_rejection_leaves_grid_untouched() {
    // Grass relaxes in 1.0793e-11 s, shorter than this step
    let mut grid = grid_with_soil(2e-11);
    let err = x_face_request().create(&mut grid, &UniformField).unwrap_err();
    match err {
        GeometryError::IncompatibleTimestep { material, tau, dt, .. } => {
            assert_eq!(material, "grass");
            assert_relative_eq!(tau, 1.0793e-11);
            assert_relative_eq!(dt, 2e-11);
        }
        other => panic!("expected IncompatibleTimestep, got {other}"),
    }
    assert!(!grid.materials.contains("grass"));
    assert!(grid.fractal_volume("soil").unwrap().surfaces().is_empty());
}

#[test]
fn test_missing_and_unknown_targets() {
    let mut grid = grid_with_soil(1e-12);
    let request = AddGrass {
        limits: None,
        ..x_face_request()
    };
    let err = request.create(&mut grid, &UniformField).unwrap_err();
    assert!(matches!(err, GeometryError::MissingParameter { param: "limits", .. }));

    let request = AddGrass {
        fractal_box_id: Some("rock".to_string()),
        ..x_face_request()
    };
    let err = request.create(&mut grid, &UniformField).unwrap_err();
    assert!(matches!(err, GeometryError::VolumeNotFound { ref id, .. } if id == "rock"));

    let request = AddGrass {
        frac_dim: Some(-1.0),
        ..x_face_request()
    };
    let err = request.create(&mut grid, &UniformField).unwrap_err();
    assert!(matches!(err, GeometryError::InvalidParameter { .. }));
}

#[test]
fn test_rotated_request_lands_on_maximum_side() {
    // x = xs face turned half a revolution about the box's vertical axis
    let mut grid = grid_with_soil(1e-12);
    let mut request = AddGrass {
        p1: Some(Vec3::new(0.0, 0.0, 0.0)),
        p2: Some(Vec3::new(0.0, 0.1, 0.05)),
        ..x_face_request()
    };
    request.rotate(RotationAxis::Z, 180.0, Some(Vec3::new(0.05, 0.05, 0.0)));
    request.create(&mut grid, &UniformField).unwrap();

    let surface = &grid.fractal_volume("soil").unwrap().surfaces()[0];
    assert_eq!(surface.orientation(), SurfaceOrientation::XPlus);
    assert_eq!(*surface.extents(), [10, 10, 0, 10, 0, 5]);

    request.rotate(RotationAxis::Z, 45.0, None);
    let err = request.create(&mut grid, &UniformField).unwrap_err();
    assert!(matches!(err, GeometryError::InvalidParameter { .. }));
}
