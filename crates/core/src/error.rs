//! Error type shared by the geometry operators
//!
//! Every validation step reports through [`GeometryError`]. Variants carry the
//! command name (`#add_grass`, `#geometry_objects_read`) so the surrounding
//! command layer can surface the message unchanged.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GeometryError>;

/// Errors raised while validating or applying a geometry command.
#[derive(Debug, Error)]
pub enum GeometryError {
    /// A required named parameter was not supplied.
    #[error("{cmd} requires parameter '{param}'")]
    MissingParameter { cmd: &'static str, param: &'static str },

    /// A parameter is present but outside its legal range.
    #[error("{cmd} {message}")]
    InvalidParameter { cmd: &'static str, message: String },

    /// Non-planar face, zero-extent face, face off the volume boundary or
    /// points outside the domain.
    #[error("{cmd} {message}")]
    InvalidGeometry { cmd: &'static str, message: String },

    /// Face lies on the minimum-coordinate side of its volume.
    #[error("{cmd} can only be specified on surfaces in the positive axis direction ({axis}minus requested)")]
    UnsupportedOrientation { cmd: &'static str, axis: char },

    /// Requested range or sub-volume would leave the grid.
    #[error("{cmd} would exceed the domain size in the {axis} direction ({requested} > {available} cells)")]
    DomainOverflow {
        cmd: &'static str,
        axis: char,
        requested: usize,
        available: usize,
    },

    /// The named fractal volume is not registered.
    #[error("{cmd} cannot find FractalBox '{id}'")]
    VolumeNotFound { cmd: &'static str, id: String },

    /// More features were requested than the face has cells.
    #[error("{cmd} the specified surface is not large enough for {requested} features ({available} cells available)")]
    CapacityExceeded {
        cmd: &'static str,
        requested: usize,
        available: usize,
    },

    /// A material relaxation time cannot be resolved at the grid time step.
    #[error("{cmd} requires the time step for the model ({dt:e} s) to be less than the relaxation time of '{material}' ({tau:e} s)")]
    IncompatibleTimestep {
        cmd: &'static str,
        material: String,
        tau: f64,
        dt: f64,
    },

    /// Dataset pitch does not match the grid pitch.
    #[error("{cmd} requires the spatial resolution of the geometry objects file ({file_pitch:?}) to match the spatial resolution of the model ({grid_pitch:?})")]
    ResolutionMismatch {
        cmd: &'static str,
        file_pitch: [f64; 3],
        grid_pitch: [f64; 3],
    },

    /// A material with this identifier already exists.
    #[error("material with ID '{0}' already exists")]
    DuplicateMaterial(String),

    /// A fractal volume with this identifier already exists.
    #[error("FractalBox with ID '{0}' already exists")]
    DuplicateVolume(String),

    /// A material-definition line could not be interpreted.
    #[error("cannot process material command '{line}': {message}")]
    MaterialCommand { line: String, message: String },

    /// The geometry dataset is structurally invalid.
    #[error("geometry dataset {}: {message}", path.display())]
    Dataset { path: PathBuf, message: String },

    /// Filesystem failure while reading or writing a resource.
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failure while encoding or decoding a dataset document.
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl GeometryError {
    pub(crate) fn invalid_geometry(cmd: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidGeometry {
            cmd,
            message: message.into(),
        }
    }

    pub(crate) fn invalid_parameter(cmd: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            cmd,
            message: message.into(),
        }
    }

    pub(crate) fn dataset(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Dataset {
            path: path.into(),
            message: message.into(),
        }
    }
}
