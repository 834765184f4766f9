//! Simulation grid and material registry

pub mod grid_state;
pub mod material;

pub use grid_state::*;
pub use material::*;
