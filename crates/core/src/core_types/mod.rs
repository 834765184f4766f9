//! Core types and utilities

pub mod arrays;
pub mod units;
pub mod vec3;

pub use arrays::{element_count, ComponentArray, FaceArray, VoxelArray};
pub use units::{courant_time_step, round_value, SPEED_OF_LIGHT};
pub use vec3::Vec3;
