//! # proxymesh algorithms
//!
//! Height-field stages of the densification pipeline: rasterization, median
//! denoising, hole filling, ground normalization and discontinuity-aware
//! resampling, plus the spatial index and value normalization they rely on.

pub mod filtering;
pub mod ground;
pub mod nearest_neighbor;
pub mod parallel;
pub mod rasterize;
pub mod resample;
pub mod values;

// Re-export commonly used items
pub use filtering::*;
pub use ground::*;
pub use nearest_neighbor::*;
pub use parallel::*;
pub use rasterize::{cell_to_world, grid_dimensions, rasterize, world_to_cell};
pub use resample::*;
pub use values::*;
