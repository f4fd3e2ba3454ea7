//! Core data structures and traits for proxymesh
//!
//! This crate provides the shared types of the height-field densification
//! pipeline: samples, point containers, meshes with per-vertex attributes,
//! bounding boxes, height rasters and the spatial-search trait.

pub mod bounds;
pub mod error;
pub mod grid;
pub mod mesh;
pub mod point;
pub mod point_cloud;
pub mod traits;
pub mod transform;

pub use bounds::*;
pub use error::*;
pub use grid::*;
pub use mesh::*;
pub use point::*;
pub use point_cloud::*;
pub use traits::*;
pub use transform::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Matrix3, Matrix4, Point3, Vector3};
