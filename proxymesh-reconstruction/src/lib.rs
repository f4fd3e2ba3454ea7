//! Surface reconstruction for proxymesh
//!
//! Samples synthesized from the height field (optionally fused with the
//! original scan) are handed to an implicit-surface reconstructor through
//! [`ReconstructionAdapter`]. [`ProxyMeshPipeline`] chains every stage from
//! point cloud to mesh.

pub mod adapter;
pub mod config;
pub mod pipeline;
pub mod poisson;

pub use adapter::*;
pub use config::*;
pub use pipeline::*;
pub use poisson::*;
