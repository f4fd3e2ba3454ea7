//! File formats used by proxymesh
//!
//! PLY for attributed point clouds, sample dumps and output meshes, PFM for
//! height map dumps, and a plain-text camera trajectory format.

pub mod error;
pub mod ply;
pub mod raster;
pub mod trajectory;

pub use error::*;
pub use ply::{PlyReader, PlyWriteOptions, PlyWriter};
pub use raster::{load_pfm, save_pfm};
pub use trajectory::{load_trajectory, save_trajectory, CameraInfo, Trajectory};

use proxymesh_core::{Error, Result, TriangleMesh};
use std::path::Path;

/// Trait for reading meshes from files
pub trait MeshReader {
    fn read_mesh<P: AsRef<Path>>(path: P) -> Result<TriangleMesh>;
}

/// Trait for writing meshes to files
pub trait MeshWriter {
    fn write_mesh<P: AsRef<Path>>(mesh: &TriangleMesh, path: P) -> Result<()>;
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|s| s.to_str())
        .map(str::to_ascii_lowercase)
}

/// Auto-detect format and read a mesh or point cloud
pub fn read_mesh<P: AsRef<Path>>(path: P) -> Result<TriangleMesh> {
    let path = path.as_ref();
    match extension(path).as_deref() {
        Some("ply") => PlyReader::read_mesh(path),
        _ => Err(Error::UnsupportedFormat(format!(
            "Unsupported mesh format: {:?}",
            path.extension()
        ))),
    }
}

/// Read a face-less point cloud.
///
/// Clouds carrying faces are rejected.
pub fn read_point_cloud<P: AsRef<Path>>(path: P) -> Result<TriangleMesh> {
    let path = path.as_ref();
    let cloud = read_mesh(path)?;
    if !cloud.is_point_set() {
        return Err(Error::Precondition(format!(
            "{} holds {} faces, expected a point cloud",
            path.display(),
            cloud.face_count()
        )));
    }
    Ok(cloud)
}

/// Auto-detect format and write a mesh
pub fn write_mesh<P: AsRef<Path>>(mesh: &TriangleMesh, path: P) -> Result<()> {
    let path = path.as_ref();
    match extension(path).as_deref() {
        Some("ply") => PlyWriter::write_mesh(mesh, path),
        _ => Err(Error::UnsupportedFormat(format!(
            "Unsupported mesh format: {:?}",
            path.extension()
        ))),
    }
}
