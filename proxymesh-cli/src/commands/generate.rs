//! proxymesh generate - point cloud to proxy mesh

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use proxymesh_algorithms::{init_thread_pool, ThreadPoolConfig};
use proxymesh_io::{read_point_cloud, save_pfm, write_mesh, PlyWriteOptions, PlyWriter};
use proxymesh_reconstruction::{
    HeightFieldStage, PipelineConfig, PoissonReconstructor, ProxyMeshPipeline,
};
use tracing::info;

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Input point cloud (PLY without faces)
    pub cloud: PathBuf,

    /// Output mesh (PLY)
    pub mesh: PathBuf,

    /// Grid cell size in world units
    #[arg(short, long, default_value = "1.0")]
    pub resolution: f32,

    /// Save the ground-normalized height map as a PFM file
    #[arg(long, value_name = "PATH")]
    pub height_map: Option<PathBuf>,

    /// Fuse the original cloud with the synthesized samples
    #[arg(short, long)]
    pub fuse_samples: bool,

    /// Save the synthesized samples as a PLY point set
    #[arg(long, value_name = "PATH")]
    pub samples_dump: Option<PathBuf>,

    /// Number of worker threads (default: all cores)
    #[arg(long)]
    pub threads: Option<usize>,
}

impl GenerateArgs {
    fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig::default()
            .with_resolution(self.resolution)
            .with_fuse(self.fuse_samples)
    }
}

fn dump_height_map(path: &Path, stage: &HeightFieldStage) -> Result<()> {
    save_pfm(&stage.field.grid, path)
        .with_context(|| format!("Failed to save height map to {:?}", path))?;
    info!("Height map saved to {}", path.display());
    Ok(())
}

pub fn run(args: &GenerateArgs) -> Result<()> {
    let mut pool = ThreadPoolConfig::default();
    if let Some(threads) = args.threads {
        pool = pool.with_threads(threads);
    }
    init_thread_pool(&pool).context("Failed to initialize thread pool")?;

    let cloud = read_point_cloud(&args.cloud)
        .with_context(|| format!("Failed to load cloud from {:?}", args.cloud))?;

    let pipeline = ProxyMeshPipeline::new(args.pipeline_config());
    let bbox = pipeline
        .check_cloud(&cloud)
        .with_context(|| format!("Cannot process cloud {:?}", args.cloud))?;

    let stage = pipeline
        .build_height_field(&cloud, &bbox)
        .context("Failed to build height map")?;
    if let Some(path) = &args.height_map {
        dump_height_map(path, &stage)?;
    }

    let resampled = pipeline
        .resample(&stage, &bbox, &cloud)
        .context("Failed to resample height map")?;
    if let Some(path) = &args.samples_dump {
        PlyWriter::write_samples(&resampled.samples, path, &PlyWriteOptions::default())
            .with_context(|| format!("Failed to save samples to {:?}", path))?;
        info!("Samples saved to {}", path.display());
    }

    let reconstructor = PoissonReconstructor::new(pipeline.poisson.clone());
    let (mesh, report) = pipeline
        .reconstruct(&resampled.samples, &cloud, reconstructor)
        .context("Surface reconstruction failed")?;

    write_mesh(&mesh, &args.mesh)
        .with_context(|| format!("Failed to save mesh to {:?}", args.mesh))?;

    info!(
        "Mesh saved to {} ({} vertices, {} faces, {} removed)",
        args.mesh.display(),
        mesh.vertex_count(),
        mesh.face_count(),
        report.removed_vertices
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proxymesh_core::TriangleMesh;

    fn args(cloud: PathBuf, mesh: PathBuf) -> GenerateArgs {
        GenerateArgs {
            cloud,
            mesh,
            resolution: 1.0,
            height_map: None,
            fuse_samples: false,
            samples_dump: None,
            threads: None,
        }
    }

    #[test]
    fn test_missing_cloud_fails_without_output() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("mesh.ply");
        let result = run(&args(dir.path().join("missing.ply"), out.clone()));

        assert!(result.is_err());
        assert!(!out.exists());
    }

    #[test]
    fn test_fuse_without_attributes_fails_before_dumping() {
        let dir = tempfile::tempdir().unwrap();
        let cloud_path = dir.path().join("cloud.ply");
        let cloud = TriangleMesh::from_points(vec![
            proxymesh_core::Point3f::new(0.0, 0.0, 0.0),
            proxymesh_core::Point3f::new(4.0, 4.0, 2.0),
        ]);
        write_mesh(&cloud, &cloud_path).unwrap();

        let mut args = args(cloud_path, dir.path().join("mesh.ply"));
        args.fuse_samples = true;
        args.height_map = Some(dir.path().join("height.pfm"));

        assert!(run(&args).is_err());
        assert!(!dir.path().join("height.pfm").exists());
        assert!(!args.mesh.exists());
    }
}
