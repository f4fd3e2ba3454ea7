//! End-to-end densification pipeline
//!
//! cloud → raster → median → hole fill → ground normalization → resampling
//! → reconstruction. Each stage completes before the next begins; the stage
//! methods are public so callers can persist intermediate results.

use crate::adapter::{AdapterReport, ReconstructionAdapter, SurfaceReconstructor};
use crate::config::PipelineConfig;
use crate::poisson::{PoissonConfig, PoissonReconstructor};
use proxymesh_algorithms::{
    fill_holes, median_denoise, normalize_ground, rasterize, resample_discontinuities,
    BruteForceSearch, FillConfig, FillReport, FuseMode, HeightField, PointIndex, ResampleOutput,
};
use proxymesh_core::{Bounded, BoundingBox, Error, Result, SampleSet, TriangleMesh};
use tracing::info;

/// Output of the height-field stages
#[derive(Debug, Clone)]
pub struct HeightFieldStage {
    pub field: HeightField,
    pub fill_report: FillReport,
}

/// Everything produced by [`ProxyMeshPipeline::run`]
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub mesh: TriangleMesh,
    pub height_field: HeightFieldStage,
    pub samples: ResampleOutput,
    pub adapter: AdapterReport,
}

/// Height-field densification of a scanned point cloud
#[derive(Debug, Clone, Default)]
pub struct ProxyMeshPipeline {
    pub config: PipelineConfig,
    pub poisson: PoissonConfig,
}

impl ProxyMeshPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            poisson: PoissonConfig::default(),
        }
    }

    pub fn with_poisson(mut self, poisson: PoissonConfig) -> Self {
        self.poisson = poisson;
        self
    }

    /// Validate `cloud` and return its bounding box.
    ///
    /// The cloud must be a non-empty point set with a non-degenerate
    /// bounding box. Fuse mode additionally needs normals, values and
    /// confidences.
    pub fn check_cloud(&self, cloud: &TriangleMesh) -> Result<BoundingBox> {
        self.config.validate()?;

        if !cloud.is_point_set() {
            return Err(Error::Precondition(format!(
                "input cloud holds {} faces",
                cloud.face_count()
            )));
        }
        let bbox = cloud
            .bounding_box()
            .ok_or_else(|| Error::Precondition("input cloud is empty".to_string()))?;
        bbox.ensure_non_degenerate()?;

        if self.config.fuse
            && (cloud.normals.is_none() || cloud.values.is_none() || cloud.confidences.is_none())
        {
            return Err(Error::Precondition(
                "fusing requires per-vertex normals, values and confidences".to_string(),
            ));
        }

        Ok(bbox)
    }

    /// Rasterize, denoise, fill and ground-normalize the cloud
    pub fn build_height_field(
        &self,
        cloud: &TriangleMesh,
        bbox: &BoundingBox,
    ) -> Result<HeightFieldStage> {
        let raster = rasterize(&cloud.vertices, bbox, self.config.resolution)?;
        let denoised = median_denoise(&raster);

        let fill_config = FillConfig::default().with_max_iterations(self.config.max_fill_iterations);
        let (filled, fill_report) = fill_holes(denoised, &fill_config);

        let field = normalize_ground(&filled)?;
        Ok(HeightFieldStage { field, fill_report })
    }

    /// Synthesize samples from the height field, deduplicating against the
    /// cloud in fuse mode
    pub fn resample(
        &self,
        stage: &HeightFieldStage,
        bbox: &BoundingBox,
        cloud: &TriangleMesh,
    ) -> Result<ResampleOutput> {
        let r = self.config.resolution;
        if self.config.fuse {
            let index = PointIndex::new(&cloud.vertices);
            resample_discontinuities(&stage.field, bbox, r, FuseMode::Fuse(&index))
        } else {
            let mode: FuseMode<'_, BruteForceSearch> = FuseMode::Off;
            resample_discontinuities(&stage.field, bbox, r, mode)
        }
    }

    /// Hand the samples (and the cloud in fuse mode) to `reconstructor`
    pub fn reconstruct<R: SurfaceReconstructor>(
        &self,
        samples: &SampleSet,
        cloud: &TriangleMesh,
        reconstructor: R,
    ) -> Result<(TriangleMesh, AdapterReport)> {
        let mut adapter = ReconstructionAdapter::new(reconstructor, &self.config);
        adapter.submit_synthesized(samples);
        if self.config.fuse {
            adapter.submit_fused(cloud)?;
        }
        adapter.finish()
    }

    /// Run every stage with the Poisson backend
    pub fn run(&self, cloud: &TriangleMesh) -> Result<PipelineOutput> {
        self.run_with(cloud, PoissonReconstructor::new(self.poisson.clone()))
    }

    /// Run every stage with a caller-provided reconstructor
    pub fn run_with<R: SurfaceReconstructor>(
        &self,
        cloud: &TriangleMesh,
        reconstructor: R,
    ) -> Result<PipelineOutput> {
        let bbox = self.check_cloud(cloud)?;
        info!(
            "Processing {} points at resolution {}",
            cloud.vertex_count(),
            self.config.resolution
        );

        let height_field = self.build_height_field(cloud, &bbox)?;
        let samples = self.resample(&height_field, &bbox, cloud)?;
        let (mesh, adapter) = self.reconstruct(&samples.samples, cloud, reconstructor)?;

        Ok(PipelineOutput {
            mesh,
            height_field,
            samples,
            adapter,
        })
    }
}
