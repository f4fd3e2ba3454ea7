//! Hand-off from samples to an implicit-surface reconstructor
//!
//! The adapter stamps synthesized samples with the configured confidence and
//! color, optionally adds the original cloud as fused samples, runs the
//! reconstructor and strips the zero-confidence vertices it reports.

use crate::config::PipelineConfig;
use proxymesh_core::{Error, Result, Sample, SampleSet, TriangleMesh};
use tracing::{debug, info, warn};

/// A surface reconstructor fed one oriented sample at a time
pub trait SurfaceReconstructor {
    fn submit_sample(&mut self, sample: Sample);

    /// Number of samples submitted so far
    fn sample_count(&self) -> usize;

    /// Build the surface from every submitted sample.
    ///
    /// The mesh must carry per-vertex confidences; vertices with confidence
    /// exactly 0 have no supporting sample.
    fn extract_mesh(&mut self) -> Result<TriangleMesh>;
}

/// Counters collected by [`ReconstructionAdapter::finish`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdapterReport {
    pub synthesized: usize,
    pub fused: usize,
    pub extracted_vertices: usize,
    pub removed_vertices: usize,
}

/// Feeds samples into a [`SurfaceReconstructor`] and post-processes its mesh
pub struct ReconstructionAdapter<'a, R> {
    reconstructor: R,
    config: &'a PipelineConfig,
    report: AdapterReport,
}

impl<'a, R: SurfaceReconstructor> ReconstructionAdapter<'a, R> {
    pub fn new(reconstructor: R, config: &'a PipelineConfig) -> Self {
        Self {
            reconstructor,
            config,
            report: AdapterReport::default(),
        }
    }

    /// Submit resampled height-field samples.
    ///
    /// Position, normal and scale are kept; confidence and color are replaced
    /// by the configured values for synthesized geometry.
    pub fn submit_synthesized(&mut self, samples: &SampleSet) {
        for sample in samples {
            self.reconstructor.submit_sample(
                sample
                    .with_confidence(self.config.sample_confidence)
                    .with_color(self.config.sample_color),
            );
        }
        self.report.synthesized += samples.len();
    }

    /// Submit every vertex of the original cloud.
    ///
    /// Scale comes from the per-vertex `value`, so the cloud must carry
    /// normals, values and confidences.
    pub fn submit_fused(&mut self, cloud: &TriangleMesh) -> Result<()> {
        let samples = fused_samples(cloud, self.config)?;
        self.report.fused += samples.len();
        for sample in samples {
            self.reconstructor.submit_sample(sample);
        }
        Ok(())
    }

    /// Run the reconstructor and drop unsupported vertices
    pub fn finish(mut self) -> Result<(TriangleMesh, AdapterReport)> {
        if self.reconstructor.sample_count() == 0 {
            return Err(Error::Precondition(
                "no samples were submitted for reconstruction".to_string(),
            ));
        }

        debug!(
            "Reconstructing from {} samples ({} synthesized, {} fused)",
            self.reconstructor.sample_count(),
            self.report.synthesized,
            self.report.fused
        );

        let mut mesh = self.reconstructor.extract_mesh()?;
        self.report.extracted_vertices = mesh.vertex_count();

        let Some(confidences) = &mesh.confidences else {
            return Err(Error::Algorithm(
                "reconstructed mesh carries no vertex confidences".to_string(),
            ));
        };
        let delete: Vec<bool> = confidences.iter().map(|&c| c == 0.0).collect();
        self.report.removed_vertices = mesh.delete_vertices_fix_faces(&delete)?;

        if self.report.removed_vertices > 0 {
            warn!(
                "Removed {} zero-confidence vertices from the reconstruction",
                self.report.removed_vertices
            );
        }
        if mesh.normals.is_none() {
            mesh.compute_vertex_normals();
        }

        info!(
            "Reconstructed mesh with {} vertices and {} faces",
            mesh.vertex_count(),
            mesh.face_count()
        );

        Ok((mesh, self.report))
    }
}

/// Samples for the vertices of an attributed cloud
pub fn fused_samples(cloud: &TriangleMesh, config: &PipelineConfig) -> Result<Vec<Sample>> {
    let (Some(normals), Some(values), Some(confidences)) =
        (&cloud.normals, &cloud.values, &cloud.confidences)
    else {
        return Err(Error::Precondition(
            "fusing requires per-vertex normals, values and confidences".to_string(),
        ));
    };

    Ok(cloud
        .vertices
        .iter()
        .zip(normals)
        .zip(values)
        .zip(confidences)
        .map(|(((&position, &normal), &scale), &confidence)| {
            Sample::new(position, normal)
                .with_scale(scale)
                .with_confidence(confidence)
                .with_color(config.fused_color)
        })
        .collect())
}
