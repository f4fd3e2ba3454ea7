//! Screened Poisson backend for the reconstruction adapter

use crate::adapter::SurfaceReconstructor;
use proxymesh_algorithms::{execute_parallel, PointIndex};
use proxymesh_core::{
    color_to_rgb8, Error, NearestNeighborSearch, Point3f, Result, Sample, TriangleMesh, Vector3f,
};
use rayon::prelude::*;
use tracing::{debug, info};

/// Configuration parameters for Poisson reconstruction
#[derive(Debug, Clone)]
pub struct PoissonConfig {
    /// Weight of the point interpolation term (default: 4.0)
    pub screening: f32,
    /// Octree depth used for sample density estimation (default: 6)
    pub density_estimation_depth: usize,
    /// The maximum depth of the octree (default: 8)
    pub max_depth: usize,
    /// Gauss-Seidel relaxations per level (default: 10)
    pub max_relaxation_iters: usize,
    /// A sample supports a vertex within `radius_factor × scale` (default: 2.0)
    pub radius_factor: f32,
}

impl Default for PoissonConfig {
    fn default() -> Self {
        Self {
            screening: 4.0,
            density_estimation_depth: 6,
            max_depth: 8,
            max_relaxation_iters: 10,
            radius_factor: 2.0,
        }
    }
}

impl PoissonConfig {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_radius_factor(mut self, radius_factor: f32) -> Self {
        self.radius_factor = radius_factor;
        self
    }
}

const MIN_SAMPLES: usize = 10;

/// Buffers samples and reconstructs with the `poisson_reconstruction` crate.
///
/// Each output vertex receives the distance-weighted mean confidence, color
/// and scale of the samples whose footprint reaches it, and confidence 0
/// when none does.
#[derive(Debug, Default)]
pub struct PoissonReconstructor {
    config: PoissonConfig,
    samples: Vec<Sample>,
}

impl PoissonReconstructor {
    pub fn new(config: PoissonConfig) -> Self {
        Self {
            config,
            samples: Vec::new(),
        }
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    fn surface(&self) -> Result<TriangleMesh> {
        let points: Vec<nalgebra::Point3<f64>> = self
            .samples
            .iter()
            .map(|s| s.position.cast::<f64>())
            .collect();
        let normals: Vec<nalgebra::Vector3<f64>> = self
            .samples
            .iter()
            .map(|s| s.normal.cast::<f64>())
            .collect();

        let poisson = poisson_reconstruction::PoissonReconstruction::from_points_and_normals(
            &points,
            &normals,
            self.config.screening as f64,
            self.config.density_estimation_depth,
            self.config.max_depth,
            self.config.max_relaxation_iters,
        );
        let mesh_buffers = poisson.reconstruct_mesh_buffers();

        if mesh_buffers.vertices().is_empty() {
            return Err(Error::Algorithm(
                "Poisson reconstruction generated no vertices".to_string(),
            ));
        }

        let vertices: Vec<Point3f> = mesh_buffers
            .vertices()
            .iter()
            .map(|v| v.cast::<f32>())
            .collect();

        let indices = mesh_buffers.indices();
        if indices.len() % 3 != 0 {
            return Err(Error::Algorithm(
                "Invalid triangle indices from Poisson reconstruction".to_string(),
            ));
        }
        let faces: Vec<[usize; 3]> = indices
            .chunks_exact(3)
            .map(|c| [c[0] as usize, c[1] as usize, c[2] as usize])
            .collect();

        Ok(TriangleMesh::from_vertices_and_faces(vertices, faces))
    }
}

/// Weighted sample attributes at one vertex
#[derive(Debug, Clone, Copy, PartialEq)]
struct Support {
    confidence: f32,
    scale: f32,
    color: Vector3f,
}

impl Support {
    fn none() -> Self {
        Self {
            confidence: 0.0,
            scale: 0.0,
            color: Vector3f::zeros(),
        }
    }
}

/// Blend the samples reaching `vertex`; weights fall off linearly to zero at
/// `radius_factor × scale`.
fn support_at(
    vertex: &Point3f,
    samples: &[Sample],
    index: &PointIndex,
    search_radius: f32,
    radius_factor: f32,
) -> Support {
    let mut total = 0.0;
    let mut confidence = 0.0;
    let mut scale = 0.0;
    let mut color = Vector3f::zeros();

    for (i, distance) in index.find_radius_neighbors(vertex, search_radius) {
        let sample = &samples[i];
        let reach = radius_factor * sample.scale;
        if reach <= 0.0 || distance >= reach {
            continue;
        }
        let weight = 1.0 - distance / reach;
        total += weight;
        confidence += weight * sample.confidence;
        scale += weight * sample.scale;
        color += sample.color * weight;
    }

    if total <= 0.0 {
        return Support::none();
    }
    Support {
        confidence: confidence / total,
        scale: scale / total,
        color: color / total,
    }
}

impl SurfaceReconstructor for PoissonReconstructor {
    fn submit_sample(&mut self, sample: Sample) {
        self.samples.push(sample);
    }

    fn sample_count(&self) -> usize {
        self.samples.len()
    }

    fn extract_mesh(&mut self) -> Result<TriangleMesh> {
        if self.samples.len() < MIN_SAMPLES {
            return Err(Error::InvalidData(format!(
                "Poisson reconstruction needs at least {} samples, got {}",
                MIN_SAMPLES,
                self.samples.len()
            )));
        }
        if let Some(i) = self
            .samples
            .iter()
            .position(|s| (s.normal.norm() - 1.0).abs() > 0.1)
        {
            return Err(Error::InvalidData(format!(
                "Invalid normal at sample {}: magnitude {}",
                i,
                self.samples[i].normal.norm()
            )));
        }

        info!("Running Poisson reconstruction on {} samples", self.samples.len());
        let mut mesh = self.surface()?;
        debug!(
            "Poisson surface has {} vertices and {} faces",
            mesh.vertex_count(),
            mesh.face_count()
        );

        let positions: Vec<Point3f> = self.samples.iter().map(|s| s.position).collect();
        let index = PointIndex::new(&positions);
        let max_scale = self.samples.iter().map(|s| s.scale).fold(0.0f32, f32::max);
        let search_radius = self.config.radius_factor * max_scale;
        let samples = &self.samples;
        let radius_factor = self.config.radius_factor;

        let support: Vec<Support> = execute_parallel(|| {
            mesh.vertices
                .par_iter()
                .map(|v| support_at(v, samples, &index, search_radius, radius_factor))
                .collect()
        });

        mesh.set_confidences(support.iter().map(|s| s.confidence).collect())?;
        mesh.set_values(support.iter().map(|s| s.scale).collect())?;
        mesh.set_colors(support.iter().map(|s| color_to_rgb8(&s.color)).collect())?;
        mesh.compute_vertex_normals();

        self.samples.clear();
        Ok(mesh)
    }
}
