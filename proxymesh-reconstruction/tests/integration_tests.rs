//! Integration tests for proxymesh-reconstruction
//!
//! These run the full pipeline on a synthetic city block: flat ground with a
//! single box-shaped building, so the height field has one clean step.

use proxymesh_core::{Point3f, Result, Sample, TriangleMesh, Vector3f};
use proxymesh_reconstruction::*;

const ROOF: f32 = 5.0;

fn is_roof(x: f32, y: f32) -> bool {
    (6.0..=12.0).contains(&x) && (6.0..=12.0).contains(&y)
}

/// Ground and roof points on a 0.5 spacing over a 20×20 block
fn create_city_block() -> TriangleMesh {
    let mut points = Vec::new();
    for j in 0..=40 {
        for i in 0..=40 {
            let (x, y) = (i as f32 * 0.5, j as f32 * 0.5);
            let z = if is_roof(x, y) { ROOF } else { 0.0 };
            points.push(Point3f::new(x, y, z));
        }
    }
    TriangleMesh::from_points(points)
}

/// Same block plus a scanned facade along the west side of the building,
/// with the attributes fuse mode needs
fn create_scanned_city_block() -> TriangleMesh {
    let mut cloud = create_city_block();
    for j in 12..=24 {
        for k in 1..10 {
            cloud
                .vertices
                .push(Point3f::new(6.0, j as f32 * 0.5, k as f32 * 0.5));
        }
    }
    let n = cloud.vertex_count();
    cloud.set_normals(vec![Vector3f::z(); n]).unwrap();
    cloud.set_values(vec![0.5; n]).unwrap();
    cloud.set_confidences(vec![1.0; n]).unwrap();
    cloud
}

/// Collects samples; answers with one supported and one unsupported vertex
#[derive(Default)]
struct CollectingReconstructor {
    samples: Vec<Sample>,
}

impl SurfaceReconstructor for CollectingReconstructor {
    fn submit_sample(&mut self, sample: Sample) {
        self.samples.push(sample);
    }

    fn sample_count(&self) -> usize {
        self.samples.len()
    }

    fn extract_mesh(&mut self) -> Result<TriangleMesh> {
        let mut mesh = TriangleMesh::from_points(vec![Point3f::origin(), Point3f::new(1.0, 1.0, 1.0)]);
        mesh.set_confidences(vec![0.5, 0.0])?;
        Ok(mesh)
    }
}

#[test]
fn test_building_produces_wall_samples() {
    let pipeline = ProxyMeshPipeline::default();
    let cloud = create_city_block();

    let output = pipeline
        .run_with(&cloud, CollectingReconstructor::default())
        .unwrap();
    let stats = &output.samples.stats;

    assert!(output.height_field.fill_report.converged());
    assert_eq!(output.height_field.field.ground_level, 0.0);
    assert!(stats.flat_samples > 0);
    assert!(stats.surface_samples > 0);
    // Every discontinuous cell on the roof edge drops the full roof height
    assert!(stats.wall_samples >= stats.surface_samples);

    let walls: Vec<&Sample> = output
        .samples
        .samples
        .iter()
        .filter(|s| s.normal.z == 0.0)
        .collect();
    assert_eq!(walls.len(), stats.wall_samples);
    for wall in walls {
        assert!((wall.normal.norm() - 1.0).abs() < 1e-5);
        assert!(wall.position.z >= 0.0 && wall.position.z < ROOF);
        assert_eq!(wall.scale, 1.0);
    }

    // Surface samples on the roof edge lean outward
    let leaning = output
        .samples
        .samples
        .iter()
        .filter(|s| s.normal.z > 0.0 && s.normal.z < 1.0)
        .count();
    assert_eq!(leaning, stats.surface_samples);

    // The unsupported vertex is stripped
    assert_eq!(output.mesh.vertex_count(), 1);
    assert_eq!(output.adapter.removed_vertices, 1);
}

#[test]
fn test_samples_are_reproducible() {
    let pipeline = ProxyMeshPipeline::default();
    let cloud = create_city_block();

    let a = pipeline
        .run_with(&cloud, CollectingReconstructor::default())
        .unwrap();
    let b = pipeline
        .run_with(&cloud, CollectingReconstructor::default())
        .unwrap();

    assert_eq!(a.samples.samples.points, b.samples.samples.points);
    let ys: Vec<f32> = a.samples.samples.iter().map(|s| s.position.y).collect();
    assert!(ys.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn test_fusing_suppresses_covered_walls() {
    let cloud = create_scanned_city_block();

    let plain = ProxyMeshPipeline::default()
        .run_with(&cloud, CollectingReconstructor::default())
        .unwrap();
    let fused = ProxyMeshPipeline::new(PipelineConfig::default().with_fuse(true))
        .run_with(&cloud, CollectingReconstructor::default())
        .unwrap();

    assert_eq!(fused.samples.stats.flat_samples, 0);
    assert!(fused.samples.stats.flat_skipped > 0);
    assert!(fused.samples.stats.wall_suppressed_fused > 0);
    assert!(fused.samples.stats.wall_samples < plain.samples.stats.wall_samples);
    assert_eq!(fused.adapter.fused, cloud.vertex_count());
}

#[test]
fn test_degenerate_input_is_rejected() {
    let pipeline = ProxyMeshPipeline::default();
    let flat = TriangleMesh::from_points(vec![
        Point3f::new(0.0, 0.0, 0.0),
        Point3f::new(1.0, 1.0, 0.0),
    ]);

    let result = pipeline.run_with(&flat, CollectingReconstructor::default());
    assert!(matches!(result, Err(proxymesh_core::Error::Precondition(_))));

    let bad_resolution = ProxyMeshPipeline::new(PipelineConfig::default().with_resolution(-1.0));
    assert!(bad_resolution
        .run_with(&create_city_block(), CollectingReconstructor::default())
        .is_err());
}

/// A 10×10 block with a 4 m box building, small enough for a shallow octree
fn create_small_block() -> TriangleMesh {
    let mut points = Vec::new();
    for j in 0..=20 {
        for i in 0..=20 {
            let (x, y) = (i as f32 * 0.5, j as f32 * 0.5);
            let roof = (3.0..=6.0).contains(&x) && (3.0..=6.0).contains(&y);
            points.push(Point3f::new(x, y, if roof { 4.0 } else { 0.0 }));
        }
    }
    TriangleMesh::from_points(points)
}

#[test]
fn test_poisson_pipeline_on_small_block() {
    let poisson = PoissonConfig {
        density_estimation_depth: 4,
        max_depth: 5,
        max_relaxation_iters: 5,
        ..PoissonConfig::default()
    };
    let pipeline = ProxyMeshPipeline::default().with_poisson(poisson);
    let cloud = create_small_block();

    let output = pipeline.run(&cloud).unwrap();
    let mesh = &output.mesh;

    assert!(output.samples.stats.wall_samples > 0);
    assert!(mesh.vertex_count() > 0);
    assert!(mesh.face_count() > 0);
    let confidences = mesh.confidences.as_ref().unwrap();
    assert!(confidences.iter().all(|&c| c > 0.0 && c <= 1.0));
    assert_eq!(mesh.normals.as_ref().unwrap().len(), mesh.vertex_count());
    assert_eq!(mesh.colors.as_ref().unwrap().len(), mesh.vertex_count());
    assert!(mesh
        .faces
        .iter()
        .all(|f| f.iter().all(|&i| i < mesh.vertex_count())));
}

#[test]
fn test_ply_round_trip_through_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let cloud_path = dir.path().join("cloud.ply");
    let mesh_path = dir.path().join("mesh.ply");

    proxymesh_io::write_mesh(&create_scanned_city_block(), &cloud_path).unwrap();
    let cloud = proxymesh_io::read_point_cloud(&cloud_path).unwrap();
    assert!(cloud.normals.is_some() && cloud.values.is_some() && cloud.confidences.is_some());

    let output = ProxyMeshPipeline::new(PipelineConfig::default().with_fuse(true))
        .run_with(&cloud, CollectingReconstructor::default())
        .unwrap();
    proxymesh_io::write_mesh(&output.mesh, &mesh_path).unwrap();

    let mesh = proxymesh_io::read_mesh(&mesh_path).unwrap();
    assert_eq!(mesh.vertex_count(), output.mesh.vertex_count());
    assert_eq!(mesh.confidences, output.mesh.confidences);
}
