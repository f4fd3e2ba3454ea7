//! Core traits for proxymesh

use crate::{bounds::BoundingBox, mesh::*, point::*, point_cloud::*};

/// Trait for nearest neighbor search functionality
pub trait NearestNeighborSearch {
    /// Find the k nearest neighbors to a query point
    fn find_k_nearest(&self, query: &Point3f, k: usize) -> Vec<(usize, f32)>;

    /// Find all neighbors within a given radius
    fn find_radius_neighbors(&self, query: &Point3f, radius: f32) -> Vec<(usize, f32)>;

    /// Whether any indexed point lies within `radius` of `query`
    fn has_neighbor_within(&self, query: &Point3f, radius: f32) -> bool {
        !self.find_radius_neighbors(query, radius).is_empty()
    }
}

/// Objects with a spatial extent
pub trait Bounded {
    /// Axis-aligned bounds, `None` when there is nothing to bound
    fn bounding_box(&self) -> Option<BoundingBox>;
}

impl Bounded for PointCloud<Point3f> {
    fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(&self.points)
    }
}

impl Bounded for PointCloud<Sample> {
    fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(&self.positions())
    }
}

impl Bounded for TriangleMesh {
    fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(&self.vertices)
    }
}
