//! Nearest neighbor search implementations

use proxymesh_core::{NearestNeighborSearch, Point3f};
use rstar::primitives::GeomWithData;
use rstar::RTree;

type IndexedPosition = GeomWithData<[f32; 3], usize>;

/// R*-tree over a fixed set of positions
pub struct PointIndex {
    tree: RTree<IndexedPosition>,
}

impl PointIndex {
    pub fn new(points: &[Point3f]) -> Self {
        let entries = points
            .iter()
            .enumerate()
            .map(|(idx, p)| GeomWithData::new([p.x, p.y, p.z], idx))
            .collect();

        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

fn distance(a: &[f32; 3], query: &Point3f) -> f32 {
    let dx = a[0] - query.x;
    let dy = a[1] - query.y;
    let dz = a[2] - query.z;
    (dx * dx + dy * dy + dz * dz).sqrt()
}

impl NearestNeighborSearch for PointIndex {
    fn find_k_nearest(&self, query: &Point3f, k: usize) -> Vec<(usize, f32)> {
        let q = [query.x, query.y, query.z];
        self.tree
            .nearest_neighbor_iter(&q)
            .take(k)
            .map(|entry| (entry.data, distance(entry.geom(), query)))
            .collect()
    }

    fn find_radius_neighbors(&self, query: &Point3f, radius: f32) -> Vec<(usize, f32)> {
        let q = [query.x, query.y, query.z];
        let mut neighbors: Vec<(usize, f32)> = self
            .tree
            .locate_within_distance(q, radius * radius)
            .map(|entry| (entry.data, distance(entry.geom(), query)))
            .collect();

        neighbors.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        neighbors
    }

    fn has_neighbor_within(&self, query: &Point3f, radius: f32) -> bool {
        self.tree
            .locate_within_distance([query.x, query.y, query.z], radius * radius)
            .next()
            .is_some()
    }
}

/// Simple brute force nearest neighbor search for small datasets
pub struct BruteForceSearch {
    points: Vec<Point3f>,
}

impl BruteForceSearch {
    pub fn new(points: &[Point3f]) -> Self {
        Self {
            points: points.to_vec(),
        }
    }
}

impl NearestNeighborSearch for BruteForceSearch {
    fn find_k_nearest(&self, query: &Point3f, k: usize) -> Vec<(usize, f32)> {
        let mut distances: Vec<(usize, f32)> = self
            .points
            .iter()
            .enumerate()
            .map(|(idx, point)| (idx, (point - query).norm()))
            .collect();

        distances.sort_by(|a, b| a.1.total_cmp(&b.1));
        distances.truncate(k);
        distances
    }

    fn find_radius_neighbors(&self, query: &Point3f, radius: f32) -> Vec<(usize, f32)> {
        let radius_squared = radius * radius;
        self.points
            .iter()
            .enumerate()
            .filter_map(|(idx, point)| {
                let distance_squared = (point - query).norm_squared();
                (distance_squared <= radius_squared).then(|| (idx, distance_squared.sqrt()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_points() -> Vec<Point3f> {
        let mut points = Vec::new();
        for i in 0..10 {
            for j in 0..10 {
                points.push(Point3f::new(i as f32, j as f32, 0.0));
            }
        }
        points
    }

    #[test]
    fn test_radius_query_matches_brute_force() {
        let points = grid_points();
        let index = PointIndex::new(&points);
        let brute = BruteForceSearch::new(&points);
        let query = Point3f::new(4.2, 5.1, 0.3);

        let mut expected: Vec<usize> = brute
            .find_radius_neighbors(&query, 1.5)
            .into_iter()
            .map(|(i, _)| i)
            .collect();
        let mut found: Vec<usize> = index
            .find_radius_neighbors(&query, 1.5)
            .into_iter()
            .map(|(i, _)| i)
            .collect();
        expected.sort();
        found.sort();

        assert_eq!(found, expected);
        assert!(!found.is_empty());
    }

    #[test]
    fn test_k_nearest_is_sorted() {
        let points = grid_points();
        let index = PointIndex::new(&points);
        let nearest = index.find_k_nearest(&Point3f::new(0.1, 0.0, 0.0), 3);

        assert_eq!(nearest.len(), 3);
        assert_eq!(nearest[0].0, 0);
        assert!(nearest.windows(2).all(|w| w[0].1 <= w[1].1));
    }

    #[test]
    fn test_has_neighbor_within() {
        let index = PointIndex::new(&[Point3f::new(0.0, 0.0, 5.0)]);
        assert!(index.has_neighbor_within(&Point3f::new(0.0, 0.0, 4.5), 1.0));
        assert!(!index.has_neighbor_within(&Point3f::new(0.0, 0.0, 3.0), 1.0));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_duplicate_points() {
        let points = vec![Point3f::new(1.0, 1.0, 1.0); 100];
        let index = PointIndex::new(&points);
        assert_eq!(
            index
                .find_radius_neighbors(&Point3f::new(1.0, 1.0, 1.0), 0.1)
                .len(),
            100
        );
    }
}
