//! Point cloud containers

use crate::point::*;
use serde::{Deserialize, Serialize};
use std::ops::Index;

/// A generic, ordered point container
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointCloud<T> {
    pub points: Vec<T>,
}

/// A bare position cloud
pub type PointCloud3f = PointCloud<Point3f>;

/// Oriented samples awaiting reconstruction
pub type SampleSet = PointCloud<Sample>;

impl<T> PointCloud<T> {
    /// Create a new empty point cloud
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    /// Create a new point cloud with specified capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
        }
    }

    /// Create a point cloud from a vector of points
    pub fn from_points(points: Vec<T>) -> Self {
        Self { points }
    }

    /// Get the number of points in the cloud
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the point cloud is empty
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Add a point to the cloud
    pub fn push(&mut self, point: T) {
        self.points.push(point);
    }

    /// Get an iterator over the points
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.points.iter()
    }
}

impl PointCloud<Sample> {
    /// Positions of all samples, in insertion order
    pub fn positions(&self) -> Vec<Point3f> {
        self.points.iter().map(|s| s.position).collect()
    }

    /// Number of samples whose normal is straight up
    pub fn upward_count(&self) -> usize {
        self.points
            .iter()
            .filter(|s| s.normal == Vector3f::z())
            .count()
    }
}

impl<T> Default for PointCloud<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Index<usize> for PointCloud<T> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        &self.points[index]
    }
}

impl<T> IntoIterator for PointCloud<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a PointCloud<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

impl<T> Extend<T> for PointCloud<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.points.extend(iter);
    }
}

impl<T> FromIterator<T> for PointCloud<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            points: Vec::from_iter(iter),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_set_positions_keep_order() {
        let samples: SampleSet = (0..4)
            .map(|i| Sample::new(Point3f::new(i as f32, 0.0, 0.0), Vector3f::z()))
            .collect();

        let positions = samples.positions();
        assert_eq!(positions.len(), 4);
        assert_eq!(positions[3], Point3f::new(3.0, 0.0, 0.0));
        assert_eq!(samples.upward_count(), 4);
    }

    #[test]
    fn test_extend_appends() {
        let mut cloud = PointCloud3f::new();
        cloud.push(Point3f::origin());
        cloud.extend(vec![Point3f::new(1.0, 1.0, 1.0)]);
        assert_eq!(cloud.len(), 2);
        assert_eq!(cloud[1], Point3f::new(1.0, 1.0, 1.0));
    }
}
