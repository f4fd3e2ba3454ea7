//! Axis-aligned bounding boxes

use crate::error::{Error, Result};
use crate::point::*;
use serde::{Deserialize, Serialize};

/// An axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point3f,
    pub max: Point3f,
}

impl BoundingBox {
    pub fn new(min: Point3f, max: Point3f) -> Self {
        Self { min, max }
    }

    /// Smallest box enclosing all points; `None` for an empty slice
    pub fn from_points(points: &[Point3f]) -> Option<Self> {
        let first = *points.first()?;
        let mut min = first;
        let mut max = first;

        for p in &points[1..] {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            min.z = min.z.min(p.z);

            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
            max.z = max.z.max(p.z);
        }

        Some(Self { min, max })
    }

    pub fn extent(&self) -> Vector3f {
        self.max - self.min
    }

    /// Enclosed volume, zero if any extent is non-positive
    pub fn volume(&self) -> f32 {
        let diff = self.extent();
        if diff.iter().any(|&d| d <= 0.0) {
            return 0.0;
        }
        diff.x * diff.y * diff.z
    }

    pub fn ensure_non_degenerate(&self) -> Result<()> {
        if self.volume() > 0.0 {
            Ok(())
        } else {
            Err(Error::Precondition(format!(
                "bounding box [{:?}, {:?}] has zero volume",
                self.min, self.max
            )))
        }
    }

    pub fn center(&self) -> Point3f {
        nalgebra::center(&self.min, &self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_points() {
        let bbox = BoundingBox::from_points(&[
            Point3f::new(1.0, -2.0, 3.0),
            Point3f::new(-1.0, 5.0, 0.0),
            Point3f::new(0.0, 0.0, 4.0),
        ])
        .unwrap();

        assert_eq!(bbox.min, Point3f::new(-1.0, -2.0, 0.0));
        assert_eq!(bbox.max, Point3f::new(1.0, 5.0, 4.0));
        assert_eq!(bbox.volume(), 2.0 * 7.0 * 4.0);
        assert!(bbox.ensure_non_degenerate().is_ok());
    }

    #[test]
    fn test_flat_box_is_degenerate() {
        let bbox = BoundingBox::from_points(&[
            Point3f::new(0.0, 0.0, 1.0),
            Point3f::new(4.0, 4.0, 1.0),
        ])
        .unwrap();

        assert_eq!(bbox.volume(), 0.0);
        assert!(matches!(
            bbox.ensure_non_degenerate(),
            Err(Error::Precondition(_))
        ));
    }

    #[test]
    fn test_empty_points() {
        assert!(BoundingBox::from_points(&[]).is_none());
    }
}
