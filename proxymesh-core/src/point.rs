//! Point types and oriented reconstruction samples

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// A 3D point with floating point coordinates
pub type Point3f = Point3<f32>;

/// A 3D vector with floating point components
pub type Vector3f = Vector3<f32>;

/// An oriented, confidence-weighted sample handed to an implicit-surface
/// reconstructor.
///
/// `scale` is the footprint of the sample in world units (the grid resolution
/// for synthesized samples), `confidence` its trust weight and `color` a linear
/// RGB triple in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub position: Point3f,
    pub normal: Vector3f,
    pub scale: f32,
    pub confidence: f32,
    pub color: Vector3f,
}

impl Sample {
    /// Create a sample with unit scale, full confidence and white color
    pub fn new(position: Point3f, normal: Vector3f) -> Self {
        Self {
            position,
            normal,
            scale: 1.0,
            confidence: 1.0,
            color: Vector3f::new(1.0, 1.0, 1.0),
        }
    }

    /// Set the footprint of the sample
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    /// Set the confidence weight of the sample
    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    /// Set the color of the sample
    pub fn with_color(mut self, color: Vector3f) -> Self {
        self.color = color;
        self
    }
}

/// Quantize a unit-range RGB color to 8 bits per channel
pub fn color_to_rgb8(color: &Vector3f) -> [u8; 3] {
    let channel = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    [channel(color.x), channel(color.y), channel(color.z)]
}

impl Default for Sample {
    fn default() -> Self {
        Self::new(Point3f::origin(), Vector3f::z())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_builder() {
        let sample = Sample::new(Point3f::new(1.0, 2.0, 3.0), Vector3f::z())
            .with_scale(0.25)
            .with_confidence(0.5)
            .with_color(Vector3f::new(0.0, 0.0, 1.0));

        assert_eq!(sample.position, Point3f::new(1.0, 2.0, 3.0));
        assert_eq!(sample.scale, 0.25);
        assert_eq!(sample.confidence, 0.5);
        assert_eq!(sample.color, Vector3f::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_color_to_rgb8() {
        assert_eq!(color_to_rgb8(&Vector3f::new(0.0, 0.2, 1.0)), [0, 51, 255]);
        assert_eq!(color_to_rgb8(&Vector3f::new(-1.0, 2.0, 0.5)), [0, 255, 128]);
    }

    #[test]
    fn test_sample_default_points_up() {
        let sample = Sample::default();
        assert_eq!(sample.normal, Vector3f::new(0.0, 0.0, 1.0));
        assert_eq!(sample.scale, 1.0);
    }
}
