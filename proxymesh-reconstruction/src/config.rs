//! Pipeline configuration

use proxymesh_core::{Error, Result, Vector3f};

/// Configuration of the densification pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Grid cell size in world units (default: 1.0)
    pub resolution: f32,
    /// Submit the original cloud alongside synthesized samples (default: false)
    pub fuse: bool,
    /// Upper bound on hole-filling passes (default: 10000)
    pub max_fill_iterations: usize,
    /// Confidence of synthesized samples (default: 0.5)
    pub sample_confidence: f32,
    /// Color of synthesized samples (default: blue)
    pub sample_color: Vector3f,
    /// Color of fused original samples (default: 0.7 grey)
    pub fused_color: Vector3f,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            resolution: 1.0,
            fuse: false,
            max_fill_iterations: 10_000,
            sample_confidence: 0.5,
            sample_color: Vector3f::new(0.0, 0.0, 1.0),
            fused_color: Vector3f::new(0.7, 0.7, 0.7),
        }
    }
}

impl PipelineConfig {
    pub fn with_resolution(mut self, resolution: f32) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_fuse(mut self, fuse: bool) -> Self {
        self.fuse = fuse;
        self
    }

    pub fn with_max_fill_iterations(mut self, max_fill_iterations: usize) -> Self {
        self.max_fill_iterations = max_fill_iterations;
        self
    }

    pub fn with_sample_confidence(mut self, confidence: f32) -> Self {
        self.sample_confidence = confidence;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.resolution.is_finite() && self.resolution > 0.0) {
            return Err(Error::Precondition(format!(
                "resolution must be positive and finite, got {}",
                self.resolution
            )));
        }
        if !(self.sample_confidence > 0.0) {
            return Err(Error::Precondition(format!(
                "synthesized sample confidence must be positive, got {}",
                self.sample_confidence
            )));
        }
        Ok(())
    }
}
