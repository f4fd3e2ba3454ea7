//! Per-vertex value normalization

use proxymesh_core::{Error, Result, TriangleMesh};
use tracing::{debug, info};

/// Parameters of [`normalize_values`]
#[derive(Debug, Clone)]
pub struct ValueNormalizationConfig {
    /// Fraction of extreme values ignored when picking the range (default: 0)
    pub epsilon: f32,
    /// Clamp out-of-range values to 0/1 instead of marking them (default: false)
    pub clamp: bool,
    /// Value that marks a vertex without data (default: -1)
    pub ignore: f32,
}

impl Default for ValueNormalizationConfig {
    fn default() -> Self {
        Self {
            epsilon: 0.0,
            clamp: false,
            ignore: -1.0,
        }
    }
}

impl ValueNormalizationConfig {
    pub fn with_epsilon(mut self, epsilon: f32) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_clamp(mut self, clamp: bool) -> Self {
        self.clamp = clamp;
        self
    }

    pub fn with_ignore(mut self, ignore: f32) -> Self {
        self.ignore = ignore;
        self
    }

    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.epsilon) {
            return Err(Error::Precondition(format!(
                "epsilon must lie in [0, 1], got {}",
                self.epsilon
            )));
        }
        Ok(())
    }
}

/// Inclusive value interval mapped onto [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueRange {
    pub min: f32,
    pub max: f32,
}

impl ValueRange {
    fn map(&self, value: f32) -> f32 {
        let span = self.max - self.min;
        if span > 0.0 {
            (value - self.min) / span
        } else {
            0.0
        }
    }
}

/// Summary of a [`normalize_values`] run
#[derive(Debug, Clone, PartialEq)]
pub struct ValueNormalizationReport {
    pub range: ValueRange,
    pub normalized: usize,
    pub outliers: usize,
    pub ignored: usize,
}

/// Robust range over the values of `references`.
///
/// Values equal to `config.ignore` are skipped. After sorting, `⌊len·ε/2⌋`
/// values are dropped from each end.
pub fn value_range(references: &[&TriangleMesh], config: &ValueNormalizationConfig) -> Result<ValueRange> {
    config.validate()?;

    let mut values = Vec::new();
    for mesh in references {
        let mesh_values = mesh.values.as_ref().ok_or_else(|| {
            Error::InvalidData("reference mesh has no per-vertex values".to_string())
        })?;
        values.extend(
            mesh_values
                .iter()
                .copied()
                .filter(|&v| v != config.ignore && v.is_finite()),
        );
    }

    if values.is_empty() {
        return Err(Error::InvalidData(
            "reference meshes hold no usable values".to_string(),
        ));
    }

    values.sort_unstable_by(f32::total_cmp);
    let cut = (values.len() as f32 * config.epsilon / 2.0).floor() as usize;
    let cut = cut.min((values.len() - 1) / 2);

    let range = ValueRange {
        min: values[cut],
        max: values[values.len() - 1 - cut],
    };
    debug!(
        "Value range [{}, {}] from {} values ({} cut per side)",
        range.min,
        range.max,
        values.len(),
        cut
    );

    Ok(range)
}

/// Rescale the values of `mesh` so `range` maps onto [0, 1].
///
/// Values outside the range are clamped when `config.clamp` is set and
/// replaced by `config.ignore` otherwise. Vertices already holding the
/// ignore value are left alone.
pub fn normalize_values(
    mesh: &mut TriangleMesh,
    range: ValueRange,
    config: &ValueNormalizationConfig,
) -> Result<ValueNormalizationReport> {
    let values = mesh
        .values
        .as_mut()
        .ok_or_else(|| Error::InvalidData("mesh has no per-vertex values".to_string()))?;

    let mut report = ValueNormalizationReport {
        range,
        normalized: 0,
        outliers: 0,
        ignored: 0,
    };

    for value in values.iter_mut() {
        if *value == config.ignore {
            report.ignored += 1;
            continue;
        }

        if (range.min..=range.max).contains(value) {
            *value = range.map(*value);
            report.normalized += 1;
        } else {
            report.outliers += 1;
            *value = match (config.clamp, *value > range.max) {
                (true, true) => 1.0,
                (true, false) => 0.0,
                (false, _) => config.ignore,
            };
        }
    }

    info!(
        "Normalized {} values to [{}, {}], {} outliers",
        report.normalized, range.min, range.max, report.outliers
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proxymesh_core::Point3f;

    fn mesh_with_values(values: &[f32]) -> TriangleMesh {
        let mut mesh = TriangleMesh::from_points(vec![Point3f::origin(); values.len()]);
        mesh.set_values(values.to_vec()).unwrap();
        mesh
    }

    #[test]
    fn test_range_without_epsilon() {
        let mesh = mesh_with_values(&[3.0, -1.0, 1.0, 2.0]);
        let range = value_range(&[&mesh], &ValueNormalizationConfig::default()).unwrap();
        assert_eq!(range, ValueRange { min: 1.0, max: 3.0 });
    }

    #[test]
    fn test_range_cuts_outliers() {
        let values: Vec<f32> = (0..10).map(|i| i as f32).collect();
        let mesh = mesh_with_values(&values);
        let config = ValueNormalizationConfig::default().with_epsilon(0.4);

        // ⌊10 · 0.4 / 2⌋ = 2 per side
        let range = value_range(&[&mesh], &config).unwrap();
        assert_eq!(range, ValueRange { min: 2.0, max: 7.0 });
    }

    #[test]
    fn test_range_over_several_meshes() {
        let a = mesh_with_values(&[5.0]);
        let b = mesh_with_values(&[-2.0, 9.0]);
        let range = value_range(&[&a, &b], &ValueNormalizationConfig::default()).unwrap();
        assert_eq!(range, ValueRange { min: -2.0, max: 9.0 });
    }

    #[test]
    fn test_range_errors() {
        let config = ValueNormalizationConfig::default();
        let no_values = TriangleMesh::from_points(vec![Point3f::origin()]);
        assert!(value_range(&[&no_values], &config).is_err());

        let only_ignored = mesh_with_values(&[-1.0, -1.0]);
        assert!(value_range(&[&only_ignored], &config).is_err());

        let mesh = mesh_with_values(&[1.0]);
        assert!(value_range(&[&mesh], &config.clone().with_epsilon(1.5)).is_err());
    }

    #[test]
    fn test_outliers_marked_as_ignored() {
        let mut mesh = mesh_with_values(&[0.0, 5.0, 10.0, 20.0, -1.0]);
        let range = ValueRange { min: 0.0, max: 10.0 };

        let report =
            normalize_values(&mut mesh, range, &ValueNormalizationConfig::default()).unwrap();
        let values = mesh.values.unwrap();

        assert_relative_eq!(values[1], 0.5);
        assert_eq!(values[0], 0.0);
        assert_eq!(values[2], 1.0);
        assert_eq!(values[3], -1.0);
        assert_eq!(values[4], -1.0);
        assert_eq!(report.outliers, 1);
        assert_eq!(report.ignored, 1);
        assert_eq!(report.normalized, 3);
    }

    #[test]
    fn test_outliers_clamped() {
        let mut mesh = mesh_with_values(&[-5.0, 15.0, 2.5]);
        let range = ValueRange { min: 0.0, max: 10.0 };
        let config = ValueNormalizationConfig::default().with_clamp(true);

        let report = normalize_values(&mut mesh, range, &config).unwrap();
        assert_eq!(mesh.values.unwrap(), vec![0.0, 1.0, 0.25]);
        assert_eq!(report.outliers, 2);
    }

    #[test]
    fn test_constant_values_map_to_zero() {
        let mut mesh = mesh_with_values(&[4.0, 4.0]);
        let config = ValueNormalizationConfig::default();
        let range = value_range(&[&mesh], &config).unwrap();

        normalize_values(&mut mesh, range, &config).unwrap();
        assert_eq!(mesh.values.unwrap(), vec![0.0, 0.0]);
    }
}
