//! Discontinuity-aware resampling of a height field
//!
//! A height field cannot represent vertical surfaces. For every cell whose
//! steepest one-sided drop exceeds one resolution unit, this stage emits a
//! column of wall samples walking down from the surface in resolution-sized
//! steps, oriented along the horizontal gradient. Flat cells emit a single
//! upward-facing sample.
//!
//! Rows are processed in parallel. Each row fills a local buffer that is
//! merged under a lock once the row is done; the merged buffers are ordered
//! by row afterwards so the result does not depend on scheduling.

use crate::ground::HeightField;
use crate::parallel::for_each_index;
use crate::rasterize::{cell_to_world, check_resolution};
use proxymesh_core::{BoundingBox, NearestNeighborSearch, Point3f, Result, Sample, SampleSet, Vector3f};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, info};

/// Whether synthesized samples are fused with the original cloud
pub enum FuseMode<'a, S: ?Sized> {
    /// Emit samples for every cell
    Off,
    /// Skip flat cells and wall samples already covered by the indexed cloud
    Fuse(&'a S),
}

impl<S: ?Sized> Clone for FuseMode<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: ?Sized> Copy for FuseMode<'_, S> {}

impl<S: ?Sized> FuseMode<'_, S> {
    pub fn is_fused(&self) -> bool {
        matches!(self, FuseMode::Fuse(_))
    }
}

/// Local differential geometry of one cell's 3×3 patch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellGradient {
    /// Backward differences, center minus the `-x` / `-y` neighbor
    pub rdx: f32,
    pub rdy: f32,
    /// Forward differences, the `+x` / `+y` neighbor minus center
    pub fdx: f32,
    pub fdy: f32,
    /// Sobel gradient over the full patch
    pub gx: f32,
    pub gy: f32,
}

impl CellGradient {
    /// Differences of a patch indexed as `patch[1 + dx][1 + dy]`
    pub fn from_patch(h: &[[f32; 3]; 3]) -> Self {
        let rdx = h[1][1] - h[0][1];
        let rdy = h[1][1] - h[1][0];
        let fdx = h[2][1] - h[1][1];
        let fdy = h[1][2] - h[1][1];

        let gx = -h[0][0] + h[2][0] + 2.0 * (-h[0][1] + h[2][1]) - h[0][2] + h[2][2];
        let gy = -h[0][0] + h[0][2] + 2.0 * (-h[1][0] + h[1][2]) - h[2][0] + h[2][2];

        Self { rdx, rdy, fdx, fdy, gx, gy }
    }

    /// Steepest drop from the center towards any axis neighbor
    pub fn magnitude(&self) -> f32 {
        self.rdx.max(-self.fdx).max(self.rdy.max(-self.fdy))
    }

    /// Center lies in a pit along both axes
    pub fn is_concave(&self) -> bool {
        self.fdx > 0.0 && self.rdx < 0.0 && self.fdy > 0.0 && self.rdy < 0.0
    }

    /// Horizontal unit vector pointing downhill, `None` on a zero gradient
    pub fn wall_normal(&self) -> Option<Vector3f> {
        Vector3f::new(-self.gx, -self.gy, 0.0).try_normalize(f32::EPSILON)
    }

    /// Axis direction of the steepest one-sided drop; ties keep the first of
    /// `-x`, `+x`, `-y`, `+y`
    pub fn steepest_drop(&self) -> Vector3f {
        let candidates = [
            (self.rdx, -Vector3f::x()),
            (-self.fdx, Vector3f::x()),
            (self.rdy, -Vector3f::y()),
            (-self.fdy, Vector3f::y()),
        ];
        candidates
            .into_iter()
            .fold(candidates[0], |best, c| if c.0 > best.0 { c } else { best })
            .1
    }

    /// Wall orientation: the Sobel normal, or the steepest drop where the
    /// Sobel gradient cancels out (isolated pillars)
    pub fn wall_direction(&self) -> Vector3f {
        self.wall_normal().unwrap_or_else(|| self.steepest_drop())
    }
}

/// Counters collected while resampling
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResampleStats {
    pub flat_samples: usize,
    pub flat_skipped: usize,
    pub surface_samples: usize,
    pub wall_samples: usize,
    pub wall_suppressed_fused: usize,
    pub wall_suppressed_concave: usize,
    /// Discontinuous cells oriented by their steepest drop
    pub axis_oriented_cells: usize,
}

impl ResampleStats {
    fn merge(&mut self, other: &Self) {
        self.flat_samples += other.flat_samples;
        self.flat_skipped += other.flat_skipped;
        self.surface_samples += other.surface_samples;
        self.wall_samples += other.wall_samples;
        self.wall_suppressed_fused += other.wall_suppressed_fused;
        self.wall_suppressed_concave += other.wall_suppressed_concave;
        self.axis_oriented_cells += other.axis_oriented_cells;
    }
}

/// Samples produced by [`resample_discontinuities`]
#[derive(Debug, Clone, Default)]
pub struct ResampleOutput {
    pub samples: SampleSet,
    pub stats: ResampleStats,
}

struct CellContext<'a, S: ?Sized> {
    field: &'a HeightField,
    resolution: f32,
    fuse: FuseMode<'a, S>,
}

impl<S: NearestNeighborSearch + ?Sized> CellContext<'_, S> {
    fn emit(
        &self,
        x: usize,
        y: usize,
        position_xy: (f32, f32),
        out: &mut Vec<Sample>,
        stats: &mut ResampleStats,
    ) {
        let r = self.resolution;
        let patch = self.field.grid.patch(x, y);
        let gradient = CellGradient::from_patch(&patch);
        let m = gradient.magnitude();

        let (px, py) = position_xy;
        let surface = self.field.ground_level + patch[1][1];
        let up = Vector3f::z();

        if m <= r {
            if self.fuse.is_fused() {
                stats.flat_skipped += 1;
            } else {
                out.push(Sample::new(Point3f::new(px, py, surface), up).with_scale(r));
                stats.flat_samples += 1;
            }
            return;
        }

        if gradient.wall_normal().is_none() {
            stats.axis_oriented_cells += 1;
        }
        let wall_normal = gradient.wall_direction();
        let surface_normal = (up + wall_normal).try_normalize(f32::EPSILON).unwrap_or(up);
        out.push(Sample::new(Point3f::new(px, py, surface), surface_normal).with_scale(r));
        stats.surface_samples += 1;

        let steps = (m / r).floor() as usize;

        let concave = gradient.is_concave();
        for i in 1..=steps {
            let vertex = Point3f::new(px, py, surface - i as f32 * r);

            if let FuseMode::Fuse(index) = self.fuse {
                if index.has_neighbor_within(&vertex, r) {
                    stats.wall_suppressed_fused += 1;
                    continue;
                }
            }

            if concave {
                stats.wall_suppressed_concave += 1;
                continue;
            }

            out.push(Sample::new(vertex, wall_normal).with_scale(r));
            stats.wall_samples += 1;
        }
    }
}

/// Synthesize oriented samples from a ground-normalized height field.
///
/// Cells within two cells of the grid border are skipped. `bbox` must be the
/// box the field was rasterized with, so cell positions map back to world
/// space consistently.
pub fn resample_discontinuities<S>(
    field: &HeightField,
    bbox: &BoundingBox,
    resolution: f32,
    fuse: FuseMode<'_, S>,
) -> Result<ResampleOutput>
where
    S: NearestNeighborSearch + Sync + ?Sized,
{
    check_resolution(resolution)?;

    let width = field.grid.width();
    let height = field.grid.height();
    if width < 5 || height < 5 {
        debug!("Height map {}x{} has no cell to resample", width, height);
        return Ok(ResampleOutput::default());
    }

    let context = CellContext {
        field,
        resolution,
        fuse,
    };
    let rows: Mutex<Vec<(usize, Vec<Sample>, ResampleStats)>> = Mutex::new(Vec::new());

    for_each_index(2..height - 2, |y| {
        let mut local = Vec::new();
        let mut stats = ResampleStats::default();
        let py = cell_to_world(y, bbox.min.y, resolution);

        for x in 2..width - 2 {
            let px = cell_to_world(x, bbox.min.x, resolution);
            context.emit(x, y, (px, py), &mut local, &mut stats);
        }

        rows.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((y, local, stats));
    });

    let mut rows = rows.into_inner().unwrap_or_else(PoisonError::into_inner);
    rows.sort_unstable_by_key(|(y, _, _)| *y);

    let mut output = ResampleOutput::default();
    for (_, samples, stats) in rows {
        output.samples.extend(samples);
        output.stats.merge(&stats);
    }

    info!(
        "Generated {} samples ({} flat, {} surface, {} wall)",
        output.samples.len(),
        output.stats.flat_samples,
        output.stats.surface_samples,
        output.stats.wall_samples
    );
    debug!("Resampling statistics: {:?}", output.stats);

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nearest_neighbor::BruteForceSearch;
    use approx::assert_relative_eq;
    use proxymesh_core::HeightGrid;

    const NO_INDEX: FuseMode<'static, BruteForceSearch> = FuseMode::Off;

    fn field(width: usize, height: usize, f: impl Fn(usize, usize) -> f32) -> HeightField {
        let mut grid = HeightGrid::filled(width, height, 0.0);
        for y in 0..height {
            for x in 0..width {
                grid.set(x, y, f(x, y));
            }
        }
        HeightField {
            grid,
            ground_level: 10.0,
        }
    }

    fn bbox() -> BoundingBox {
        BoundingBox::new(Point3f::new(100.0, 200.0, 0.0), Point3f::new(110.0, 210.0, 5.0))
    }

    #[test]
    fn test_gradient_of_step() {
        // Center on the high side of a step falling towards +x
        let patch = [[3.0, 3.0, 3.0], [3.0, 3.0, 3.0], [0.0, 0.0, 0.0]];
        let g = CellGradient::from_patch(&patch);

        assert_eq!(g.rdx, 0.0);
        assert_eq!(g.fdx, -3.0);
        assert_eq!(g.magnitude(), 3.0);
        assert_eq!(g.gx, -12.0);
        assert_eq!(g.gy, 0.0);
        assert_eq!(g.wall_normal(), Some(Vector3f::new(1.0, 0.0, 0.0)));
        assert!(!g.is_concave());
    }

    #[test]
    fn test_bowl_is_concave_and_flat() {
        let patch = [[5.0, 5.0, 5.0], [5.0, 0.0, 5.0], [5.0, 5.0, 5.0]];
        let g = CellGradient::from_patch(&patch);

        assert!(g.is_concave());
        assert!(g.magnitude() < 0.0);
        assert!(g.wall_normal().is_none());
    }

    #[test]
    fn test_flat_patch_emits_one_upward_sample() {
        let field = field(5, 5, |_, _| 2.0);
        let output = resample_discontinuities(&field, &bbox(), 1.0, NO_INDEX).unwrap();

        assert_eq!(output.samples.len(), 1);
        let sample = output.samples[0];
        assert_eq!(sample.normal, Vector3f::z());
        assert_eq!(sample.scale, 1.0);
        assert_relative_eq!(sample.position.z, 12.0);
        // (2 - 0.5) * 1 + min
        assert_relative_eq!(sample.position.x, 101.5);
        assert_relative_eq!(sample.position.y, 201.5);
    }

    #[test]
    fn test_flat_patch_skipped_when_fused() {
        let field = field(5, 5, |_, _| 2.0);
        let index = BruteForceSearch::new(&[]);
        let output =
            resample_discontinuities(&field, &bbox(), 1.0, FuseMode::Fuse(&index)).unwrap();

        assert!(output.samples.is_empty());
        assert_eq!(output.stats.flat_skipped, 1);
    }

    #[test]
    fn test_step_emits_wall_column() {
        let r = 0.5;
        let k = 3;
        // Cells x <= 2 sit k * r above the rest
        let field = field(5, 5, |x, _| if x <= 2 { k as f32 * r } else { 0.0 });
        let output = resample_discontinuities(&field, &bbox(), r, NO_INDEX).unwrap();

        assert_eq!(output.stats.surface_samples, 1);
        assert_eq!(output.stats.wall_samples, k);
        assert_eq!(output.samples.len(), k + 1);

        let surface = output.samples[0];
        assert_relative_eq!(surface.position.z, 10.0 + k as f32 * r);
        let expected = Vector3f::new(1.0, 0.0, 1.0).normalize();
        assert_relative_eq!(surface.normal.x, expected.x, epsilon = 1e-6);
        assert_relative_eq!(surface.normal.z, expected.z, epsilon = 1e-6);

        for (i, wall) in output.samples.iter().skip(1).enumerate() {
            assert_eq!(wall.normal, Vector3f::new(1.0, 0.0, 0.0));
            assert_eq!(wall.position.x, surface.position.x);
            assert_eq!(wall.position.y, surface.position.y);
            assert_relative_eq!(
                wall.position.z,
                surface.position.z - (i + 1) as f32 * r,
                epsilon = 1e-5
            );
        }
    }

    #[test]
    fn test_drop_of_exactly_one_unit_is_flat() {
        let field = field(5, 5, |x, _| if x <= 2 { 1.0 } else { 0.0 });
        let output = resample_discontinuities(&field, &bbox(), 1.0, NO_INDEX).unwrap();

        assert_eq!(output.samples.len(), 1);
        assert_eq!(output.stats.flat_samples, 1);
    }

    #[test]
    fn test_pit_emits_no_wall_samples() {
        let field = field(5, 5, |x, y| if (x, y) == (2, 2) { 0.0 } else { 4.0 });
        let output = resample_discontinuities(&field, &bbox(), 1.0, NO_INDEX).unwrap();

        assert_eq!(output.stats.wall_samples, 0);
        assert_eq!(output.samples.len(), 1);
        assert_eq!(output.samples[0].normal, Vector3f::z());
    }

    #[test]
    fn test_fused_walls_skip_covered_heights() {
        let r = 1.0;
        let field = field(5, 5, |x, _| if x <= 2 { 4.0 } else { 0.0 });
        let px = cell_to_world(2, bbox().min.x, r);
        let py = cell_to_world(2, bbox().min.y, r);
        // Original scan already covers the top half of the wall
        let index = BruteForceSearch::new(&[
            Point3f::new(px, py, 13.0),
            Point3f::new(px, py, 12.0),
        ]);

        let output = resample_discontinuities(&field, &bbox(), r, FuseMode::Fuse(&index)).unwrap();

        // Wall heights 13, 12, 11, 10; 11 is within r of the point at 12
        assert_eq!(output.stats.wall_suppressed_fused, 3);
        assert_eq!(output.stats.wall_samples, 1);
        assert_relative_eq!(output.samples[1].position.z, 10.0);
    }

    #[test]
    fn test_steepest_drop_picks_largest_difference() {
        // Center 2 above its -y neighbor, 1 above the others
        let patch = [[1.0, 1.0, 1.0], [0.0, 2.0, 1.0], [1.0, 1.0, 1.0]];
        let g = CellGradient::from_patch(&patch);
        assert_eq!(g.steepest_drop(), -Vector3f::y());

        let spike = [[0.0, 0.0, 0.0], [0.0, 3.0, 0.0], [0.0, 0.0, 0.0]];
        assert_eq!(CellGradient::from_patch(&spike).steepest_drop(), -Vector3f::x());
    }

    #[test]
    fn test_pillar_keeps_its_wall_column() {
        let field = field(5, 5, |x, y| if (x, y) == (2, 2) { 3.0 } else { 0.0 });
        let output = resample_discontinuities(&field, &bbox(), 1.0, NO_INDEX).unwrap();

        assert_eq!(output.stats.surface_samples, 1);
        assert_eq!(output.stats.axis_oriented_cells, 1);
        assert_eq!(output.stats.wall_samples, 3);
        assert_eq!(output.samples.len(), 4);

        let expected = Vector3f::new(-1.0, 0.0, 1.0).normalize();
        assert_relative_eq!(output.samples[0].normal.x, expected.x, epsilon = 1e-6);
        assert_relative_eq!(output.samples[0].normal.z, expected.z, epsilon = 1e-6);
        for wall in output.samples.iter().skip(1) {
            assert_eq!(wall.normal, -Vector3f::x());
        }
        assert_relative_eq!(output.samples[3].position.z, 10.0);
    }

    #[test]
    fn test_border_band_is_skipped() {
        let narrow = field(4, 9, |_, _| 1.0);
        let output = resample_discontinuities(&narrow, &bbox(), 1.0, NO_INDEX).unwrap();
        assert!(output.samples.is_empty());

        let wide = field(7, 6, |_, _| 1.0);
        let output = resample_discontinuities(&wide, &bbox(), 1.0, NO_INDEX).unwrap();
        // x in 2..5, y in 2..4
        assert_eq!(output.samples.len(), 6);
    }

    #[test]
    fn test_output_is_ordered_by_row() {
        let field = field(9, 12, |x, y| (x + y) as f32 * 0.1);
        let output = resample_discontinuities(&field, &bbox(), 1.0, NO_INDEX).unwrap();

        let ys: Vec<f32> = output.samples.iter().map(|s| s.position.y).collect();
        assert!(ys.windows(2).all(|w| w[0] <= w[1]));
    }
}
