//! Scattered points to height raster
//!
//! Binning uses a centering bias of `resolution / 2` *grid cells* before
//! rounding, `⌊(p - min) / r + r / 2 + 0.5⌋`. [`cell_to_world`] applies the
//! inverse mapping so synthesized samples land on the raster they came from;
//! both sides must change together.

use proxymesh_core::{grid_cell_count, BoundingBox, Error, HeightGrid, Point3f, Result, MAX_GRID_CELLS};
use tracing::{debug, info};

/// Grid bin of coordinate `value` along one axis
#[inline]
pub fn world_to_cell(value: f32, origin: f32, resolution: f32) -> i64 {
    ((value - origin) / resolution + resolution / 2.0 + 0.5).floor() as i64
}

/// World coordinate of grid bin `cell` along one axis
#[inline]
pub fn cell_to_world(cell: usize, origin: f32, resolution: f32) -> f32 {
    (cell as f32 - resolution / 2.0) * resolution + origin
}

pub(crate) fn check_resolution(resolution: f32) -> Result<()> {
    if !(resolution.is_finite() && resolution > 0.0) {
        return Err(Error::Precondition(format!(
            "resolution must be positive and finite, got {}",
            resolution
        )));
    }
    Ok(())
}

/// Grid size for `bbox` at `resolution`.
///
/// The nominal size is `⌈extent / r⌉ + 1` per axis. Because of the centering
/// bias the bin of the maximum coordinate can lie past that, so the size is
/// grown until that bin fits. Rasters above [`MAX_GRID_CELLS`] cells are a
/// precondition error.
pub fn grid_dimensions(bbox: &BoundingBox, resolution: f32) -> Result<(usize, usize)> {
    check_resolution(resolution)?;

    let too_large = || {
        Error::Precondition(format!(
            "resolution {} is too fine for a {:.3}x{:.3} extent (limit {} cells)",
            resolution,
            bbox.max.x - bbox.min.x,
            bbox.max.y - bbox.min.y,
            MAX_GRID_CELLS
        ))
    };
    let axis = |min: f32, max: f32| {
        let nominal = ((max - min) / resolution).ceil();
        // Same expression as `world_to_cell(max, min, resolution)`
        let last_bin = ((max - min) / resolution + resolution / 2.0 + 0.5).floor();
        let cells = nominal.max(last_bin) + 1.0;
        if !(cells.is_finite() && cells <= MAX_GRID_CELLS as f32) {
            return Err(too_large());
        }
        Ok((cells as usize).max(1))
    };

    let width = axis(bbox.min.x, bbox.max.x)?;
    let height = axis(bbox.min.y, bbox.max.y)?;
    grid_cell_count(width, height).ok_or_else(too_large)?;
    Ok((width, height))
}

/// Bin `points` into a [`HeightGrid`] keeping the highest z per cell.
///
/// Cells that receive no point stay at the sentinel. Points whose bin falls
/// outside the grid (only possible when `bbox` does not enclose them) are
/// skipped.
pub fn rasterize(points: &[Point3f], bbox: &BoundingBox, resolution: f32) -> Result<HeightGrid> {
    let (width, height) = grid_dimensions(bbox, resolution)?;
    info!("Creating height map ({}x{})", width, height);

    let mut grid = HeightGrid::new(width, height);
    let mut skipped = 0usize;

    for point in points {
        let x = world_to_cell(point.x, bbox.min.x, resolution);
        let y = world_to_cell(point.y, bbox.min.y, resolution);
        if x < 0 || y < 0 || x as usize >= width || y as usize >= height {
            skipped += 1;
            continue;
        }

        let (x, y) = (x as usize, y as usize);
        if grid.get(x, y) < point.z {
            grid.set(x, y, point.z);
        }
    }

    if skipped > 0 {
        debug!("Skipped {} points outside the raster", skipped);
    }
    debug!(
        "Rasterized {} points into {} occupied cells",
        points.len() - skipped,
        grid.valid_count()
    );

    Ok(grid)
}
