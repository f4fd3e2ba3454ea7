//! Ground-relative height normalization

use crate::parallel::{execute_parallel, for_each_row, is_parallel_enabled};
use proxymesh_core::{is_sentinel, Error, HeightGrid, Result};
use rayon::prelude::*;
use tracing::info;

/// A height raster relative to its lowest valid cell
#[derive(Debug, Clone, PartialEq)]
pub struct HeightField {
    /// Heights above `ground_level`; cells that never received data read 0
    pub grid: HeightGrid,
    /// Absolute height subtracted from every valid cell
    pub ground_level: f32,
}

impl HeightField {
    /// Absolute elevation of cell `(x, y)`
    pub fn absolute_height(&self, x: usize, y: usize) -> f32 {
        self.grid.get(x, y) + self.ground_level
    }
}

fn lowest_valid(grid: &HeightGrid) -> Option<f32> {
    if !is_parallel_enabled() {
        return grid.min_valid();
    }

    execute_parallel(|| {
        grid.data()
            .par_iter()
            .copied()
            .filter(|&v| !is_sentinel(v))
            .min_by(f32::total_cmp)
    })
}

/// Subtract the global minimum valid height from every valid cell and reset
/// remaining sentinels to 0.
///
/// Fails when the grid holds no valid cell at all.
pub fn normalize_ground(grid: &HeightGrid) -> Result<HeightField> {
    let ground_level = lowest_valid(grid).ok_or_else(|| {
        Error::InvalidData("height map holds no valid cell to estimate ground level".to_string())
    })?;

    let mut output = HeightGrid::filled(grid.width(), grid.height(), 0.0);
    let width = grid.width();
    for_each_row(&mut output, |y, row| {
        let input = &grid.data()[y * width..(y + 1) * width];
        for (cell, &height) in row.iter_mut().zip(input) {
            *cell = if is_sentinel(height) {
                0.0
            } else {
                height - ground_level
            };
        }
    });

    info!("Ground level at {}", ground_level);

    Ok(HeightField {
        grid: output,
        ground_level,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proxymesh_core::SENTINEL;

    #[test]
    fn test_normalize_subtracts_ground() {
        let mut grid = HeightGrid::new(4, 3);
        grid.set(1, 1, 7.0);
        grid.set(2, 1, 5.0);
        grid.set(3, 2, 9.0);

        let field = normalize_ground(&grid).unwrap();

        assert_eq!(field.ground_level, 5.0);
        assert_eq!(field.grid.get(1, 1), 2.0);
        assert_eq!(field.grid.get(2, 1), 0.0);
        assert_eq!(field.grid.get(3, 2), 4.0);
        assert_eq!(field.grid.get(0, 0), 0.0);
        assert_eq!(field.grid.get(3, 0), 0.0);
        assert_eq!(field.absolute_height(3, 2), 9.0);
        assert!(field.grid.data().iter().all(|&v| v != SENTINEL));
    }

    #[test]
    fn test_normalize_negative_heights() {
        let grid = HeightGrid::from_vec(2, 1, vec![-3.0, -1.0]).unwrap();
        let field = normalize_ground(&grid).unwrap();
        assert_eq!(field.ground_level, -3.0);
        assert_eq!(field.grid.data(), &[0.0, 2.0]);
    }

    #[test]
    fn test_normalize_empty_grid_fails() {
        assert!(normalize_ground(&HeightGrid::new(3, 3)).is_err());
    }
}
