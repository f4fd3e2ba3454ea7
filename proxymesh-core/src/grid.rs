//! Dense height rasters
//!
//! A [`HeightGrid`] stores one `f32` height per cell in row-major order.
//! Cells without data hold [`SENTINEL`], the most negative finite `f32`, so
//! that a sentinel sorts below every real height.
//!
//! Filtering passes keep the outermost row and column at [`SENTINEL`]; they
//! only exist to bound 3×3 neighbor lookups.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Marker for a cell without data
pub const SENTINEL: f32 = f32::MIN;

/// Largest raster accepted, in cells (1 GiB of heights)
pub const MAX_GRID_CELLS: usize = 1 << 28;

/// Number of cells of a `width` × `height` raster, `None` when the product
/// overflows or exceeds [`MAX_GRID_CELLS`]
pub fn grid_cell_count(width: usize, height: usize) -> Option<usize> {
    width
        .checked_mul(height)
        .filter(|&cells| cells <= MAX_GRID_CELLS)
}

/// True if `value` is the no-data marker
#[inline]
pub fn is_sentinel(value: f32) -> bool {
    value == SENTINEL
}

/// A width × height raster of heights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeightGrid {
    width: usize,
    height: usize,
    data: Vec<f32>,
}

impl HeightGrid {
    /// Create a grid with every cell set to [`SENTINEL`]
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, SENTINEL)
    }

    /// Create a grid with every cell set to `value`
    pub fn filled(width: usize, height: usize, value: f32) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    /// Wrap row-major data
    pub fn from_vec(width: usize, height: usize, data: Vec<f32>) -> Result<Self> {
        if width.checked_mul(height) != Some(data.len()) {
            return Err(Error::InvalidData(format!(
                "{} values cannot fill a {}x{} grid",
                data.len(),
                width,
                height
            )));
        }
        Ok(Self { width, height, data })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of cells
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[self.index(x, y)]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: f32) {
        let index = self.index(x, y);
        self.data[index] = value;
    }

    #[inline]
    pub fn is_valid(&self, x: usize, y: usize) -> bool {
        !is_sentinel(self.get(x, y))
    }

    /// True for cells in the outermost row or column
    #[inline]
    pub fn is_border(&self, x: usize, y: usize) -> bool {
        x == 0 || y == 0 || x + 1 >= self.width || y + 1 >= self.height
    }

    /// 3×3 neighborhood of an interior cell as `patch[1 + dx][1 + dy]`.
    ///
    /// The first index runs along x, so `patch[0][1]` is the left neighbor
    /// and `patch[1][2]` the neighbor at `y + 1`.
    pub fn patch(&self, x: usize, y: usize) -> [[f32; 3]; 3] {
        debug_assert!(!self.is_border(x, y));
        let mut patch = [[0.0; 3]; 3];
        for (i, column) in patch.iter_mut().enumerate() {
            for (j, value) in column.iter_mut().enumerate() {
                *value = self.get(x + i - 1, y + j - 1);
            }
        }
        patch
    }

    /// The nine values of [`HeightGrid::patch`] flattened
    pub fn neighborhood(&self, x: usize, y: usize) -> [f32; 9] {
        let patch = self.patch(x, y);
        let mut values = [0.0; 9];
        for (i, column) in patch.iter().enumerate() {
            values[i * 3..i * 3 + 3].copy_from_slice(column);
        }
        values
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }

    /// Number of cells holding real data
    pub fn valid_count(&self) -> usize {
        self.data.iter().filter(|&&v| !is_sentinel(v)).count()
    }

    /// Number of interior cells still holding [`SENTINEL`]
    pub fn interior_hole_count(&self) -> usize {
        (1..self.height.saturating_sub(1))
            .flat_map(|y| (1..self.width.saturating_sub(1)).map(move |x| (x, y)))
            .filter(|&(x, y)| !self.is_valid(x, y))
            .count()
    }

    /// Smallest non-sentinel height
    pub fn min_valid(&self) -> Option<f32> {
        self.data
            .iter()
            .copied()
            .filter(|&v| !is_sentinel(v))
            .reduce(f32::min)
    }
}
