//! Height raster filtering
//!
//! Both filters are double-buffered: each pass reads the input grid and
//! writes a new one, and the border ring of the output is always the
//! sentinel.

use crate::parallel::for_each_row;
use proxymesh_core::{is_sentinel, HeightGrid, SENTINEL};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tracing::{debug, info, warn};

/// Single 3×3 median pass for spike removal.
///
/// Sentinels take part in the sort like any other value, so an interior cell
/// with five or more empty neighbors becomes empty itself. Hole-aware filling
/// is left to [`fill_holes`].
pub fn median_denoise(grid: &HeightGrid) -> HeightGrid {
    let mut output = HeightGrid::new(grid.width(), grid.height());

    for_each_row(&mut output, |y, row| {
        for (x, cell) in row.iter_mut().enumerate() {
            *cell = if grid.is_border(x, y) {
                SENTINEL
            } else {
                let mut heights = grid.neighborhood(x, y);
                heights.sort_unstable_by(f32::total_cmp);
                heights[4]
            };
        }
    });

    output
}

/// Parameters of the hole-filling loop
#[derive(Debug, Clone)]
pub struct FillConfig {
    /// Minimum number of valid neighbors needed to fill a cell (default: 3)
    pub min_neighbors: usize,
    /// Upper bound on the number of passes (default: 10000)
    pub max_iterations: usize,
}

impl Default for FillConfig {
    fn default() -> Self {
        Self {
            min_neighbors: 3,
            max_iterations: 10_000,
        }
    }
}

impl FillConfig {
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }
}

/// Why the fill loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillOutcome {
    /// No interior cell is empty
    Converged,
    /// A pass filled nothing; every later pass would be identical
    Stalled,
    /// `max_iterations` passes ran without converging
    IterationCap,
}

/// Summary of a [`fill_holes`] run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FillReport {
    pub iterations: usize,
    pub filled: usize,
    pub remaining_holes: usize,
    pub outcome: FillOutcome,
}

impl FillReport {
    pub fn converged(&self) -> bool {
        self.outcome == FillOutcome::Converged
    }
}

struct PassStats {
    filled: usize,
    holes: bool,
}

/// One inpainting pass: every empty interior cell with at least
/// `min_neighbors` valid neighbors takes the (upper) median of those
/// neighbors.
fn fill_pass(grid: &HeightGrid, min_neighbors: usize) -> (HeightGrid, PassStats) {
    let mut output = HeightGrid::new(grid.width(), grid.height());
    let holes = AtomicBool::new(false);
    let filled = AtomicUsize::new(0);

    for_each_row(&mut output, |y, row| {
        let mut row_filled = 0;
        for (x, cell) in row.iter_mut().enumerate() {
            if grid.is_border(x, y) {
                *cell = SENTINEL;
                continue;
            }

            let current = grid.get(x, y);
            if !is_sentinel(current) {
                *cell = current;
                continue;
            }

            let mut heights = grid.neighborhood(x, y);
            let mut n = 0;
            for i in 0..heights.len() {
                if !is_sentinel(heights[i]) {
                    heights[n] = heights[i];
                    n += 1;
                }
            }

            if n >= min_neighbors && n > 0 {
                let valid = &mut heights[..n];
                valid.sort_unstable_by(f32::total_cmp);
                *cell = valid[n / 2];
                row_filled += 1;
            } else {
                *cell = SENTINEL;
                holes.store(true, Ordering::Relaxed);
            }
        }
        if row_filled > 0 {
            filled.fetch_add(row_filled, Ordering::Relaxed);
        }
    });

    let stats = PassStats {
        filled: filled.into_inner(),
        holes: holes.into_inner(),
    };
    (output, stats)
}

/// Iteratively inpaint empty interior cells.
///
/// Stops once a pass leaves no hole behind. Holes that can never gather
/// enough valid neighbors (for instance cells boxed in by the border ring)
/// stop the loop as soon as a pass makes no progress, and `max_iterations`
/// bounds the loop regardless. Both cases are logged and reported; the
/// remaining cells stay at the sentinel.
pub fn fill_holes(grid: HeightGrid, config: &FillConfig) -> (HeightGrid, FillReport) {
    let mut current = grid;
    let mut iterations = 0;
    let mut filled = 0;

    let outcome = loop {
        if iterations >= config.max_iterations {
            break FillOutcome::IterationCap;
        }

        let (next, stats) = fill_pass(&current, config.min_neighbors);
        current = next;
        iterations += 1;
        filled += stats.filled;
        debug!("Fill pass {} filled {} cells", iterations, stats.filled);

        if !stats.holes {
            break FillOutcome::Converged;
        }
        if stats.filled == 0 {
            break FillOutcome::Stalled;
        }
    };

    let remaining_holes = current.interior_hole_count();
    match outcome {
        FillOutcome::Converged => {
            info!("Filled {} cells in {} passes", filled, iterations)
        }
        FillOutcome::Stalled => warn!(
            "Hole filling stalled after {} passes, {} cells cannot be filled",
            iterations, remaining_holes
        ),
        FillOutcome::IterationCap => warn!(
            "Hole filling stopped at the {} pass limit with {} cells unfilled",
            config.max_iterations, remaining_holes
        ),
    }

    let report = FillReport {
        iterations,
        filled,
        remaining_holes,
        outcome,
    };
    (current, report)
}
