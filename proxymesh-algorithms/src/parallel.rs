//! Thread pool management for the row-parallel grid passes
//!
//! Every pass reads one immutable [`HeightGrid`] and writes a fresh one, so
//! rows of the output buffer can be handed to workers without locking.

use proxymesh_core::{Error, HeightGrid, Result};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

static THREAD_POOL: OnceLock<ThreadPool> = OnceLock::new();
static PARALLEL_ENABLED: AtomicBool = AtomicBool::new(true);

/// Thread pool configuration for parallel processing
#[derive(Debug, Clone)]
pub struct ThreadPoolConfig {
    /// Number of threads to use (None = one per logical core)
    pub num_threads: Option<usize>,
    /// Thread name prefix
    pub thread_name_prefix: String,
    /// Enable parallel processing (can be disabled for debugging)
    pub enabled: bool,
}

impl Default for ThreadPoolConfig {
    fn default() -> Self {
        Self {
            num_threads: None,
            thread_name_prefix: "proxymesh".to_string(),
            enabled: true,
        }
    }
}

impl ThreadPoolConfig {
    /// Set number of threads
    pub fn with_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = Some(num_threads);
        self
    }

    /// Enable or disable parallel processing
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Initialize the dedicated thread pool. Later calls only update the
/// enabled flag.
pub fn init_thread_pool(config: &ThreadPoolConfig) -> Result<()> {
    PARALLEL_ENABLED.store(config.enabled, Ordering::Relaxed);

    if THREAD_POOL.get().is_some() {
        return Ok(());
    }

    let mut builder = ThreadPoolBuilder::new();

    if let Some(num_threads) = config.num_threads {
        builder = builder.num_threads(num_threads);
    }

    if !config.thread_name_prefix.is_empty() {
        let prefix = config.thread_name_prefix.clone();
        builder = builder.thread_name(move |index| format!("{}-{}", prefix, index));
    }

    let pool = builder
        .build()
        .map_err(|e| Error::Algorithm(format!("Failed to create thread pool: {}", e)))?;

    // A concurrent initializer may have won the race; its pool is equivalent
    let _ = THREAD_POOL.set(pool);
    Ok(())
}

/// Check if parallel processing is enabled
pub fn is_parallel_enabled() -> bool {
    PARALLEL_ENABLED.load(Ordering::Relaxed)
}

/// Number of worker threads passes will run on
pub fn current_num_threads() -> usize {
    match THREAD_POOL.get() {
        Some(pool) => pool.current_num_threads(),
        None => rayon::current_num_threads(),
    }
}

/// Execute a parallel operation on the configured pool, falling back to the
/// global rayon pool when none was initialized
pub fn execute_parallel<F, R>(op: F) -> R
where
    F: FnOnce() -> R + Send,
    R: Send,
{
    match THREAD_POOL.get() {
        Some(pool) => pool.install(op),
        None => op(),
    }
}

/// Run `f(y, row)` for every row of `grid`, in parallel when enabled
pub fn for_each_row<F>(grid: &mut HeightGrid, f: F)
where
    F: Fn(usize, &mut [f32]) + Sync + Send,
{
    let width = grid.width();
    if width == 0 || grid.is_empty() {
        return;
    }

    if !is_parallel_enabled() {
        grid.data_mut()
            .chunks_mut(width)
            .enumerate()
            .for_each(|(y, row)| f(y, row));
        return;
    }

    execute_parallel(|| {
        grid.data_mut()
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(y, row)| f(y, row))
    });
}

/// Run `f(y)` for every `y` in `rows`, in parallel when enabled
pub fn for_each_index<F>(rows: std::ops::Range<usize>, f: F)
where
    F: Fn(usize) + Sync + Send,
{
    if !is_parallel_enabled() {
        rows.for_each(f);
        return;
    }

    execute_parallel(|| rows.into_par_iter().for_each(f));
}
