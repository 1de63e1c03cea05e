//! Concurrency helper: run independent work units on a fixed-size pool.

use anyhow::{Context, Result};
use rayon::prelude::*;

/// Run `f` once per unit. With `workers <= 1` units run in order on the calling
/// thread; otherwise on a dedicated pool of exactly `workers` threads, one task
/// per unit. The first `Err` stops new units from starting and is returned.
pub fn for_each_unit_limited<U, F>(units: &[U], workers: usize, f: F) -> Result<()>
where
    U: Sync,
    F: Sync + Fn(&U) -> Result<()>,
{
    if workers <= 1 {
        for unit in units {
            f(unit)?;
        }
        return Ok(());
    }
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("threadscrape-worker-{}", i))
        .build()
        .context("build worker pool")?;
    pool.install(|| {
        units
            .par_iter()
            .with_max_len(1)
            .try_for_each(|unit| f(unit))
    })
}
