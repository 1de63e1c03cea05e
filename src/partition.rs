//! Range partitioning for corpus mode: split one global window into `n`
//! contiguous windows, one per worker.

use crate::date::{Day, TimeWindow};
use anyhow::Result;

/// Split `[start 00:00, end 23:59]` into `n` windows (at least one).
///
/// Boundaries are computed from the global start each time rather than by
/// repeated addition, so rounding never accumulates; the last window ends
/// exactly on the global end. `w[i].end == w[i + 1].start` always holds.
pub fn make_splits(start: Day, end: Day, n: usize) -> Result<Vec<TimeWindow>> {
    let whole = TimeWindow::from_days(start, end)?;
    Ok(split_window(whole, n))
}

/// Same as [`make_splits`] on an already-built window.
pub fn split_window(whole: TimeWindow, n: usize) -> Vec<TimeWindow> {
    let n = n.max(1) as i128;
    let total = whole.duration() as i128;

    let boundary = |i: i128| -> i64 {
        if i >= n {
            whole.end
        } else {
            whole.start + (total * i / n) as i64
        }
    };

    (0..n)
        .map(|i| TimeWindow { start: boundary(i), end: boundary(i + 1) })
        .collect()
}
