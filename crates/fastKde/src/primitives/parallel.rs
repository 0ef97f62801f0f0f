//! Conditional parallel iteration helpers.
//!
//! These run on rayon when the `cpu` feature is enabled and fall back to
//! sequential iteration otherwise. Output order always matches input order.

#[cfg(feature = "cpu")]
use rayon::prelude::*;

/// Map every index of `range` through `f`, returning results in index order.
#[cfg(feature = "cpu")]
pub fn map_range<R, F>(range: std::ops::Range<usize>, f: F) -> Vec<R>
where
    R: Send,
    F: Fn(usize) -> R + Sync + Send,
{
    range.into_par_iter().map(f).collect()
}

#[cfg(not(feature = "cpu"))]
pub fn map_range<R, F>(range: std::ops::Range<usize>, f: F) -> Vec<R>
where
    F: Fn(usize) -> R,
{
    range.map(f).collect()
}
