//! Evaluation lattice construction.
//!
//! ## Purpose
//!
//! This module builds the regular R×R lattice on which a density model is
//! evaluated. The lattice spans the bounding box of the input cloud exactly,
//! with both corners included.
//!
//! ## Design notes
//!
//! * **Row-major**: Flat index `i` is row `i / R` (y axis) and column `i % R` (x axis).
//! * **Lazy**: `Grid::point` computes lattice points on demand; `lattice` materializes them.
//! * **Exact endpoints**: The last axis value is the bounding-box maximum, not `min + (R-1)·step`.
//!
//! ## Invariants
//!
//! * `len() == resolution²`.
//! * `xs()[0] == min_x`, `xs()[R-1] == max_x` (same for y).
//! * A degenerate axis (min == max) repeats its single value R times.
//!
//! ## Non-goals
//!
//! * This module does not pad the bounding box.
//! * This module does not support non-square resolutions.

// External dependencies
use num_traits::Float;

// Internal dependencies
use crate::primitives::errors::DensityError;
use crate::primitives::geometry::{BoundingBox, Point, PointCloud};

/// Smallest usable resolution (points per axis).
pub const MIN_RESOLUTION: usize = 2;

// ============================================================================
// Grid Builder
// ============================================================================

/// Builds evaluation lattices at a fixed resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridBuilder {
    resolution: usize,
}

impl GridBuilder {
    /// Create a builder producing `resolution` points per axis.
    pub fn new(resolution: usize) -> Self {
        Self { resolution }
    }

    /// Configured points per axis.
    pub fn resolution(&self) -> usize {
        self.resolution
    }

    /// Build the lattice spanning `cloud`'s bounding box.
    pub fn build<T: Float>(&self, cloud: &PointCloud<T>) -> Result<Grid<T>, DensityError> {
        if self.resolution < MIN_RESOLUTION {
            return Err(DensityError::InvalidResolution(self.resolution));
        }
        let bounds = cloud.bounds().ok_or(DensityError::EmptyInput)?;
        Ok(Grid {
            xs: linspace(bounds.min_x, bounds.max_x, self.resolution),
            ys: linspace(bounds.min_y, bounds.max_y, self.resolution),
            bounds,
        })
    }
}

/// `n` evenly spaced values over `[start, end]`, both ends included.
fn linspace<T: Float>(start: T, end: T, n: usize) -> Vec<T> {
    let span = end - start;
    let last = T::from(n - 1).unwrap_or(T::one());
    let mut values: Vec<T> = (0..n)
        .map(|i| start + span * T::from(i).unwrap_or(T::zero()) / last)
        .collect();
    if let Some(tail) = values.last_mut() {
        *tail = end;
    }
    values
}

// ============================================================================
// Grid
// ============================================================================

/// Immutable R×R evaluation lattice.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T> {
    xs: Vec<T>,
    ys: Vec<T>,
    bounds: BoundingBox<T>,
}

impl<T: Float> Grid<T> {
    /// Points per axis.
    #[inline]
    pub fn resolution(&self) -> usize {
        self.xs.len()
    }

    /// Total lattice points (R²).
    #[inline]
    pub fn len(&self) -> usize {
        self.xs.len() * self.ys.len()
    }

    /// Always false: a built grid has at least 2×2 points.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Horizontal axis values.
    pub fn xs(&self) -> &[T] {
        &self.xs
    }

    /// Vertical axis values.
    pub fn ys(&self) -> &[T] {
        &self.ys
    }

    /// Bounding box the lattice spans.
    pub fn bounds(&self) -> BoundingBox<T> {
        self.bounds
    }

    /// Lattice point at flat row-major `index`.
    #[inline]
    pub fn point(&self, index: usize) -> Point<T> {
        let r = self.xs.len();
        Point::new(self.xs[index % r], self.ys[index / r])
    }

    /// Materialize the full cross product in row-major order.
    pub fn lattice(&self) -> Vec<Point<T>> {
        self.ys
            .iter()
            .flat_map(|&y| self.xs.iter().map(move |&x| Point::new(x, y)))
            .collect()
    }

    /// Per-axis spacing `(max - min) / (R - 1)`; zero on a degenerate axis.
    pub fn pixel_size(&self) -> (T, T) {
        let steps = T::from(self.resolution() - 1).unwrap_or(T::one());
        (self.bounds.width() / steps, self.bounds.height() / steps)
    }
}
