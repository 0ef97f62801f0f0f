//! Planar points, point clouds and bounding boxes.
//!
//! ## Purpose
//!
//! This module provides the basic geometric containers shared by every
//! layer: a 2-D [`Point`], an owned and validated [`PointCloud`], and the
//! axis-aligned [`BoundingBox`] of a cloud.
//!
//! ## Invariants
//!
//! * Every coordinate stored in a `PointCloud` is finite.
//! * All points of a cloud share one (implicit) CRS.
//! * A `BoundingBox` always satisfies `min <= max` on both axes.
//!
//! ## Non-goals
//!
//! * This module does not reproject coordinates.
//! * This module does not deduplicate points.

// External dependencies
use num_traits::Float;

// Internal dependencies
use crate::primitives::errors::DensityError;

// ============================================================================
// Point
// ============================================================================

/// A planar coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point<T> {
    /// Easting / horizontal coordinate.
    pub x: T,
    /// Northing / vertical coordinate.
    pub y: T,
}

impl<T> Point<T> {
    /// Create a new point.
    #[inline]
    pub const fn new(x: T, y: T) -> Self {
        Self { x, y }
    }
}

impl<T: Float> Point<T> {
    /// Whether both coordinates are finite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl<T> From<(T, T)> for Point<T> {
    fn from((x, y): (T, T)) -> Self {
        Self { x, y }
    }
}

impl<T: Copy> From<[T; 2]> for Point<T> {
    fn from(p: [T; 2]) -> Self {
        Self { x: p[0], y: p[1] }
    }
}

// ============================================================================
// Bounding Box
// ============================================================================

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox<T> {
    /// Minimum x.
    pub min_x: T,
    /// Minimum y.
    pub min_y: T,
    /// Maximum x.
    pub max_x: T,
    /// Maximum y.
    pub max_y: T,
}

impl<T: Float> BoundingBox<T> {
    /// Horizontal extent.
    pub fn width(&self) -> T {
        self.max_x - self.min_x
    }

    /// Vertical extent.
    pub fn height(&self) -> T {
        self.max_y - self.min_y
    }

    /// Whether `p` lies inside the box (edges inclusive).
    pub fn contains(&self, p: &Point<T>) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }
}

// ============================================================================
// Point Cloud
// ============================================================================

/// Ordered collection of finite planar points in one CRS.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PointCloud<T> {
    points: Vec<T>,
}

impl<T: Float> PointCloud<T> {
    /// Build a cloud, rejecting non-finite coordinates.
    ///
    /// An empty cloud is allowed here; components that need points fail
    /// with [`DensityError::EmptyInput`] themselves.
    pub fn new(points: Vec<Point<T>>) -> Result<Self, DensityError> {
        let mut flat = Vec::with_capacity(points.len() * 2);
        for (i, p) in points.iter().enumerate() {
            if !p.is_finite() {
                return Err(DensityError::InvalidNumericValue(format!(
                    "point[{}]=({}, {})",
                    i,
                    p.x.to_f64().unwrap_or(f64::NAN),
                    p.y.to_f64().unwrap_or(f64::NAN)
                )));
            }
            flat.push(p.x);
            flat.push(p.y);
        }
        Ok(Self { points: flat })
    }

    /// Build a cloud from separate coordinate columns.
    pub fn from_xy(xs: &[T], ys: &[T]) -> Result<Self, DensityError> {
        if xs.len() != ys.len() {
            return Err(DensityError::InvalidInput(format!(
                "x has {} values, y has {}",
                xs.len(),
                ys.len()
            )));
        }
        Self::new(xs.iter().zip(ys).map(|(&x, &y)| Point::new(x, y)).collect())
    }

    /// Number of points.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len() / 2
    }

    /// Whether the cloud has no points.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Point at `index`.
    #[inline]
    pub fn get(&self, index: usize) -> Point<T> {
        Point::new(self.points[2 * index], self.points[2 * index + 1])
    }

    /// Iterate over the points in order.
    pub fn iter(&self) -> impl Iterator<Item = Point<T>> + '_ {
        self.points.chunks_exact(2).map(|c| Point::new(c[0], c[1]))
    }

    /// Interleaved `[x0, y0, x1, y1, ...]` coordinates.
    #[inline]
    pub fn as_flat(&self) -> &[T] {
        &self.points
    }

    /// Bounding box, or `None` for an empty cloud.
    pub fn bounds(&self) -> Option<BoundingBox<T>> {
        let mut iter = self.iter();
        let first = iter.next()?;
        let init = BoundingBox {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x,
            max_y: first.y,
        };
        Some(iter.fold(init, |b, p| BoundingBox {
            min_x: b.min_x.min(p.x),
            min_y: b.min_y.min(p.y),
            max_x: b.max_x.max(p.x),
            max_y: b.max_y.max(p.y),
        }))
    }

    /// Whether the cloud holds at least two distinct points.
    pub fn has_distinct_points(&self) -> bool {
        match self.iter().next() {
            Some(first) => self.iter().any(|p| p != first),
            None => false,
        }
    }
}
