//! Input abstractions for event and query points.
//!
//! ## Purpose
//!
//! This module provides a unified abstraction for point inputs, allowing the
//! pipeline to accept several container formats (point slices, tuples,
//! coordinate arrays, ndarray matrices) through a single interface.
//!
//! ## Design notes
//!
//! * **Validation on entry**: Every conversion yields a [`PointCloud`], which
//!   rejects non-finite coordinates.
//! * **Interoperability**: Bridges standard Rust collections with `ndarray`.
//! * **Fail-fast**: Matrices must be n×2; anything else is `InvalidInput`.
//!
//! ## Invariants
//!
//! * Point order is preserved.
//!
//! ## Non-goals
//!
//! * This module does not reproject or deduplicate points.
//! * This module does not compute centroids of polygons (callers pass centroids).

// External dependencies
use ndarray::{ArrayBase, Data, Ix2};
use num_traits::Float;

// Internal dependencies
use crate::primitives::errors::DensityError;
use crate::primitives::geometry::{Point, PointCloud};

/// Trait for types that can be used as a point input.
pub trait PointInput<T: Float> {
    /// Convert the input to a validated point cloud.
    fn to_point_cloud(&self) -> Result<PointCloud<T>, DensityError>;
}

impl<T: Float> PointInput<T> for PointCloud<T> {
    fn to_point_cloud(&self) -> Result<PointCloud<T>, DensityError> {
        Ok(self.clone())
    }
}

impl<T: Float> PointInput<T> for [Point<T>] {
    fn to_point_cloud(&self) -> Result<PointCloud<T>, DensityError> {
        PointCloud::new(self.to_vec())
    }
}

impl<T: Float> PointInput<T> for Vec<Point<T>> {
    fn to_point_cloud(&self) -> Result<PointCloud<T>, DensityError> {
        PointCloud::new(self.clone())
    }
}

impl<T: Float> PointInput<T> for [(T, T)] {
    fn to_point_cloud(&self) -> Result<PointCloud<T>, DensityError> {
        PointCloud::new(self.iter().map(|&p| Point::from(p)).collect())
    }
}

impl<T: Float> PointInput<T> for Vec<(T, T)> {
    fn to_point_cloud(&self) -> Result<PointCloud<T>, DensityError> {
        self.as_slice().to_point_cloud()
    }
}

impl<T: Float> PointInput<T> for [[T; 2]] {
    fn to_point_cloud(&self) -> Result<PointCloud<T>, DensityError> {
        PointCloud::new(self.iter().map(|&p| Point::from(p)).collect())
    }
}

impl<T: Float> PointInput<T> for Vec<[T; 2]> {
    fn to_point_cloud(&self) -> Result<PointCloud<T>, DensityError> {
        self.as_slice().to_point_cloud()
    }
}

impl<T: Float, S> PointInput<T> for ArrayBase<S, Ix2>
where
    S: Data<Elem = T>,
{
    fn to_point_cloud(&self) -> Result<PointCloud<T>, DensityError> {
        if self.ncols() != 2 {
            return Err(DensityError::InvalidInput(format!(
                "ndarray input must have 2 columns (x, y), got {}",
                self.ncols()
            )));
        }
        PointCloud::new(
            self.rows()
                .into_iter()
                .map(|row| Point::new(row[0], row[1]))
                .collect(),
        )
    }
}
