//! Point sampling of persisted density rasters.
//!
//! ## Purpose
//!
//! This module reads a raster written by the rasterizer and looks up the
//! density under arbitrary query points (typically polygon centroids).
//!
//! ## Design notes
//!
//! * **Nearest-lower pixel**: Coordinates are inverted through the affine
//!   transform and truncated to integer `(row, col)`.
//! * **Snapping**: Fractional indices within a relative `1e-9` of an integer
//!   are treated as that integer, so lattice coordinates land on their own
//!   pixel despite rounding.
//! * **Clamping**: Indices are clamped to `[0, dim - 1]`. Queries outside the
//!   surface receive the nearest edge pixel instead of an error.
//!
//! ## Invariants
//!
//! * One output per query, in query order.
//! * Open/read failures are fatal; there is no fallback density.
//!
//! ## Non-goals
//!
//! * This module does not interpolate between pixels.

// External dependencies
use num_traits::Float;
use std::path::{Path, PathBuf};
use tracing::debug;

// Internal dependencies
use crate::primitives::errors::DensityError;
use crate::primitives::geometry::Point;
use crate::raster::geotiff::read_geotiff;
use crate::raster::transform::Crs;
use crate::raster::writer::{DensitySurface, RasterRef};

/// Relative tolerance for snapping fractional pixel indices.
const SNAP_TOLERANCE: f64 = 1e-9;

/// A query point and the density under it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampledValue<T> {
    /// Query point.
    pub point: Point<T>,
    /// Density of the pixel under `point`.
    pub density: T,
}

/// Samples a density raster at query points.
#[derive(Debug, Clone)]
pub struct PointSampler {
    path: PathBuf,
    surface: DensitySurface<f64>,
}

impl PointSampler {
    /// Open the raster behind `raster`.
    pub fn open(raster: &RasterRef) -> Result<Self, DensityError> {
        Self::open_path(&raster.path)
    }

    /// Open a raster file directly.
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self, DensityError> {
        let path = path.as_ref();
        let data = read_geotiff(path)?;
        let crs = data.crs.ok_or_else(|| DensityError::InvalidRaster {
            path: path.to_path_buf(),
            reason: "no CRS citation in GeoKey directory".to_string(),
        })?;
        let (rows, cols) = data.values.dim();
        if rows == 0 || cols == 0 {
            return Err(DensityError::InvalidRaster {
                path: path.to_path_buf(),
                reason: "raster has no pixels".to_string(),
            });
        }
        debug!(path = %path.display(), rows, cols, crs = %crs, "raster opened");
        Ok(Self {
            path: path.to_path_buf(),
            surface: DensitySurface::new(data.values, data.transform, crs),
        })
    }

    /// Source file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// CRS recorded in the raster.
    pub fn crs(&self) -> &Crs {
        self.surface.crs()
    }

    /// Decoded surface.
    pub fn surface(&self) -> &DensitySurface<f64> {
        &self.surface
    }

    /// Fail unless the raster is in `expected`.
    pub fn ensure_crs(&self, expected: &Crs) -> Result<(), DensityError> {
        if self.crs() != expected {
            return Err(DensityError::InvalidRaster {
                path: self.path.clone(),
                reason: format!("CRS {} does not match expected {}", self.crs(), expected),
            });
        }
        Ok(())
    }

    /// Clamped `(row, col)` of the pixel under `(x, y)`.
    pub fn pixel_index(&self, x: f64, y: f64) -> (usize, usize) {
        let (rows, cols) = self.surface.shape();
        let (fc, fr) = self.surface.transform().to_pixel(x, y);
        (clamp_index(fr, rows), clamp_index(fc, cols))
    }

    /// Density under a single point.
    pub fn sample_point<T: Float>(&self, p: Point<T>) -> T {
        let x = p.x.to_f64().unwrap_or(f64::NAN);
        let y = p.y.to_f64().unwrap_or(f64::NAN);
        let (row, col) = self.pixel_index(x, y);
        let v = self.surface.values()[(row, col)];
        T::from(v).unwrap_or_else(T::nan)
    }

    /// Density under each query point, in input order.
    pub fn sample<T: Float>(&self, queries: &[Point<T>]) -> Vec<T> {
        queries.iter().map(|&p| self.sample_point(p)).collect()
    }

    /// Query points paired with their densities, in input order.
    pub fn sample_values<T: Float>(&self, queries: &[Point<T>]) -> Vec<SampledValue<T>> {
        queries
            .iter()
            .map(|&point| SampledValue {
                point,
                density: self.sample_point(point),
            })
            .collect()
    }
}

/// Truncate a fractional index and clamp it to `[0, len - 1]`.
fn clamp_index(frac: f64, len: usize) -> usize {
    let nearest = frac.round();
    let snapped = if (frac - nearest).abs() <= SNAP_TOLERANCE * nearest.abs().max(1.0) {
        nearest
    } else {
        frac.floor()
    };
    let max = (len - 1) as f64;
    // NaN falls through both comparisons and maps to 0.
    if snapped >= max {
        len - 1
    } else if snapped > 0.0 {
        snapped as usize
    } else {
        0
    }
}
