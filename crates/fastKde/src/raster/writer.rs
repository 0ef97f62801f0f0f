//! Density surfaces and their persistence as georeferenced rasters.
//!
//! ## Purpose
//!
//! This module turns the flat, row-major density vector produced by the
//! evaluator into a [`DensitySurface`] (matrix + affine transform + CRS) and
//! writes it to a deterministic path derived from the dataset prefix.
//!
//! ## Design notes
//!
//! * **Transform**: `translate(min_x, min_y) · scale(pixel_x, pixel_y)` with
//!   `pixel = (max - min) / (R - 1)`, so pixel `(row, col)` sits exactly on
//!   lattice point `(xs[col], ys[row])`.
//! * **Overwrite**: Each run replaces `{output_dir}/{prefix}_density.tif`.
//!
//! ## Invariants
//!
//! * Surface shape is `(R, R)`; all values are ≥ 0.
//! * The transform and CRS describe the same space as the input points.
//!
//! ## Non-goals
//!
//! * This module does not version rasters or guard concurrent writers of the
//!   same prefix (last writer wins).

// External dependencies
use ndarray::Array2;
use num_traits::Float;
use std::path::{Path, PathBuf};
use tracing::info;

// Internal dependencies
use crate::math::grid::Grid;
use crate::primitives::errors::DensityError;
use crate::raster::geotiff::write_geotiff;
use crate::raster::transform::{AffineTransform, Crs};

// ============================================================================
// Density Surface
// ============================================================================

/// Evaluated density matrix with its georeferencing.
#[derive(Debug, Clone, PartialEq)]
pub struct DensitySurface<T> {
    values: Array2<T>,
    transform: AffineTransform,
    crs: Crs,
}

impl<T: Float> DensitySurface<T> {
    /// Assemble a surface from parts.
    pub fn new(values: Array2<T>, transform: AffineTransform, crs: Crs) -> Self {
        Self {
            values,
            transform,
            crs,
        }
    }

    /// Reshape row-major lattice densities into a surface over `grid`.
    pub fn from_grid(grid: &Grid<T>, densities: Vec<T>, crs: Crs) -> Result<Self, DensityError> {
        let r = grid.resolution();
        if densities.len() != grid.len() {
            return Err(DensityError::InvalidInput(format!(
                "expected {} densities for a {}x{} grid, got {}",
                grid.len(),
                r,
                r,
                densities.len()
            )));
        }
        let values = Array2::from_shape_vec((r, r), densities)
            .map_err(|e| DensityError::InvalidInput(e.to_string()))?;
        Ok(Self {
            values,
            transform: grid_transform(grid),
            crs,
        })
    }

    /// Density matrix, rows along y.
    pub fn values(&self) -> &Array2<T> {
        &self.values
    }

    /// Pixel → coordinate transform.
    pub fn transform(&self) -> &AffineTransform {
        &self.transform
    }

    /// Coordinate reference system.
    pub fn crs(&self) -> &Crs {
        &self.crs
    }

    /// `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        self.values.dim()
    }

    /// Value at pixel `(row, col)`.
    pub fn get(&self, row: usize, col: usize) -> Option<T> {
        self.values.get((row, col)).copied()
    }
}

/// Transform placing pixel `(row, col)` on lattice point `(xs[col], ys[row])`.
pub fn grid_transform<T: Float>(grid: &Grid<T>) -> AffineTransform {
    let bounds = grid.bounds();
    let (px, py) = grid.pixel_size();
    AffineTransform::translation(
        bounds.min_x.to_f64().unwrap_or(0.0),
        bounds.min_y.to_f64().unwrap_or(0.0),
    ) * AffineTransform::scale(px.to_f64().unwrap_or(0.0), py.to_f64().unwrap_or(0.0))
}

// ============================================================================
// Raster Reference
// ============================================================================

/// Handle to a raster written by [`SurfaceRasterizer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterRef {
    /// File location.
    pub path: PathBuf,
    /// Pixels per row.
    pub width: usize,
    /// Rows.
    pub height: usize,
}

// ============================================================================
// Surface Rasterizer
// ============================================================================

/// Writes density surfaces under a fixed output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceRasterizer {
    output_dir: PathBuf,
}

impl SurfaceRasterizer {
    /// Rasterizer writing into `output_dir` (created on first write).
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Output directory.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Deterministic raster path for a dataset prefix.
    pub fn raster_path(&self, prefix: &str) -> PathBuf {
        self.output_dir.join(format!("{}_density.tif", prefix))
    }

    /// Build the surface for `grid` and persist it under `prefix`.
    pub fn rasterize<T: Float>(
        &self,
        grid: &Grid<T>,
        densities: Vec<T>,
        crs: Crs,
        prefix: &str,
    ) -> Result<(DensitySurface<T>, RasterRef), DensityError> {
        let surface = DensitySurface::from_grid(grid, densities, crs)?;
        let raster = self.write(&surface, prefix)?;
        Ok((surface, raster))
    }

    /// Persist an existing surface under `prefix`, replacing any previous file.
    pub fn write<T: Float>(
        &self,
        surface: &DensitySurface<T>,
        prefix: &str,
    ) -> Result<RasterRef, DensityError> {
        let path = self.raster_path(prefix);
        let values = surface.values.mapv(|v| v.to_f64().unwrap_or(f64::NAN));
        write_geotiff(&path, &values, &surface.transform, &surface.crs)?;

        let (height, width) = surface.shape();
        info!(path = %path.display(), width, height, crs = %surface.crs, "density raster written");
        Ok(RasterRef {
            path,
            width,
            height,
        })
    }
}
