//! Layer 4: Raster
//!
//! ## Purpose
//!
//! This layer persists evaluated density surfaces as georeferenced GeoTIFF
//! rasters and samples them back at arbitrary query points.
//!
//! ## Architecture
//!
//! ```text
//! Layer 7: API
//!   ↓
//! Layer 6: Adapters
//!   ↓
//! Layer 5: Evaluation
//!   ↓
//! Layer 4: Raster ← You are here
//!   ↓
//! Layer 3: Engine
//!   ↓
//! Layer 2: Math
//!   ↓
//! Layer 1: Primitives
//! ```

/// GeoTIFF encoding and decoding.
pub mod geotiff;

/// Raster sampling at query points (PointSampler).
pub mod sampler;

/// Affine transforms and CRS identifiers.
pub mod transform;

/// Density surfaces and raster writing (SurfaceRasterizer).
pub mod writer;
