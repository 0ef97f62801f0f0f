//! # fastKde: adaptive kernel density risk surfaces
//!
//! A parallel implementation of adaptive-bandwidth Gaussian kernel density
//! estimation over 2-D event locations, with georeferenced raster output and
//! per-query risk classification.
//!
//! ## What does it do?
//!
//! Given the projected locations of events from one dataset (for example
//! incident reports) and a set of query points (for example parcel
//! centroids), fastKde:
//!
//! 1. Lays an R×R lattice over the bounding box of the events.
//! 2. Fits an adaptive KDE: each event gets its own bandwidth, wider in
//!    sparse regions and narrower in dense ones.
//! 3. Evaluates the density at every lattice point in independent chunks on
//!    a worker pool.
//! 4. Writes the surface as a single-band 64-bit GeoTIFF at
//!    `{output_dir}/{prefix}_density.tif`.
//! 5. Samples the raster under each query point and derives a z-score, a
//!    percentile rank and a label such as `"21st Percentile"`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fastKde::prelude::*;
//!
//! let events = vec![(10.0, 10.0), (12.0, 11.0), (11.0, 13.0), (40.0, 42.0)];
//! let parcels = vec![(11.0, 11.0), (40.0, 40.0)];
//!
//! let pipeline = RiskSurface::<f64>::new()
//!     .resolution(200)          // 200 x 200 lattice
//!     .bandwidth(0.1)           // Global bandwidth in whitened units
//!     .sensitivity(0.999)       // Adaptive exponent
//!     .output_dir("rasters")    // Where {prefix}_density.tif lands
//!     .crs("EPSG:2272")
//!     .build()?;
//!
//! let columns = pipeline.annotate("Code Violations", &events, &parcels)?;
//! for row in columns.records() {
//!     println!("{:?}: {} ({})", row.point, row.density, row.label);
//! }
//! # Result::<(), DensityError>::Ok(())
//! ```
//!
//! ## Parameters
//!
//! | Parameter           | Default          | Range/Options | Description                              |
//! |---------------------|------------------|---------------|------------------------------------------|
//! | **resolution**      | 1320             | [2, ∞)        | Lattice points per axis                  |
//! | **chunk_size**      | 50,000           | [1, ∞)        | Lattice points per evaluation task       |
//! | **bandwidth**       | 0.1              | (0, ∞)        | Global bandwidth (whitened units)        |
//! | **sensitivity**     | 0.999            | [0, 1]        | Adaptive exponent; 0 is a fixed bandwidth|
//! | **fast_covariance** | true             | true/false    | Diagonal whitening instead of Cholesky   |
//! | **workers**         | all cores        | [1, ∞)        | Worker threads                           |
//! | **parallel**        | true             | true/false    | Use the worker pool                      |
//! | **output_dir**      | `{tmp}/fastkde`  | path          | Raster output directory                  |
//! | **crs**             | `EPSG:2272`      | identifier    | CRS of events, queries and raster        |
//!
//! All parameters can also be loaded from TOML via [`prelude::DensityConfig`].
//!
//! ## Errors
//!
//! Every fallible operation returns [`prelude::DensityError`]; its
//! [`kind`](prelude::DensityError::kind) places it in one of five buckets:
//! `DataError`, `FitError`, `ComputeError`, `IOError` or `ConfigError`. A
//! failed run yields no columns at all.
//!
//! ## Features
//!
//! * `cpu` (default): parallel evaluation with `rayon`. Without it the same
//!   chunk loop runs sequentially.

#![allow(non_snake_case)]

// ============================================================================
// Internal Modules
// ============================================================================

// Layer 1: Primitives - errors, geometry, cancellation, timing.
mod primitives;

// Layer 2: Math - evaluation lattice and adaptive KDE.
mod math;

// Layer 3: Engine - chunked parallel evaluation.
mod engine;

// Layer 4: Raster - GeoTIFF persistence and point sampling.
mod raster;

// Layer 5: Evaluation - population statistics of sampled densities.
mod evaluation;

// Layer 6: Adapters - per-dataset pipeline.
mod adapters;

// High-level fluent API.
mod api;

// Pipeline configuration.
mod config;

// Input data handling.
mod input;

// ============================================================================
// Prelude
// ============================================================================

/// Standard fastKde prelude.
pub mod prelude {
    pub use crate::api::{
        dataset_prefix, CancellationToken, ClassifiedValue, Crs, DensityConfig, DensityError,
        ErrorKind, Point, PointCloud, PointInput, RasterRef, RiskColumns, SampledValue,
        RiskSurfaceBuilder as RiskSurface, RiskSurfacePipeline, SurfaceArtifact,
    };
}

// ============================================================================
// Testing re-exports
// ============================================================================

/// Internal modules for development and testing.
///
/// **Warning**: These are internal implementation details and may change without notice.
/// Do not use in production code.
#[doc(hidden)]
pub mod internals {
    /// Errors, geometry, cancellation and timing.
    pub mod primitives {
        pub use crate::primitives::*;
    }
    /// Evaluation lattice and KDE.
    pub mod math {
        pub use crate::math::*;
    }
    /// Chunked evaluation engine.
    pub mod engine {
        pub use crate::engine::*;
    }
    /// GeoTIFF persistence and sampling.
    pub mod raster {
        pub use crate::raster::*;
    }
    /// Population statistics.
    pub mod evaluation {
        pub use crate::evaluation::*;
    }
    /// Per-dataset pipeline.
    pub mod adapters {
        pub use crate::adapters::*;
    }
    /// Internal API.
    pub mod api {
        pub use crate::api::*;
    }
    /// Configuration.
    pub mod config {
        pub use crate::config::*;
    }
    /// Input conversions.
    pub mod input {
        pub use crate::input::*;
    }
}
