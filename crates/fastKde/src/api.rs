//! High-level API for adaptive density surfaces.
//!
//! ## Purpose
//!
//! This module is the user-facing entry point. It re-exports the pipeline
//! builder, its outputs and the types callers need to feed it, so that
//! `use fastKde::prelude::*` is enough for a complete run.
//!
//! ## Key concepts
//!
//! ### Configuration Flow
//!
//! 1. Create a [`RiskSurfaceBuilder`] via `RiskSurface::new()` (prelude
//!    name) or `RiskSurfaceBuilder::from_config(&config)`.
//! 2. Chain configuration methods (`.resolution()`, `.bandwidth()`, etc.).
//! 3. Call `.build()` to validate and obtain a [`RiskSurfacePipeline`].
//! 4. Call `.annotate(dataset, &events, &queries)`.

// Publicly re-exported types
pub use crate::adapters::batch::{
    dataset_prefix, ClassifiedValue, RiskColumns, RiskSurfaceBuilder, RiskSurfacePipeline,
    SurfaceArtifact,
};
pub use crate::config::{DensityConfig, DEFAULT_CRS, DEFAULT_RESOLUTION};
pub use crate::engine::executor::DEFAULT_CHUNK_SIZE;
pub use crate::evaluation::classify::{percentile_label, Classification, StatisticalClassifier};
pub use crate::input::PointInput;
pub use crate::math::kde::{
    AdaptiveKde, DensityEstimator, DensityModel, KdeParams, DEFAULT_BANDWIDTH,
    DEFAULT_SENSITIVITY,
};
pub use crate::primitives::cancel::CancellationToken;
pub use crate::primitives::errors::{DensityError, ErrorKind};
pub use crate::primitives::geometry::{BoundingBox, Point, PointCloud};
pub use crate::raster::sampler::SampledValue;
pub use crate::raster::transform::Crs;
pub use crate::raster::writer::{DensitySurface, RasterRef};
