//! Batch adapter for per-dataset risk surfaces.
//!
//! ## Purpose
//!
//! This module wires the components into one in-memory run per dataset:
//! grid construction, KDE fitting, chunked parallel evaluation,
//! rasterization, point sampling and classification.
//!
//! ## Design notes
//!
//! * **Processing**: Each dataset is handled in a single pass; nothing is
//!   cached between calls.
//! * **Delegation**: Every stage is delegated to its layer; this module only
//!   sequences them and names the outputs.
//! * **Timing**: Each stage runs under a [`StageTimer`].
//! * **Generics**: Generic over `Float` types.
//!
//! ## Key concepts
//!
//! * **Builder Pattern**: Fluent configuration with defaults matching
//!   [`DensityConfig`], validated on `build()`.
//! * **Two phases**: [`RiskSurfacePipeline::build_surface`] persists the
//!   raster, [`RiskSurfacePipeline::sample_and_classify`] reads it back for
//!   the query layer.
//!
//! ## Invariants
//!
//! * Output columns have one entry per query point, in query order.
//! * A failed run returns `Err` and no columns.
//!
//! ## Non-goals
//!
//! * This adapter does not join results back into a host table.
//! * This adapter does not reproject between coordinate systems.

// External dependencies
use num_traits::Float;
use std::fmt::Debug;
use std::path::PathBuf;
use tracing::{info, instrument};

// Internal dependencies
use crate::config::{default_output_dir, DensityConfig, DEFAULT_CRS, DEFAULT_RESOLUTION};
use crate::engine::executor::{ParallelGridEvaluator, DEFAULT_CHUNK_SIZE};
use crate::evaluation::classify::StatisticalClassifier;
use crate::input::PointInput;
use crate::math::grid::{GridBuilder, MIN_RESOLUTION};
use crate::math::kde::{DensityEstimator, KdeParams};
use crate::primitives::cancel::CancellationToken;
use crate::primitives::errors::DensityError;
use crate::primitives::geometry::Point;
use crate::primitives::timing::StageTimer;
use crate::raster::sampler::PointSampler;
use crate::raster::transform::Crs;
use crate::raster::writer::{DensitySurface, RasterRef, SurfaceRasterizer};

/// Column prefix for a dataset name: lower-cased, spaces replaced by `_`.
///
/// Leading and trailing spaces are kept, so `" Crime"` becomes `"_crime"`.
pub fn dataset_prefix(name: &str) -> String {
    name.to_lowercase().replace(' ', "_")
}

// ============================================================================
// Risk Surface Builder
// ============================================================================

/// Builder for [`RiskSurfacePipeline`].
#[derive(Debug, Clone)]
pub struct RiskSurfaceBuilder<T> {
    /// Grid points per axis.
    pub resolution: usize,
    /// Lattice points per evaluation chunk.
    pub chunk_size: usize,
    /// KDE hyperparameters.
    pub params: KdeParams<T>,
    /// Fixed worker count, or all cores.
    pub workers: Option<usize>,
    /// Use the worker pool.
    pub parallel: bool,
    /// Raster output directory.
    pub output_dir: PathBuf,
    /// Coordinate reference system.
    pub crs: Crs,
    /// Cancellation token shared with the evaluator.
    pub cancel: CancellationToken,
}

impl<T: Float> Default for RiskSurfaceBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Float> RiskSurfaceBuilder<T> {
    /// Create a builder with default parameters.
    ///
    /// # Defaults
    ///
    /// * resolution: 1320, chunk_size: 50,000
    /// * bandwidth: 0.1, sensitivity: 0.999, fast covariance
    /// * parallel on every core
    /// * output under `{tmp}/fastkde`, CRS `EPSG:2272`
    pub fn new() -> Self {
        Self {
            resolution: DEFAULT_RESOLUTION,
            chunk_size: DEFAULT_CHUNK_SIZE,
            params: KdeParams::default(),
            workers: None,
            parallel: true,
            output_dir: default_output_dir(),
            crs: Crs::new(DEFAULT_CRS),
            cancel: CancellationToken::new(),
        }
    }

    /// Builder seeded from a configuration.
    pub fn from_config(config: &DensityConfig) -> Self {
        Self {
            resolution: config.resolution,
            chunk_size: config.chunk_size,
            params: KdeParams {
                bandwidth: T::from(config.bandwidth).unwrap_or_else(T::nan),
                sensitivity: T::from(config.sensitivity).unwrap_or_else(T::nan),
                fast_covariance: config.fast_covariance,
            },
            workers: config.workers,
            parallel: config.parallel,
            output_dir: config.output_dir.clone(),
            crs: Crs::new(&config.crs),
            cancel: CancellationToken::new(),
        }
    }

    /// Set the grid resolution.
    pub fn resolution(mut self, resolution: usize) -> Self {
        self.resolution = resolution;
        self
    }

    /// Set the evaluation chunk size.
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Set the global bandwidth.
    pub fn bandwidth(mut self, bandwidth: T) -> Self {
        self.params.bandwidth = bandwidth;
        self
    }

    /// Set the adaptive sensitivity.
    pub fn sensitivity(mut self, sensitivity: T) -> Self {
        self.params.sensitivity = sensitivity;
        self
    }

    /// Toggle the diagonal covariance approximation.
    pub fn fast_covariance(mut self, enabled: bool) -> Self {
        self.params.fast_covariance = enabled;
        self
    }

    /// Set a fixed worker count.
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    /// Set parallel execution mode.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Set the raster output directory.
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Set the coordinate reference system.
    pub fn crs(mut self, crs: impl Into<Crs>) -> Self {
        self.crs = crs.into();
        self
    }

    /// Attach a cancellation token.
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    // ========================================================================
    // Build Method
    // ========================================================================

    /// Validate the configuration and build the pipeline.
    pub fn build(self) -> Result<RiskSurfacePipeline<T>, DensityError> {
        if self.resolution < MIN_RESOLUTION {
            return Err(DensityError::InvalidResolution(self.resolution));
        }
        if self.chunk_size == 0 {
            return Err(DensityError::InvalidChunkSize {
                got: self.chunk_size,
                min: 1,
            });
        }
        if self.workers == Some(0) {
            return Err(DensityError::InvalidConfig(
                "workers must be at least 1".to_string(),
            ));
        }
        if self.crs.as_str().is_empty() {
            return Err(DensityError::InvalidConfig("crs must not be empty".to_string()));
        }
        self.params.validate()?;

        let mut evaluator = ParallelGridEvaluator::new()
            .chunk_size(self.chunk_size)
            .parallel(self.parallel)
            .cancellation(self.cancel);
        if let Some(workers) = self.workers {
            evaluator = evaluator.workers(workers);
        }

        Ok(RiskSurfacePipeline {
            grid: GridBuilder::new(self.resolution),
            estimator: DensityEstimator::with_params(self.params),
            evaluator,
            rasterizer: SurfaceRasterizer::new(self.output_dir),
            classifier: StatisticalClassifier::new(),
            crs: self.crs,
        })
    }
}

// ============================================================================
// Outputs
// ============================================================================

/// Persisted density surface of one dataset.
#[derive(Debug, Clone)]
pub struct SurfaceArtifact<T> {
    /// Column and file prefix.
    pub prefix: String,
    /// In-memory surface.
    pub surface: DensitySurface<T>,
    /// Location of the written raster.
    pub raster: RasterRef,
}

/// One query row of [`RiskColumns`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifiedValue<'a, T> {
    /// Query point.
    pub point: Point<T>,
    /// Sampled density.
    pub density: T,
    /// Standard score within the dataset.
    pub zscore: T,
    /// Percentile rank in `[0, 100]`.
    pub percentile: u8,
    /// Percentile label.
    pub label: &'a str,
}

/// The four per-query columns of one dataset.
#[derive(Debug, Clone)]
pub struct RiskColumns<T> {
    /// Dataset prefix.
    pub prefix: String,
    /// Query points, in input order.
    pub points: Vec<Point<T>>,
    /// `{prefix}_density`.
    pub density: Vec<T>,
    /// `{prefix}_density_zscore`.
    pub zscore: Vec<T>,
    /// `{prefix}_density_percentile`.
    pub percentile: Vec<u8>,
    /// `{prefix}_density_label`.
    pub label: Vec<String>,
    /// Raster the densities were sampled from.
    pub raster: RasterRef,
}

impl<T: Float> RiskColumns<T> {
    /// Number of query rows.
    pub fn len(&self) -> usize {
        self.density.len()
    }

    /// Whether there are no query rows.
    pub fn is_empty(&self) -> bool {
        self.density.is_empty()
    }

    /// Column names in `density, zscore, percentile, label` order.
    pub fn column_names(&self) -> [String; 4] {
        [
            format!("{}_density", self.prefix),
            format!("{}_density_zscore", self.prefix),
            format!("{}_density_percentile", self.prefix),
            format!("{}_density_label", self.prefix),
        ]
    }

    /// Row view over the columns.
    pub fn records(&self) -> impl Iterator<Item = ClassifiedValue<'_, T>> + '_ {
        (0..self.len()).map(move |i| ClassifiedValue {
            point: self.points[i],
            density: self.density[i],
            zscore: self.zscore[i],
            percentile: self.percentile[i],
            label: self.label[i].as_str(),
        })
    }
}

// ============================================================================
// Risk Surface Pipeline
// ============================================================================

/// Validated density pipeline.
#[derive(Debug, Clone)]
pub struct RiskSurfacePipeline<T> {
    grid: GridBuilder,
    estimator: DensityEstimator<T>,
    evaluator: ParallelGridEvaluator,
    rasterizer: SurfaceRasterizer,
    classifier: StatisticalClassifier,
    crs: Crs,
}

impl<T: Float + Debug + Send + Sync> RiskSurfacePipeline<T> {
    /// Coordinate reference system of inputs and rasters.
    pub fn crs(&self) -> &Crs {
        &self.crs
    }

    /// Raster output directory.
    pub fn rasterizer(&self) -> &SurfaceRasterizer {
        &self.rasterizer
    }

    /// Fit the events of `dataset`, evaluate the grid and persist the raster.
    #[instrument(skip_all, fields(dataset = %dataset))]
    pub fn build_surface<I>(
        &self,
        dataset: &str,
        events: &I,
    ) -> Result<SurfaceArtifact<T>, DensityError>
    where
        I: PointInput<T> + ?Sized,
    {
        let prefix = checked_prefix(dataset)?;
        let events = events.to_point_cloud()?;

        let grid = {
            let _timer = StageTimer::start("grid");
            self.grid.build(&events)?
        };
        let model = {
            let _timer = StageTimer::start("fit");
            self.estimator.fit(&events)?
        };
        let densities = {
            let _timer = StageTimer::start("evaluate");
            self.evaluator.evaluate_grid(&model, &grid)?
        };
        let (surface, raster) = {
            let _timer = StageTimer::start("rasterize");
            self.rasterizer
                .rasterize(&grid, densities, self.crs.clone(), &prefix)?
        };

        info!(
            events = events.len(),
            resolution = grid.resolution(),
            chunk_size = self.evaluator.get_chunk_size(),
            raster = %raster.path.display(),
            "density surface built"
        );
        Ok(SurfaceArtifact {
            prefix,
            surface,
            raster,
        })
    }

    /// Sample the persisted raster at `queries` and classify the result.
    #[instrument(skip_all, fields(dataset = %artifact.prefix))]
    pub fn sample_and_classify<I>(
        &self,
        artifact: &SurfaceArtifact<T>,
        queries: &I,
    ) -> Result<RiskColumns<T>, DensityError>
    where
        I: PointInput<T> + ?Sized,
    {
        let queries: Vec<Point<T>> = queries.to_point_cloud()?.iter().collect();

        let sampled = {
            let _timer = StageTimer::start("sample");
            let sampler = PointSampler::open(&artifact.raster)?;
            sampler.ensure_crs(artifact.surface.crs())?;
            sampler.sample_values(&queries)
        };
        let (points, density): (Vec<Point<T>>, Vec<T>) =
            sampled.into_iter().map(|s| (s.point, s.density)).unzip();
        let classification = {
            let _timer = StageTimer::start("classify");
            self.classifier.classify(&density)
        };

        info!(queries = points.len(), "queries classified");
        Ok(RiskColumns {
            prefix: artifact.prefix.clone(),
            points,
            density,
            zscore: classification.zscores,
            percentile: classification.percentiles,
            label: classification.labels,
            raster: artifact.raster.clone(),
        })
    }

    /// Build the surface for `events` and annotate `queries` from it.
    #[instrument(skip_all, fields(dataset = %dataset))]
    pub fn annotate<E, Q>(
        &self,
        dataset: &str,
        events: &E,
        queries: &Q,
    ) -> Result<RiskColumns<T>, DensityError>
    where
        E: PointInput<T> + ?Sized,
        Q: PointInput<T> + ?Sized,
    {
        let artifact = self.build_surface(dataset, events)?;
        self.sample_and_classify(&artifact, queries)
    }
}

/// Prefix of `dataset`, rejecting names that cannot form a file name.
fn checked_prefix(dataset: &str) -> Result<String, DensityError> {
    if dataset.trim().is_empty() {
        return Err(DensityError::InvalidInput(
            "dataset name must not be empty".to_string(),
        ));
    }
    let prefix = dataset_prefix(dataset);
    if prefix.contains(['/', '\\']) || prefix == "." || prefix == ".." {
        return Err(DensityError::InvalidInput(format!(
            "dataset name {:?} is not a valid file prefix",
            dataset
        )));
    }
    Ok(prefix)
}
