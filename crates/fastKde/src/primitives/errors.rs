//! Error types for density estimation and surface annotation.
//!
//! ## Purpose
//!
//! This module defines the single error enum returned by every fallible
//! operation in the crate, together with the coarse [`ErrorKind`] taxonomy
//! that callers use to decide whether to skip a dataset or abort a run.
//!
//! ## Design notes
//!
//! * **Single enum**: All layers return `DensityError`; no layer wraps another.
//! * **Kinds**: `Data`, `Fit`, `Compute`, `Io` and `Config` classify variants.
//! * **Sources**: I/O and TIFF failures keep their underlying error as `source`.
//!
//! ## Invariants
//!
//! * Every variant maps to exactly one [`ErrorKind`].
//! * None of these errors is retried inside the crate.
//!
//! ## Non-goals
//!
//! * This module does not decide retry or skip policy (left to the caller).

// External dependencies
use std::fmt;
use std::path::PathBuf;

// ============================================================================
// Error Kind
// ============================================================================

/// Coarse classification of a [`DensityError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Empty, malformed or non-finite input points.
    Data,
    /// The density model could not be fitted.
    Fit,
    /// A parallel evaluation chunk failed or was cancelled.
    Compute,
    /// Raster write, read or decode failure.
    Io,
    /// Invalid configuration parameter.
    Config,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Data => "DataError",
            ErrorKind::Fit => "FitError",
            ErrorKind::Compute => "ComputeError",
            ErrorKind::Io => "IOError",
            ErrorKind::Config => "ConfigError",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Density Error
// ============================================================================

/// Errors produced while building, evaluating, persisting or sampling a
/// density surface.
#[derive(Debug, thiserror::Error)]
pub enum DensityError {
    /// The point cloud has no points.
    #[error("Point cloud is empty")]
    EmptyInput,

    /// Input has the wrong shape or layout.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A coordinate is NaN or infinite.
    #[error("Invalid numeric value: {0}")]
    InvalidNumericValue(String),

    /// Grid resolution below two points per axis.
    #[error("Invalid resolution: {0} (must be at least 2)")]
    InvalidResolution(usize),

    /// Fewer distinct points than the covariance needs.
    #[error("Too few distinct points: got {got}, need at least {min}")]
    TooFewDistinctPoints {
        /// Distinct points found (capped at `min`).
        got: usize,
        /// Minimum required.
        min: usize,
    },

    /// The sample covariance cannot be inverted.
    #[error("Singular covariance: {0}")]
    SingularCovariance(String),

    /// A worker failed while evaluating a chunk.
    #[error("Evaluation failed in chunk {chunk}: {reason}")]
    ChunkFailed {
        /// Zero-based chunk index.
        chunk: usize,
        /// Failure description.
        reason: String,
    },

    /// Evaluation stopped by a cancellation token.
    #[error("Evaluation cancelled after {completed} of {total} chunks")]
    Cancelled {
        /// Chunks finished before cancellation was observed.
        completed: usize,
        /// Total chunks scheduled.
        total: usize,
    },

    /// The worker pool could not be created.
    #[error("Worker pool unavailable: {0}")]
    WorkerPool(String),

    /// File system failure while writing or reading a raster.
    #[error("Raster I/O failed for {}: {source}", .path.display())]
    RasterIo {
        /// Raster path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// TIFF encoding or decoding failure.
    #[error("Raster encoding failed for {}: {source}", .path.display())]
    RasterFormat {
        /// Raster path.
        path: PathBuf,
        /// Underlying TIFF error.
        #[source]
        source: tiff::TiffError,
    },

    /// The raster decoded but is not a usable density surface.
    #[error("Invalid raster {}: {reason}", .path.display())]
    InvalidRaster {
        /// Raster path.
        path: PathBuf,
        /// What was wrong with it.
        reason: String,
    },

    /// Global bandwidth out of range.
    #[error("Invalid bandwidth: {0} (must be > 0 and finite)")]
    InvalidBandwidth(f64),

    /// Adaptive sensitivity out of range.
    #[error("Invalid sensitivity: {0} (must be in [0, 1])")]
    InvalidSensitivity(f64),

    /// Chunk size out of range.
    #[error("Invalid chunk_size: {got} (must be at least {min})")]
    InvalidChunkSize {
        /// Requested chunk size.
        got: usize,
        /// Minimum chunk size.
        min: usize,
    },

    /// Any other configuration problem.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl DensityError {
    /// Taxonomy bucket of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyInput
            | Self::InvalidInput(_)
            | Self::InvalidNumericValue(_)
            | Self::InvalidResolution(_) => ErrorKind::Data,
            Self::TooFewDistinctPoints { .. } | Self::SingularCovariance(_) => ErrorKind::Fit,
            Self::ChunkFailed { .. } | Self::Cancelled { .. } | Self::WorkerPool(_) => {
                ErrorKind::Compute
            }
            Self::RasterIo { .. } | Self::RasterFormat { .. } | Self::InvalidRaster { .. } => {
                ErrorKind::Io
            }
            Self::InvalidBandwidth(_)
            | Self::InvalidSensitivity(_)
            | Self::InvalidChunkSize { .. }
            | Self::InvalidConfig(_) => ErrorKind::Config,
        }
    }

    /// Wrap a TIFF error, unwrapping plain I/O failures into [`DensityError::RasterIo`].
    pub(crate) fn from_tiff(path: impl Into<PathBuf>, err: tiff::TiffError) -> Self {
        let path = path.into();
        match err {
            tiff::TiffError::IoError(source) => Self::RasterIo { path, source },
            source => Self::RasterFormat { path, source },
        }
    }
}
