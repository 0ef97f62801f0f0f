//! Pipeline configuration.
//!
//! ## Purpose
//!
//! This module holds every tunable of a density run in one serde-friendly
//! struct, loadable from TOML. Output location and CRS are explicit values
//! here rather than process-wide state.
//!
//! ## Key concepts
//!
//! * **Defaults**: resolution 1320, chunk size 50,000, bandwidth 0.1,
//!   sensitivity 0.999, diagonal covariance, all cores.
//! * **Partial files**: Missing keys fall back to their defaults.
//!
//! ## Invariants
//!
//! * A config that passed [`DensityConfig::validate`] builds a pipeline.

// External dependencies
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// Internal dependencies
use crate::engine::executor::DEFAULT_CHUNK_SIZE;
use crate::math::grid::MIN_RESOLUTION;
use crate::math::kde::{KdeParams, DEFAULT_BANDWIDTH, DEFAULT_SENSITIVITY};
use crate::primitives::errors::DensityError;

/// Default grid points per axis.
pub const DEFAULT_RESOLUTION: usize = 1320;

/// Default coordinate reference system.
pub const DEFAULT_CRS: &str = "EPSG:2272";

/// Settings for one density run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DensityConfig {
    /// Grid points per axis.
    pub resolution: usize,
    /// Lattice points per evaluation chunk.
    pub chunk_size: usize,
    /// Global KDE bandwidth (whitened units).
    pub bandwidth: f64,
    /// Adaptive sensitivity in `[0, 1]`.
    pub sensitivity: f64,
    /// Diagonal covariance approximation.
    pub fast_covariance: bool,
    /// Worker threads; `None` uses every available core.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
    /// Run the evaluation on the worker pool.
    pub parallel: bool,
    /// Directory receiving `{prefix}_density.tif`.
    pub output_dir: PathBuf,
    /// CRS shared by events, queries and the raster.
    pub crs: String,
}

impl Default for DensityConfig {
    fn default() -> Self {
        Self {
            resolution: DEFAULT_RESOLUTION,
            chunk_size: DEFAULT_CHUNK_SIZE,
            bandwidth: DEFAULT_BANDWIDTH,
            sensitivity: DEFAULT_SENSITIVITY,
            fast_covariance: true,
            workers: None,
            parallel: true,
            output_dir: default_output_dir(),
            crs: DEFAULT_CRS.to_string(),
        }
    }
}

/// `{system temp}/fastkde`.
pub fn default_output_dir() -> PathBuf {
    std::env::temp_dir().join("fastkde")
}

impl DensityConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, DensityError> {
        let config: DensityConfig = toml::from_str(text)
            .map_err(|e| DensityError::InvalidConfig(format!("failed to parse TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DensityError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            DensityError::InvalidConfig(format!(
                "failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&text)
    }

    /// Serialize back to TOML.
    pub fn to_toml_string(&self) -> Result<String, DensityError> {
        toml::to_string_pretty(self).map_err(|e| DensityError::InvalidConfig(e.to_string()))
    }

    /// Check every parameter bound.
    pub fn validate(&self) -> Result<(), DensityError> {
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
        if self.crs.trim().is_empty() {
            return Err(DensityError::InvalidConfig("crs must not be empty".to_string()));
        }
        self.kde_params().validate()
    }

    /// KDE hyperparameters.
    pub fn kde_params(&self) -> KdeParams<f64> {
        KdeParams {
            bandwidth: self.bandwidth,
            sensitivity: self.sensitivity,
            fast_covariance: self.fast_covariance,
        }
    }
}
