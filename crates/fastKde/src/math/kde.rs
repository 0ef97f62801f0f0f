//! Adaptive-bandwidth Gaussian kernel density estimation.
//!
//! ## Purpose
//!
//! This module fits a 2-D kernel density model whose kernel width varies per
//! observation. A fixed-width pilot estimate is computed first; observations
//! in sparse regions then receive wider kernels and observations in dense
//! regions narrower ones.
//!
//! ## Design notes
//!
//! * **Whitening**: Points are centred and scaled by the per-axis standard
//!   deviation (`fast_covariance`) or by the inverse Cholesky factor of the
//!   full sample covariance. Densities are reported in original units by
//!   multiplying with the Jacobian of that transform.
//! * **Adaptivity**: `λᵢ = (pilotᵢ / g)^(-sensitivity)` with `g` the geometric
//!   mean of the pilot densities; kernel `i` has width `bandwidth · λᵢ`.
//! * **Parallelism**: The O(n²) pilot pass runs on rayon under the `cpu` feature.
//! * **Determinism**: Every per-point sum runs in observation order, so the
//!   result never depends on thread scheduling.
//!
//! ## Key concepts
//!
//! * **DensityModel**: The read-only evaluation contract shared with worker threads.
//! * **AdaptiveKde**: The fitted model; immutable, `Send + Sync`, clonable.
//!
//! ## Invariants
//!
//! * `predict(x).len() == x.len()` and every output is ≥ 0.
//! * Fitting needs at least two distinct points. A single flat axis (a
//!   horizontal or vertical line of events) is whitened with unit scale; only
//!   full-covariance whitening of a slanted line is singular.
//!
//! ## Non-goals
//!
//! * This module does not truncate kernels or use spatial indexing.
//! * This module does not select the bandwidth automatically.

// External dependencies
use num_traits::Float;
use std::f64::consts::PI;
use std::fmt::Debug;
use tracing::debug;

// Internal dependencies
use crate::primitives::errors::DensityError;
use crate::primitives::geometry::{Point, PointCloud};
use crate::primitives::parallel::map_range;

/// Default global bandwidth (whitened units).
pub const DEFAULT_BANDWIDTH: f64 = 0.1;

/// Default adaptive sensitivity.
pub const DEFAULT_SENSITIVITY: f64 = 0.999;

// ============================================================================
// Density Model Contract
// ============================================================================

/// A fitted density model that can be evaluated concurrently.
///
/// Implementations must be side-effect free: `predict_into` may be called
/// from many worker threads at once on disjoint output slices.
pub trait DensityModel<T: Float>: Send + Sync {
    /// Write the density at each of `points` into the matching slot of `out`.
    ///
    /// `out.len()` equals `points.len()`.
    fn predict_into(&self, points: &[Point<T>], out: &mut [T]);

    /// Density at each of `points`, in input order.
    fn predict(&self, points: &[Point<T>]) -> Vec<T> {
        let mut out = vec![T::zero(); points.len()];
        self.predict_into(points, &mut out);
        out
    }
}

// ============================================================================
// Parameters
// ============================================================================

/// Hyperparameters of the adaptive KDE.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KdeParams<T> {
    /// Global smoothing scale in whitened units.
    pub bandwidth: T,
    /// Adaptive exponent in `[0, 1]`; 0 disables adaptivity.
    pub sensitivity: T,
    /// Whiten with the covariance diagonal only.
    pub fast_covariance: bool,
}

impl<T: Float> Default for KdeParams<T> {
    fn default() -> Self {
        Self {
            bandwidth: T::from(DEFAULT_BANDWIDTH).unwrap_or_else(T::one),
            sensitivity: T::from(DEFAULT_SENSITIVITY).unwrap_or_else(T::one),
            fast_covariance: true,
        }
    }
}

impl<T: Float> KdeParams<T> {
    /// Check parameter bounds.
    pub fn validate(&self) -> Result<(), DensityError> {
        if !(self.bandwidth.is_finite() && self.bandwidth > T::zero()) {
            return Err(DensityError::InvalidBandwidth(
                self.bandwidth.to_f64().unwrap_or(f64::NAN),
            ));
        }
        if !(self.sensitivity >= T::zero() && self.sensitivity <= T::one()) {
            return Err(DensityError::InvalidSensitivity(
                self.sensitivity.to_f64().unwrap_or(f64::NAN),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Density Estimator
// ============================================================================

/// Fits [`AdaptiveKde`] models.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DensityEstimator<T> {
    params: KdeParams<T>,
}

impl<T: Float> Default for DensityEstimator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Float> DensityEstimator<T> {
    /// Estimator with default hyperparameters.
    pub fn new() -> Self {
        Self {
            params: KdeParams::default(),
        }
    }

    /// Estimator with explicit hyperparameters.
    pub fn with_params(params: KdeParams<T>) -> Self {
        Self { params }
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

    /// Choose diagonal (`true`) or full (`false`) covariance whitening.
    pub fn fast_covariance(mut self, enabled: bool) -> Self {
        self.params.fast_covariance = enabled;
        self
    }

    /// Current hyperparameters.
    pub fn params(&self) -> &KdeParams<T> {
        &self.params
    }
}

impl<T: Float + Send + Sync + Debug> DensityEstimator<T> {
    /// Fit the adaptive model on `cloud`.
    pub fn fit(&self, cloud: &PointCloud<T>) -> Result<AdaptiveKde<T>, DensityError> {
        self.params.validate()?;
        if cloud.is_empty() {
            return Err(DensityError::EmptyInput);
        }
        if !cloud.has_distinct_points() {
            return Err(DensityError::TooFewDistinctPoints { got: 1, min: 2 });
        }

        let whitening = Whitening::fit(cloud, self.params.fast_covariance)?;
        let centers: Vec<[T; 2]> = cloud.iter().map(|p| whitening.apply(p)).collect();
        let n = centers.len();
        let n_t = T::from(n).unwrap_or_else(T::one);
        let two_pi = T::from(2.0 * PI).unwrap_or_else(T::one);
        let half = T::from(0.5).unwrap_or_else(T::one);

        // Fixed-width pilot estimate at every observation
        let h = self.params.bandwidth;
        let pilot_neg = -half / (h * h);
        let pilot_coef = T::one() / (n_t * two_pi * h * h);
        let pilot: Vec<T> = map_range(0..n, |i| {
            let [zx, zy] = centers[i];
            let sum = centers.iter().fold(T::zero(), |acc, &[cx, cy]| {
                let dx = zx - cx;
                let dy = zy - cy;
                acc + (pilot_neg * (dx * dx + dy * dy)).exp()
            });
            sum * pilot_coef
        });

        // Geometric mean in log space
        let log_pilot: Vec<T> = pilot.iter().map(|p| p.ln()).collect();
        let log_g = log_pilot.iter().fold(T::zero(), |acc, &l| acc + l) / n_t;

        let jacobian = whitening.jacobian();
        let alpha = self.params.sensitivity;
        let kernels: Vec<Kernel<T>> = centers
            .iter()
            .zip(&log_pilot)
            .map(|(&[cx, cy], &lp)| {
                let lambda = (-alpha * (lp - log_g)).exp();
                let width = h * lambda;
                let var = width * width;
                Kernel {
                    cx,
                    cy,
                    neg_half_inv_var: -half / var,
                    coef: jacobian / (n_t * two_pi * var),
                    width,
                }
            })
            .collect();

        debug!(
            points = n,
            geometric_mean = log_g.exp().to_f64().unwrap_or(f64::NAN),
            "adaptive kde fitted"
        );

        Ok(AdaptiveKde {
            params: self.params,
            whitening,
            kernels,
        })
    }
}

// ============================================================================
// Whitening
// ============================================================================

/// Linear transform mapping the cloud to unit (co)variance.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Whitening<T> {
    Diagonal {
        mean: [T; 2],
        inv_std: [T; 2],
    },
    Cholesky {
        mean: [T; 2],
        l11: T,
        l21: T,
        l22: T,
    },
}

impl<T: Float> Whitening<T> {
    fn fit(cloud: &PointCloud<T>, diagonal: bool) -> Result<Self, DensityError> {
        let n = T::from(cloud.len()).unwrap_or_else(T::one);
        let (sx, sy) = cloud
            .iter()
            .fold((T::zero(), T::zero()), |(ax, ay), p| (ax + p.x, ay + p.y));
        let mean = [sx / n, sy / n];

        // Sample covariance (n - 1 denominator)
        let (vxx, vxy, vyy) = cloud.iter().fold(
            (T::zero(), T::zero(), T::zero()),
            |(axx, axy, ayy), p| {
                let dx = p.x - mean[0];
                let dy = p.y - mean[1];
                (axx + dx * dx, axy + dx * dy, ayy + dy * dy)
            },
        );
        let dof = n - T::one();
        let (a, b, c) = (vxx / dof, vxy / dof, vyy / dof);

        let tol = T::epsilon() * T::from(1024.0).unwrap_or_else(T::one);
        let std_x = a.sqrt();
        let std_y = c.sqrt();
        let flat_x = !(std_x > tol * mean[0].abs().max(T::one()));
        let flat_y = !(std_y > tol * mean[1].abs().max(T::one()));
        if flat_x && flat_y {
            return Err(DensityError::SingularCovariance(
                "zero variance along both axes".to_string(),
            ));
        }

        // A flat axis keeps its original units
        if diagonal || flat_x || flat_y {
            let inv = |flat: bool, std: T| if flat { T::one() } else { T::one() / std };
            return Ok(Self::Diagonal {
                mean,
                inv_std: [inv(flat_x, std_x), inv(flat_y, std_y)],
            });
        }

        let rho_sq = (b * b) / (a * c);
        if !(T::one() - rho_sq > T::epsilon().sqrt()) {
            return Err(DensityError::SingularCovariance(format!(
                "points are collinear (correlation² = {})",
                rho_sq.to_f64().unwrap_or(f64::NAN)
            )));
        }
        let l11 = std_x;
        let l21 = b / l11;
        let l22 = (c - l21 * l21).sqrt();
        Ok(Self::Cholesky {
            mean,
            l11,
            l21,
            l22,
        })
    }

    #[inline]
    fn apply(&self, p: Point<T>) -> [T; 2] {
        match *self {
            Self::Diagonal { mean, inv_std } => {
                [(p.x - mean[0]) * inv_std[0], (p.y - mean[1]) * inv_std[1]]
            }
            Self::Cholesky {
                mean,
                l11,
                l21,
                l22,
            } => {
                let z1 = (p.x - mean[0]) / l11;
                let z2 = (p.y - mean[1] - l21 * z1) / l22;
                [z1, z2]
            }
        }
    }

    /// Absolute determinant of the whitening matrix.
    fn jacobian(&self) -> T {
        match *self {
            Self::Diagonal { inv_std, .. } => inv_std[0] * inv_std[1],
            Self::Cholesky { l11, l22, .. } => T::one() / (l11 * l22),
        }
    }
}

// ============================================================================
// Fitted Model
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
struct Kernel<T> {
    cx: T,
    cy: T,
    neg_half_inv_var: T,
    coef: T,
    width: T,
}

/// Fitted adaptive-bandwidth KDE.
#[derive(Debug, Clone, PartialEq)]
pub struct AdaptiveKde<T> {
    params: KdeParams<T>,
    whitening: Whitening<T>,
    kernels: Vec<Kernel<T>>,
}

impl<T: Float> AdaptiveKde<T> {
    /// Number of observations (kernels) in the model.
    pub fn len(&self) -> usize {
        self.kernels.len()
    }

    /// Whether the model holds no kernels (never true for a fitted model).
    pub fn is_empty(&self) -> bool {
        self.kernels.is_empty()
    }

    /// Hyperparameters the model was fitted with.
    pub fn params(&self) -> &KdeParams<T> {
        &self.params
    }

    /// Per-observation kernel widths in whitened units, in input order.
    pub fn bandwidths(&self) -> Vec<T> {
        self.kernels.iter().map(|k| k.width).collect()
    }

    /// Density at a single point.
    #[inline]
    pub fn density_at(&self, p: Point<T>) -> T {
        let [zx, zy] = self.whitening.apply(p);
        self.kernels.iter().fold(T::zero(), |acc, k| {
            let dx = zx - k.cx;
            let dy = zy - k.cy;
            acc + k.coef * (k.neg_half_inv_var * (dx * dx + dy * dy)).exp()
        })
    }
}

impl<T: Float + Send + Sync> DensityModel<T> for AdaptiveKde<T> {
    fn predict_into(&self, points: &[Point<T>], out: &mut [T]) {
        for (slot, &p) in out.iter_mut().zip(points) {
            *slot = self.density_at(p);
        }
    }
}
