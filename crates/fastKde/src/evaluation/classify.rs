//! Population statistics for sampled densities.
//!
//! ## Purpose
//!
//! This module converts the sampled densities of one dataset into comparable
//! metrics: a z-score, an integer percentile rank and a human-readable
//! percentile label. All statistics are relative to the population of
//! sampled values, never to the grid.
//!
//! ## Design notes
//!
//! * **Population std**: z-scores use the `n` denominator.
//! * **Percentile edges**: 101 linearly interpolated quantiles `e_0..e_100`;
//!   a value's rank is the smallest `k` with `value <= e_k`.
//! * **Ties**: Equal values always receive equal ranks.
//!
//! ## Invariants
//!
//! * Output sequences have the input's length and order.
//! * Zero variance yields z-scores of exactly 0.0.
//! * Ranks are monotonic non-decreasing in the value and lie in `[0, 100]`.
//!
//! ## Non-goals
//!
//! * This module does not reproduce any other library's bin tie-breaking.
//! * This module does not choose business thresholds.

// External dependencies
use num_traits::Float;
use std::cmp::Ordering::Equal;

/// Number of percentile edges (0 through 100).
pub const PERCENTILE_EDGES: usize = 101;

// ============================================================================
// Classification
// ============================================================================

/// Per-value statistics, aligned with the input order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Classification<T> {
    /// Standard scores.
    pub zscores: Vec<T>,
    /// Percentile ranks in `[0, 100]`.
    pub percentiles: Vec<u8>,
    /// Labels such as `"21st Percentile"`.
    pub labels: Vec<String>,
}

impl<T> Classification<T> {
    /// Number of classified values.
    pub fn len(&self) -> usize {
        self.zscores.len()
    }

    /// Whether nothing was classified.
    pub fn is_empty(&self) -> bool {
        self.zscores.is_empty()
    }
}

/// Classifies a population of sampled densities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatisticalClassifier;

impl StatisticalClassifier {
    /// Create a classifier.
    pub fn new() -> Self {
        Self
    }

    /// Z-score, percentile rank and label for every value.
    pub fn classify<T: Float>(&self, values: &[T]) -> Classification<T> {
        let zscores = zscores(values);
        let edges = percentile_edges(values);
        let percentiles: Vec<u8> = values
            .iter()
            .map(|&v| percentile_rank(&edges, v))
            .collect();
        let labels = percentiles.iter().map(|&p| percentile_label(p)).collect();
        Classification {
            zscores,
            percentiles,
            labels,
        }
    }
}

// ============================================================================
// Statistics
// ============================================================================

/// `(mean, population std)` of `values`; `(0, 0)` when empty.
pub fn mean_std<T: Float>(values: &[T]) -> (T, T) {
    if values.is_empty() {
        return (T::zero(), T::zero());
    }
    let n = T::from(values.len()).unwrap_or_else(T::one);
    let mean = values.iter().fold(T::zero(), |acc, &v| acc + v) / n;
    let var = values.iter().fold(T::zero(), |acc, &v| {
        let d = v - mean;
        acc + d * d
    }) / n;
    (mean, var.sqrt())
}

/// Standard scores against the population of `values`.
///
/// A population with zero spread scores 0.0 everywhere.
pub fn zscores<T: Float>(values: &[T]) -> Vec<T> {
    let (mean, std) = mean_std(values);
    // Identical values can leave a rounding-level std behind
    let constant = values.windows(2).all(|w| w[0] == w[1]);
    if constant || !(std > T::zero()) {
        return vec![T::zero(); values.len()];
    }
    values.iter().map(|&v| (v - mean) / std).collect()
}

/// The 101 linearly interpolated quantiles of `values`; empty for no values.
pub fn percentile_edges<T: Float>(values: &[T]) -> Vec<T> {
    if values.is_empty() {
        return Vec::new();
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Equal));

    let last = sorted.len() - 1;
    (0..PERCENTILE_EDGES)
        .map(|k| {
            // Position k/100 of the way through the sorted values
            let num = k * last;
            let lo = num / 100;
            let rem = num % 100;
            if rem == 0 || lo >= last {
                sorted[lo]
            } else {
                let frac = T::from(rem).unwrap_or_else(T::zero)
                    / T::from(100).unwrap_or_else(T::one);
                (sorted[lo] + (sorted[lo + 1] - sorted[lo]) * frac).min(sorted[lo + 1])
            }
        })
        .collect()
}

/// Smallest `k` with `value <= edges[k]`, capped at 100.
pub fn percentile_rank<T: Float>(edges: &[T], value: T) -> u8 {
    let k = edges.partition_point(|&e| e < value);
    k.min(PERCENTILE_EDGES - 1) as u8
}

// ============================================================================
// Labels
// ============================================================================

/// English ordinal suffix for `n`.
pub fn ordinal_suffix(n: u32) -> &'static str {
    match (n % 100, n % 10) {
        (10..=13, _) => "th",
        (_, 1) => "st",
        (_, 2) => "nd",
        (_, 3) => "rd",
        _ => "th",
    }
}

/// `"{n}{suffix} Percentile"`.
pub fn percentile_label(n: u8) -> String {
    format!("{}{} Percentile", n, ordinal_suffix(u32::from(n)))
}
