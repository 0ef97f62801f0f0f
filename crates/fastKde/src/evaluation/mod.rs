//! Layer 5: Evaluation
//!
//! ## Purpose
//!
//! This layer turns sampled densities into population statistics:
//! z-scores, percentile ranks and percentile labels.
//!
//! ## Architecture
//!
//! ```text
//! Layer 7: API
//!   ↓
//! Layer 6: Adapters
//!   ↓
//! Layer 5: Evaluation ← You are here
//!   ↓
//! Layer 4: Raster
//!   ↓
//! Layer 3: Engine
//!   ↓
//! Layer 2: Math
//!   ↓
//! Layer 1: Primitives
//! ```

/// Statistical classification (StatisticalClassifier).
pub mod classify;
