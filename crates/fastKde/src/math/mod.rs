//! Layer 2: Math
//!
//! ## Purpose
//!
//! This layer provides the numerical building blocks: the evaluation
//! lattice and the adaptive-bandwidth kernel density model.
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
//! Layer 4: Raster
//!   ↓
//! Layer 3: Engine
//!   ↓
//! Layer 2: Math ← You are here
//!   ↓
//! Layer 1: Primitives
//! ```

/// Evaluation lattice (GridBuilder).
pub mod grid;

/// Adaptive-bandwidth KDE (DensityEstimator).
pub mod kde;
