//! Layer 1: Primitives
//!
//! ## Purpose
//!
//! This layer provides the error taxonomy, geometric containers and the small
//! runtime utilities (cancellation, stage timing) used by every other layer.
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
//! Layer 2: Math
//!   ↓
//! Layer 1: Primitives ← You are here
//! ```

/// Cooperative cancellation token.
pub mod cancel;

/// Error types and taxonomy.
pub mod errors;

/// Points, point clouds and bounding boxes.
pub mod geometry;

/// Scoped stage timers.
pub mod timing;

/// Feature-gated parallel map helpers.
pub mod parallel;
