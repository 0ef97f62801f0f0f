//! Layer 3: Engine
//!
//! ## Purpose
//!
//! This layer provides the parallel execution engine that evaluates a fitted
//! density model over the full evaluation lattice using chunked, rayon-based
//! worker pools.
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
//! Layer 3: Engine ← You are here
//!   ↓
//! Layer 2: Math
//!   ↓
//! Layer 1: Primitives
//! ```

/// Parallel grid evaluator (ParallelGridEvaluator).
pub mod executor;
