//! Layer 6: Adapters
//!
//! ## Purpose
//!
//! This layer sequences the lower layers into a complete per-dataset run:
//! events in, persisted raster and classified query columns out.
//!
//! ## Architecture
//!
//! ```text
//! Layer 7: API
//!   ↓
//! Layer 6: Adapters ← You are here
//!   ↓
//! Layer 5: Evaluation
//!   ↓
//! Layer 4: Raster
//!   ↓
//! Layer 3: Engine
//!   ↓
//! Layer 2: Math
//!   ↓
//! Layer 1: Primitives
//! ```

/// In-memory batch pipeline.
pub mod batch;
