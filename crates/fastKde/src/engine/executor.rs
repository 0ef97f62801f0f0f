//! Parallel execution engine for lattice evaluation.
//!
//! ## Purpose
//!
//! This module evaluates a fitted density model over every point of an
//! evaluation lattice. The lattice is split into contiguous chunks and each
//! chunk is evaluated as an independent task on a fixed-size worker pool,
//! utilizing all available CPU cores.
//!
//! ## Design notes
//!
//! * **Pre-allocated output**: The result buffer is allocated once and split
//!   into disjoint chunk slices; every task writes only to its own offset.
//! * **Parallelism**: Uses a dedicated `rayon` thread pool (`cpu` feature).
//! * **Buffer reuse**: Each worker keeps a thread-local point buffer of at most
//!   `chunk_size` points, so lattice points are generated lazily.
//! * **Fail-fast**: The first failing chunk aborts the evaluation.
//!
//! ## Key concepts
//!
//! * **Chunk**: A contiguous range of lattice indices `[k·B, (k+1)·B)`.
//! * **Worker contract**: The model is shared by `&` reference (`DensityModel: Send + Sync`).
//! * **Cancellation**: The token is checked before every chunk starts.
//!
//! ## Invariants
//!
//! * Output order equals lattice generation order, independent of scheduling.
//! * Chunk size never changes the numerical result.
//! * A failed or cancelled evaluation returns no partial output.
//!
//! ## Non-goals
//!
//! * This module does not retry failed chunks (left to the caller).
//! * This module does not stream partial results.

// Feature-gated imports
#[cfg(feature = "cpu")]
use rayon::prelude::*;

// External dependencies
use num_traits::Float;
use std::any::Any;
use std::fmt::Debug;
use std::num::NonZeroUsize;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info};

// Internal dependencies
use crate::math::grid::Grid;
use crate::math::kde::DensityModel;
use crate::primitives::cancel::CancellationToken;
use crate::primitives::errors::DensityError;
use crate::primitives::geometry::Point;

/// Default number of lattice points per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 50_000;

/// Number of worker threads used when none is configured.
pub fn available_workers() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

// ============================================================================
// Parallel Grid Evaluator
// ============================================================================

/// Chunked, optionally parallel evaluator for density models.
#[derive(Debug, Clone)]
pub struct ParallelGridEvaluator {
    chunk_size: usize,
    workers: Option<usize>,
    parallel: bool,
    cancel: CancellationToken,
}

impl Default for ParallelGridEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl ParallelGridEvaluator {
    /// Evaluator with the default chunk size, one worker per core.
    pub fn new() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            workers: None,
            parallel: true,
            cancel: CancellationToken::new(),
        }
    }

    /// Set the number of lattice points per chunk.
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Set a fixed worker count.
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    /// Enable or disable the worker pool.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Attach a cancellation token.
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Configured chunk size.
    pub fn get_chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Evaluate `model` at every lattice point of `grid`, row-major.
    pub fn evaluate_grid<T, M>(&self, model: &M, grid: &Grid<T>) -> Result<Vec<T>, DensityError>
    where
        T: Float + Debug + Send + Sync,
        M: DensityModel<T> + ?Sized,
    {
        self.run(model, grid.len(), |i| grid.point(i))
    }

    /// Evaluate `model` at an explicit list of points.
    pub fn evaluate_points<T, M>(
        &self,
        model: &M,
        points: &[Point<T>],
    ) -> Result<Vec<T>, DensityError>
    where
        T: Float + Debug + Send + Sync,
        M: DensityModel<T> + ?Sized,
    {
        self.run(model, points.len(), |i| points[i])
    }

    fn validate(&self) -> Result<(), DensityError> {
        if self.chunk_size == 0 {
            return Err(DensityError::InvalidChunkSize { got: 0, min: 1 });
        }
        if self.workers == Some(0) {
            return Err(DensityError::InvalidConfig(
                "workers must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    fn run<T, M, P>(&self, model: &M, len: usize, point_at: P) -> Result<Vec<T>, DensityError>
    where
        T: Float + Debug + Send + Sync,
        M: DensityModel<T> + ?Sized,
        P: Fn(usize) -> Point<T> + Sync + Send,
    {
        self.validate()?;
        if len == 0 {
            return Ok(Vec::new());
        }

        let total = len.div_ceil(self.chunk_size);
        info!(
            points = len,
            chunks = total,
            chunk_size = self.chunk_size,
            parallel = self.parallel,
            "evaluating density lattice"
        );

        #[cfg(feature = "cpu")]
        {
            if self.parallel {
                return self.run_parallel(model, len, total, &point_at);
            }
        }
        self.run_sequential(model, len, total, &point_at)
    }

    #[cfg(feature = "cpu")]
    fn run_parallel<T, M, P>(
        &self,
        model: &M,
        len: usize,
        total: usize,
        point_at: &P,
    ) -> Result<Vec<T>, DensityError>
    where
        T: Float + Debug + Send + Sync,
        M: DensityModel<T> + ?Sized,
        P: Fn(usize) -> Point<T> + Sync + Send,
    {
        let threads = self.workers.unwrap_or_else(available_workers);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("fastkde-eval-{}", i))
            .build()
            .map_err(|e| DensityError::WorkerPool(e.to_string()))?;
        debug!(workers = threads, "worker pool ready");

        let chunk_size = self.chunk_size;
        let buffer_capacity = chunk_size.min(len);
        let completed = AtomicUsize::new(0);
        let mut out = vec![T::zero(); len];

        pool.install(|| {
            out.par_chunks_mut(chunk_size).enumerate().try_for_each_init(
                || Vec::with_capacity(buffer_capacity),
                |buffer, (chunk_idx, slot)| {
                    self.evaluate_chunk(
                        model,
                        point_at,
                        chunk_idx,
                        slot,
                        buffer,
                        &completed,
                        total,
                    )
                },
            )
        })?;

        Ok(out)
    }

    fn run_sequential<T, M, P>(
        &self,
        model: &M,
        len: usize,
        total: usize,
        point_at: &P,
    ) -> Result<Vec<T>, DensityError>
    where
        T: Float + Debug + Send + Sync,
        M: DensityModel<T> + ?Sized,
        P: Fn(usize) -> Point<T> + Sync + Send,
    {
        let completed = AtomicUsize::new(0);
        let mut buffer = Vec::with_capacity(self.chunk_size.min(len));
        let mut out = vec![T::zero(); len];

        for (chunk_idx, slot) in out.chunks_mut(self.chunk_size).enumerate() {
            self.evaluate_chunk(
                model,
                point_at,
                chunk_idx,
                slot,
                &mut buffer,
                &completed,
                total,
            )?;
        }

        Ok(out)
    }

    /// Evaluate one chunk into its output slice.
    #[allow(clippy::too_many_arguments)]
    fn evaluate_chunk<T, M, P>(
        &self,
        model: &M,
        point_at: &P,
        chunk_idx: usize,
        slot: &mut [T],
        buffer: &mut Vec<Point<T>>,
        completed: &AtomicUsize,
        total: usize,
    ) -> Result<(), DensityError>
    where
        T: Float + Debug + Send + Sync,
        M: DensityModel<T> + ?Sized,
        P: Fn(usize) -> Point<T> + Sync + Send,
    {
        if self.cancel.is_cancelled() {
            return Err(DensityError::Cancelled {
                completed: completed.load(Ordering::Relaxed),
                total,
            });
        }

        let start = chunk_idx * self.chunk_size;
        buffer.clear();
        buffer.extend((start..start + slot.len()).map(point_at));

        let points = buffer.as_slice();
        panic::catch_unwind(AssertUnwindSafe(|| model.predict_into(points, slot))).map_err(
            |payload| DensityError::ChunkFailed {
                chunk: chunk_idx,
                reason: panic_message(payload.as_ref()),
            },
        )?;

        if let Some(pos) = slot
            .iter()
            .position(|v| !(v.is_finite() && *v >= T::zero()))
        {
            return Err(DensityError::ChunkFailed {
                chunk: chunk_idx,
                reason: format!(
                    "invalid density {:?} at lattice index {}",
                    slot[pos],
                    start + pos
                ),
            });
        }

        completed.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

/// Best-effort text of a panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "worker panicked".to_string()
    }
}
