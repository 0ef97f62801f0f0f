//! Scoped stage timers.
//!
//! Each pipeline component runs inside a [`StageTimer`]: the guard enters a
//! `tracing` span named after the stage and emits the elapsed wall time when
//! dropped. Timing never alters control flow.

// External dependencies
use std::time::{Duration, Instant};
use tracing::span::EnteredSpan;
use tracing::{debug, debug_span};

/// RAII timer for one pipeline stage.
pub struct StageTimer {
    stage: &'static str,
    started: Instant,
    _span: EnteredSpan,
}

impl StageTimer {
    /// Enter the span for `stage` and start the clock.
    pub fn start(stage: &'static str) -> Self {
        let span = debug_span!("stage", name = stage).entered();
        Self {
            stage,
            started: Instant::now(),
            _span: span,
        }
    }

    /// Time elapsed since the stage started.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

impl Drop for StageTimer {
    fn drop(&mut self) {
        debug!(
            stage = self.stage,
            elapsed_ms = self.elapsed().as_secs_f64() * 1000.0,
            "stage finished"
        );
    }
}
