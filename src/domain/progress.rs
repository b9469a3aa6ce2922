//! Progress reporting and cooperative cancellation
//!
//! A [`ProgressCallback`] is invoked synchronously every `callback_interval`
//! iterations; the loop waits for it to return. It receives the field by
//! shared reference and cannot modify it.

use crate::engine::array::{Complex64, WaveArray};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Solver state passed to progress callbacks
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSnapshot {
    /// Steps completed
    pub iteration: usize,
    /// Iteration cap of this run
    pub max_iterations: usize,
    /// Wall time since the run started
    pub elapsed: Duration,
    /// Damping in use
    pub epsilon: f64,
    /// Vacuum wavenumber
    pub k0: f64,
    /// Energy added by the latest step
    pub added_energy: f64,
}

/// Receives periodic progress updates
pub trait ProgressCallback {
    /// Called with the snapshot, the current padded field, the energy
    /// history so far and the convergence threshold
    fn on_progress(
        &mut self,
        snapshot: &ProgressSnapshot,
        field: &WaveArray<Complex64>,
        energy: &[f64],
        threshold: f64,
    );
}

impl<F> ProgressCallback for F
where
    F: FnMut(&ProgressSnapshot, &WaveArray<Complex64>, &[f64], f64),
{
    fn on_progress(
        &mut self,
        snapshot: &ProgressSnapshot,
        field: &WaveArray<Complex64>,
        energy: &[f64],
        threshold: f64,
    ) {
        self(snapshot, field, energy, threshold)
    }
}

/// Progress callback that reports through the `log` facade
#[derive(Debug, Clone, Copy, Default)]
pub struct LogProgress;

impl ProgressCallback for LogProgress {
    fn on_progress(
        &mut self,
        snapshot: &ProgressSnapshot,
        _field: &WaveArray<Complex64>,
        energy: &[f64],
        threshold: f64,
    ) {
        let injected = energy.first().copied().unwrap_or(0.0);
        let relative = if injected > 0.0 {
            snapshot.added_energy / injected
        } else {
            0.0
        };
        log::info!(
            "iteration {}/{}: added energy {:.3e} (relative {:.3e}, threshold {:.3e}), {:.2?}",
            snapshot.iteration,
            snapshot.max_iterations,
            snapshot.added_energy,
            relative,
            threshold,
            snapshot.elapsed
        );
    }
}

/// Shared flag to stop a run between iterations
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// New, not cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; runs observe it before their next step
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}
