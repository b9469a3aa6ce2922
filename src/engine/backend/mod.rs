//! Compute backend abstraction layer
//!
//! This module provides an abstraction over the computational backends used
//! by the Born iteration: 2D FFTs and the handful of fused elementwise kernels
//! a step needs. It allows switching between:
//! - RustFFT (sequential) - single-threaded pure Rust implementation
//! - Rayon - the same transforms and kernels, data-parallel over rows/columns
//!
//! The backend is selected once when a simulation is constructed. FFT planning
//! happens in [`ComputeBackend::prepare`], which is a one-time cost per grid
//! shape; the per-iteration transforms reuse those plans.

use ndarray::{Array2, ArrayView2};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

mod parallel;
mod plan;
mod rustfft;

pub use self::parallel::RayonBackend;
pub use self::rustfft::RustFFTBackend;

/// Trait defining the compute backend interface
pub trait ComputeBackend: Send + Sync {
    /// Plan transforms for arrays of `shape`.
    ///
    /// Must be called once before iterating. Transforms on a shape that was
    /// not prepared still work but re-plan on every call.
    fn prepare(&mut self, shape: (usize, usize));

    /// Whether transforms for `shape` have been planned
    fn is_prepared_for(&self, shape: (usize, usize)) -> bool;

    /// In-place 2D forward FFT (unnormalized)
    fn fft_2d(&self, data: &mut Array2<Complex64>);

    /// In-place 2D inverse FFT, normalized by `1 / (rows * cols)`
    fn ifft_2d(&self, data: &mut Array2<Complex64>);

    /// `out = a * b + c`, elementwise; `c` is skipped when `None`
    fn multiply_add(
        &self,
        a: &Array2<Complex64>,
        b: &Array2<Complex64>,
        c: Option<&Array2<Complex64>>,
        out: &mut Array2<Complex64>,
    );

    /// `data *= factor`, elementwise
    fn multiply_assign(&self, data: &mut Array2<Complex64>, factor: &Array2<Complex64>);

    /// Relaxation towards a target: `target = current + weight * (target - current)`
    fn relax(
        &self,
        current: &Array2<Complex64>,
        weight: &Array2<Complex64>,
        target: &mut Array2<Complex64>,
    );

    /// `sum |a - b|^2` over two equally shaped views
    fn difference_energy(&self, a: ArrayView2<'_, Complex64>, b: ArrayView2<'_, Complex64>)
        -> f64;

    /// Return the name of the backend for debugging/logging
    fn name(&self) -> &'static str;
}

/// Backend selector, fixed at construction time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Sequential CPU backend
    #[default]
    Cpu,
    /// Data-parallel CPU backend on the rayon thread pool
    Parallel,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Cpu => write!(f, "cpu"),
            BackendKind::Parallel => write!(f, "parallel"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cpu" | "rustfft" => Ok(BackendKind::Cpu),
            "parallel" | "rayon" => Ok(BackendKind::Parallel),
            other => Err(format!("unknown backend `{other}` (expected cpu or parallel)")),
        }
    }
}

/// Create a backend of the requested kind
pub fn create_backend(kind: BackendKind) -> Box<dyn ComputeBackend> {
    match kind {
        BackendKind::Cpu => Box::new(RustFFTBackend::new()),
        BackendKind::Parallel => Box::new(RayonBackend::new()),
    }
}
