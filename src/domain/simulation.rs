//! High-level simulation interface
//!
//! [`BornSimulation`] owns the immutable operators and the prepared backend.
//! Each call to [`BornSimulation::exec`] allocates its own field buffers and
//! energy history, so one simulation can serve many sources, including from
//! several threads at once.

use crate::domain::convergence::{ConvergenceMonitor, Decision};
use crate::domain::embedding::{embed, extract, physical_axes};
use crate::domain::grid::{Grid, Roi};
use crate::domain::iteration::{IterationEngine, RunState};
use crate::domain::medium::Medium;
use crate::domain::operator::BornOperator;
use crate::domain::progress::{CancelToken, ProgressCallback, ProgressSnapshot};
use crate::engine::array::{Complex64, WaveArray};
use crate::engine::backend::{create_backend, BackendKind, ComputeBackend};
use crate::error::{Result, WaveSimError};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::{Duration, Instant};

/// Parameters for a Born series simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParams {
    /// Wavelength, in the same unit as the grid pixel size
    pub wavelength: f64,
    /// Damping in units of k0²; `None` uses the convergence bound
    pub forced_damping: Option<f64>,
    /// Convergence threshold as a fraction of the source energy
    pub energy_threshold: f64,
    /// Iterations between progress callbacks
    pub callback_interval: usize,
    /// Hard iteration cap
    pub max_iterations: usize,
    /// Inject the source on the first step only
    pub differential_mode: bool,
    /// Compute backend
    pub backend: BackendKind,
    /// Consecutive energy increases that flag divergence (forced damping only)
    pub divergence_window: usize,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            wavelength: 1.0,
            forced_damping: None,
            energy_threshold: 1e-20,
            callback_interval: 500,
            max_iterations: 10_000,
            differential_mode: false,
            backend: BackendKind::Cpu,
            divergence_window: 10,
        }
    }
}

impl SimulationParams {
    /// Check every field is in range
    pub fn validate(&self) -> Result<()> {
        if !(self.wavelength.is_finite() && self.wavelength > 0.0) {
            return Err(WaveSimError::InvalidWavelength {
                wavelength: self.wavelength,
            });
        }
        if let Some(damping) = self.forced_damping {
            if !(damping.is_finite() && damping > 0.0) {
                return Err(WaveSimError::invalid(
                    "forced_damping",
                    format!("must be finite and > 0, got {damping}"),
                ));
            }
        }
        if !(self.energy_threshold.is_finite() && self.energy_threshold >= 0.0) {
            return Err(WaveSimError::invalid(
                "energy_threshold",
                format!("must be finite and >= 0, got {}", self.energy_threshold),
            ));
        }
        if self.max_iterations == 0 {
            return Err(WaveSimError::invalid("max_iterations", "must be at least 1"));
        }
        if self.callback_interval == 0 {
            return Err(WaveSimError::invalid("callback_interval", "must be at least 1"));
        }
        if self.divergence_window == 0 {
            return Err(WaveSimError::invalid("divergence_window", "must be at least 1"));
        }
        Ok(())
    }

    /// Parse and validate parameters from JSON; missing fields take defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let params: Self = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    /// Load parameters from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }
}

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConvergenceStatus {
    /// Added energy fell below the threshold
    Converged,
    /// Iteration cap reached first; the field is a best-effort estimate
    NotConverged,
    /// Stopped through a [`CancelToken`]
    Cancelled,
    /// Energy kept growing with damping below the convergence bound
    Diverged,
}

impl fmt::Display for ConvergenceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConvergenceStatus::Converged => "converged",
            ConvergenceStatus::NotConverged => "not converged",
            ConvergenceStatus::Cancelled => "cancelled",
            ConvergenceStatus::Diverged => "diverged",
        };
        f.write_str(name)
    }
}

/// Result of a simulation
#[derive(Debug, Clone)]
pub struct SimulationResult {
    /// Field over the region of interest
    pub field: WaveArray<Complex64>,
    /// Zero-based coordinates of the field rows
    pub x: Array1<f64>,
    /// Zero-based coordinates of the field columns
    pub y: Array1<f64>,
    /// Source energy followed by the energy added at each iteration
    pub energy_history: Vec<f64>,
    /// Number of iterations performed
    pub iterations: usize,
    /// Wall time of the run
    pub elapsed: Duration,
    /// Termination status
    pub status: ConvergenceStatus,
    /// Absolute energy threshold that was applied
    pub threshold: f64,
    /// Damping in use
    pub epsilon: f64,
}

impl SimulationResult {
    /// Whether the threshold was reached
    pub fn is_converged(&self) -> bool {
        self.status == ConvergenceStatus::Converged
    }
}

/// A prepared Born series solver for one medium and wavelength
pub struct BornSimulation {
    operator: BornOperator,
    backend: Box<dyn ComputeBackend>,
    params: SimulationParams,
    grid: Grid,
    roi: Roi,
}

impl fmt::Debug for BornSimulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BornSimulation")
            .field("shape", &self.grid.shape)
            .field("roi", &self.roi)
            .field("backend", &self.backend.name())
            .field("epsilon", &self.operator.epsilon)
            .field("params", &self.params)
            .finish()
    }
}

impl BornSimulation {
    /// Build operators for `medium` and plan the transforms.
    ///
    /// FFT planning happens here, once; runs reuse the plans.
    pub fn new<M: Medium + ?Sized>(medium: &M, params: SimulationParams) -> Result<Self> {
        params.validate()?;
        let grid = medium.grid().clone();
        let roi = medium.roi().clone();
        roi.validate(grid.shape)?;

        let operator = BornOperator::build(medium, params.wavelength, params.forced_damping)?;
        let mut backend = create_backend(params.backend);
        backend.prepare(operator.shape());

        log::info!(
            "Born simulation ready: grid {:?}, roi {}, backend {}",
            grid.shape,
            roi,
            backend.name()
        );

        Ok(Self {
            operator,
            backend,
            params,
            grid,
            roi,
        })
    }

    /// Run to termination without callback or cancellation
    pub fn exec(&self, source: &WaveArray<Complex64>) -> Result<SimulationResult> {
        self.exec_with(source, None, None)
    }

    /// Run with an optional progress callback and cancellation token.
    ///
    /// `source` must have the shape of the region of interest. Only
    /// configuration problems are errors; every termination reason is
    /// reported in [`SimulationResult::status`].
    pub fn exec_with(
        &self,
        source: &WaveArray<Complex64>,
        mut callback: Option<&mut dyn ProgressCallback>,
        cancel: Option<&CancelToken>,
    ) -> Result<SimulationResult> {
        let start = Instant::now();
        let padded = embed(source, &self.roi, self.grid.shape)?;

        let mut monitor = ConvergenceMonitor::new(
            padded.norm_squared(),
            self.params.energy_threshold,
            self.params.max_iterations,
        );
        if !self.operator.is_convergence_guaranteed() {
            monitor = monitor.watch_divergence(self.params.divergence_window);
        }

        let mut state = RunState::new(self.grid.shape);
        let status = if monitor.is_degenerate() {
            ConvergenceStatus::Converged
        } else {
            let engine = IterationEngine::new(
                &self.operator,
                self.backend.as_ref(),
                self.params.differential_mode,
            );
            loop {
                if cancel.is_some_and(CancelToken::is_cancelled) {
                    break ConvergenceStatus::Cancelled;
                }

                engine.step(&mut state, &padded);
                let added = state.added_energy(engine.backend(), &self.roi);
                let decision = monitor.record(added);

                if let Some(cb) = callback.as_deref_mut() {
                    if state.iteration % self.params.callback_interval == 0 {
                        let snapshot = ProgressSnapshot {
                            iteration: state.iteration,
                            max_iterations: self.params.max_iterations,
                            elapsed: start.elapsed(),
                            epsilon: self.operator.epsilon,
                            k0: self.operator.k0,
                            added_energy: added,
                        };
                        cb.on_progress(
                            &snapshot,
                            &state.field,
                            monitor.history(),
                            monitor.threshold(),
                        );
                    }
                }

                match decision {
                    Decision::Continue => {}
                    Decision::Converged => break ConvergenceStatus::Converged,
                    Decision::Exhausted => break ConvergenceStatus::NotConverged,
                    Decision::Diverged => {
                        log::warn!(
                            "divergence detected at iteration {} (added energy {:.3e})",
                            state.iteration,
                            added
                        );
                        break ConvergenceStatus::Diverged;
                    }
                }
            }
        };

        let threshold = monitor.threshold();
        let iterations = monitor.iterations();
        let field = extract(&state.into_field(), &self.roi)?;
        let (x, y) = physical_axes(&self.grid, &self.roi)?;
        let elapsed = start.elapsed();

        log::info!(
            "Born series {} after {} iterations in {:.2?}",
            status,
            iterations,
            elapsed
        );

        Ok(SimulationResult {
            field,
            x,
            y,
            energy_history: monitor.into_history(),
            iterations,
            elapsed,
            status,
            threshold,
            epsilon: self.operator.epsilon,
        })
    }

    /// The immutable operators
    pub fn operator(&self) -> &BornOperator {
        &self.operator
    }

    /// The padded grid
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// The physical region inside the grid
    pub fn roi(&self) -> &Roi {
        &self.roi
    }

    /// Parameters this simulation was built with
    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    /// Name of the compute backend
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::medium::PaddedMedium;

    fn vacuum(shape: (usize, usize)) -> PaddedMedium {
        PaddedMedium::homogeneous(shape, 0.2, Complex64::new(1.0, 0.0)).unwrap()
    }

    #[test]
    fn test_default_params() {
        let params = SimulationParams::default();
        assert_eq!(params.wavelength, 1.0);
        assert_eq!(params.forced_damping, None);
        assert_eq!(params.energy_threshold, 1e-20);
        assert_eq!(params.max_iterations, 10_000);
        assert!(!params.differential_mode);
        assert_eq!(params.backend, BackendKind::Cpu);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_params_from_json_uses_defaults() {
        let params =
            SimulationParams::from_json_str(r#"{"wavelength": 0.5, "backend": "parallel"}"#)
                .unwrap();
        assert_eq!(params.wavelength, 0.5);
        assert_eq!(params.backend, BackendKind::Parallel);
        assert_eq!(params.callback_interval, 500);
    }

    #[test]
    fn test_params_validation() {
        let bad = [
            SimulationParams {
                wavelength: 0.0,
                ..Default::default()
            },
            SimulationParams {
                max_iterations: 0,
                ..Default::default()
            },
            SimulationParams {
                callback_interval: 0,
                ..Default::default()
            },
            SimulationParams {
                forced_damping: Some(-1.0),
                ..Default::default()
            },
            SimulationParams {
                energy_threshold: f64::NAN,
                ..Default::default()
            },
        ];
        for params in bad {
            let err = params.validate().unwrap_err();
            assert!(err.is_configuration_error(), "{err}");
        }

        let err = SimulationParams::from_json_str(r#"{"max_iterations": 0}"#).unwrap_err();
        assert!(err.is_configuration_error());
        let err = SimulationParams::from_json_str("not json").unwrap_err();
        assert!(matches!(err, WaveSimError::Config(_)));
    }

    #[test]
    fn test_source_shape_checked_before_iterating() {
        let sim = BornSimulation::new(&vacuum((8, 8)), SimulationParams::default()).unwrap();
        let err = sim.exec(&WaveArray::zeros((4, 8))).unwrap_err();
        assert!(err.is_shape_error());
    }

    #[test]
    fn test_accessors() {
        let sim = BornSimulation::new(&vacuum((8, 6)), SimulationParams::default()).unwrap();
        assert_eq!(sim.grid().shape, (8, 6));
        assert_eq!(sim.roi(), &Roi::new(0..8, 0..6));
        assert_eq!(sim.backend_name(), "rustfft");
        assert!(sim.operator().is_convergence_guaranteed());
        assert!(format!("{sim:?}").contains("rustfft"));
    }
}
