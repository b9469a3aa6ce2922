//! Field update for the Modified Born Series
//!
//! One step maps the current estimate `E` to
//!
//! ```text
//! E' = E − γ ⊙ (E − IFFT(G ⊙ FFT(V ⊙ E + S)))      with γ = iV/ε
//! ```
//!
//! The engine does not decide when to stop; see
//! [`crate::domain::convergence`].

use crate::domain::grid::Roi;
use crate::domain::operator::BornOperator;
use crate::engine::array::{Complex64, WaveArray};
use crate::engine::backend::ComputeBackend;
use ndarray::s;

/// Mutable state of one run
#[derive(Debug, Clone)]
pub struct RunState {
    /// Current field estimate
    pub field: WaveArray<Complex64>,
    /// Number of steps applied so far
    pub iteration: usize,
    /// Work buffer; holds the previous estimate after each step
    scratch: WaveArray<Complex64>,
}

impl RunState {
    /// Fresh all-zero state
    pub fn new(shape: (usize, usize)) -> Self {
        Self {
            field: WaveArray::zeros(shape),
            iteration: 0,
            scratch: WaveArray::zeros(shape),
        }
    }

    /// Estimate before the last step (all zero before the first one)
    pub fn previous(&self) -> &WaveArray<Complex64> {
        &self.scratch
    }

    /// Energy of the last update, `sum |E_n − E_{n−1}|²`, restricted to `roi`
    pub fn added_energy(&self, backend: &dyn ComputeBackend, roi: &Roi) -> f64 {
        backend.difference_energy(
            self.field
                .data
                .slice(s![roi.rows.clone(), roi.cols.clone()]),
            self.scratch
                .data
                .slice(s![roi.rows.clone(), roi.cols.clone()]),
        )
    }

    /// Consume the state, keeping the field
    pub fn into_field(self) -> WaveArray<Complex64> {
        self.field
    }
}

/// Applies Born steps with a fixed operator and backend
pub struct IterationEngine<'a> {
    operator: &'a BornOperator,
    backend: &'a dyn ComputeBackend,
    differential_mode: bool,
}

impl<'a> IterationEngine<'a> {
    /// Create an engine.
    ///
    /// In differential mode the source is only injected on the first step,
    /// so later steps track the incremental contribution alone.
    pub fn new(
        operator: &'a BornOperator,
        backend: &'a dyn ComputeBackend,
        differential_mode: bool,
    ) -> Self {
        Self {
            operator,
            backend,
            differential_mode,
        }
    }

    /// Apply one update to `state` in place
    pub fn step(&self, state: &mut RunState, source: &WaveArray<Complex64>) {
        let source = if self.differential_mode && state.iteration > 0 {
            None
        } else {
            Some(&source.data)
        };

        let op = self.operator;
        let work = &mut state.scratch.data;

        // work = V E + S
        self.backend
            .multiply_add(&op.potential.data, &state.field.data, source, work);
        // work = G * (V E + S), applied in Fourier space
        self.backend.fft_2d(work);
        self.backend.multiply_assign(work, &op.greens.data);
        self.backend.ifft_2d(work);
        // work = E + γ (work − E)
        self.backend.relax(&state.field.data, &op.gamma.data, work);

        std::mem::swap(&mut state.field, &mut state.scratch);
        state.iteration += 1;
    }

    /// Backend this engine runs on
    pub fn backend(&self) -> &dyn ComputeBackend {
        self.backend
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::medium::{Medium, PaddedMedium};
    use crate::engine::backend::{create_backend, BackendKind};
    use approx::assert_abs_diff_eq;

    fn setup() -> (PaddedMedium, BornOperator, Box<dyn ComputeBackend>) {
        let medium = PaddedMedium::homogeneous((8, 8), 0.2, Complex64::new(1.0, 0.0)).unwrap();
        let op = BornOperator::build(&medium, 1.0, None).unwrap();
        let mut backend = create_backend(BackendKind::Cpu);
        backend.prepare(op.shape());
        (medium, op, backend)
    }

    #[test]
    fn test_first_step_is_greens_times_source() {
        let (_, op, backend) = setup();
        let engine = IterationEngine::new(&op, backend.as_ref(), false);

        let mut source = WaveArray::zeros((8, 8));
        source.data[[4, 4]] = Complex64::new(1.0, 0.0);

        let mut state = RunState::new((8, 8));
        engine.step(&mut state, &source);

        // γ = 1 in vacuum and E_0 = 0, so E_1 = IFFT(G FFT(S))
        let mut expected = source.data.clone();
        backend.fft_2d(&mut expected);
        backend.multiply_assign(&mut expected, &op.greens.data);
        backend.ifft_2d(&mut expected);

        assert_eq!(state.iteration, 1);
        assert!(state.previous().is_all_zero());
        for (got, want) in state.field.data.iter().zip(expected.iter()) {
            assert_abs_diff_eq!((got - want).norm(), 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_added_energy_restricted_to_roi() {
        let (medium, op, backend) = setup();
        let engine = IterationEngine::new(&op, backend.as_ref(), false);
        let mut source = WaveArray::zeros((8, 8));
        source.data[[1, 1]] = Complex64::new(1.0, 0.0);

        let mut state = RunState::new((8, 8));
        engine.step(&mut state, &source);

        let full = state.added_energy(engine.backend(), medium.roi());
        let inner = state.added_energy(engine.backend(), &Roi::new(2..6, 2..6));
        assert_abs_diff_eq!(full, state.field.norm_squared(), epsilon = 1e-12);
        assert!(inner < full);
    }

    #[test]
    fn test_differential_mode_drops_source_after_first_step() {
        let (_, op, backend) = setup();
        let mut source = WaveArray::zeros((8, 8));
        source.data[[3, 5]] = Complex64::new(0.0, 1.0);

        let plain = IterationEngine::new(&op, backend.as_ref(), false);
        let differential = IterationEngine::new(&op, backend.as_ref(), true);

        let mut a = RunState::new((8, 8));
        let mut b = RunState::new((8, 8));
        plain.step(&mut a, &source);
        differential.step(&mut b, &source);
        assert_eq!(a.field, b.field);

        // Second differential step equals a plain step with a zero source
        let zero = WaveArray::zeros((8, 8));
        let mut c = b.clone();
        differential.step(&mut b, &source);
        plain.step(&mut c, &zero);
        assert_eq!(b.field, c.field);
        assert_eq!(b.iteration, 2);
    }
}
