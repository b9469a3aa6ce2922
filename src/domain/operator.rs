//! Operator construction for the Modified Born Series
//!
//! From a medium and a wavelength this derives everything the iteration needs:
//!
//! - `k0 = 2π/λ`, `k = sqrt(ε_center)·k0`
//! - scattering potential `V = ε_r·k0² − k² − iε`
//! - damping `ε`, by default `ε_min = max|ε_r·k0² − k²|` (floored at 1e-3)
//! - spectral Green's function `G(px, py) = 1 / (px² + py² − k² − iε)`
//!
//! With `ε >= ε_min` the update in [`crate::domain::iteration`] is a
//! contraction, so the series converges.

use crate::domain::medium::Medium;
use crate::engine::array::{Complex64, WaveArray};
use crate::error::{Result, WaveSimError};
use ndarray::Array2;
use std::f64::consts::PI;

/// Lower bound on the automatic damping, keeps a vacuum medium well posed
pub const MIN_DAMPING: f64 = 1e-3;

/// Relative slack when comparing the damping against `ε_min`
const DAMPING_TOLERANCE: f64 = 1e-9;

fn meets_bound(epsilon: f64, epsilon_min: f64) -> bool {
    epsilon >= epsilon_min * (1.0 - DAMPING_TOLERANCE)
}

/// Immutable operators of one simulation
#[derive(Debug, Clone)]
pub struct BornOperator {
    /// Vacuum wavenumber `2π/λ`
    pub k0: f64,
    /// Background wavenumber `sqrt(ε_center)·k0`
    pub k: Complex64,
    /// Damping used by the iteration
    pub epsilon: f64,
    /// Smallest damping that guarantees convergence
    pub epsilon_min: f64,
    /// Scattering potential `V`, including the `−iε` shift
    pub potential: WaveArray<Complex64>,
    /// Spectral Green's function `G`
    pub greens: WaveArray<Complex64>,
    /// Step weight `iV/ε`
    pub gamma: WaveArray<Complex64>,
}

impl BornOperator {
    /// Build the operators for `medium` at `wavelength`.
    ///
    /// `forced_damping` is given in units of `k0²`; when set it replaces
    /// `ε_min` and may void the convergence guarantee.
    pub fn build<M: Medium + ?Sized>(
        medium: &M,
        wavelength: f64,
        forced_damping: Option<f64>,
    ) -> Result<Self> {
        if !(wavelength.is_finite() && wavelength > 0.0) {
            return Err(WaveSimError::InvalidWavelength { wavelength });
        }

        let grid = medium.grid();
        let permittivity = medium.permittivity();
        if permittivity.dim() != grid.shape {
            return Err(WaveSimError::ShapeMismatch {
                what: "permittivity",
                expected: grid.shape,
                got: permittivity.dim(),
            });
        }
        if grid.px.len() != grid.shape.0 || grid.py.len() != grid.shape.1 {
            return Err(WaveSimError::ShapeMismatch {
                what: "frequency axes",
                expected: grid.shape,
                got: (grid.px.len(), grid.py.len()),
            });
        }

        let k0 = 2.0 * PI / wavelength;
        let k02 = k0 * k0;
        let k = medium.center_permittivity().sqrt() * k0;
        let k2 = k * k;

        let raw = permittivity.mapv(|e| e * k02 - k2);
        let epsilon_min = raw.iter().fold(0.0_f64, |acc, v| acc.max(v.norm())).max(MIN_DAMPING);

        let epsilon = match forced_damping {
            Some(value) => {
                if !(value.is_finite() && value > 0.0) {
                    return Err(WaveSimError::invalid(
                        "forced_damping",
                        format!("must be finite and > 0, got {value}"),
                    ));
                }
                value * k02
            }
            None => epsilon_min,
        };

        if !meets_bound(epsilon, epsilon_min) {
            log::warn!(
                "damping {:.4e} is below the convergence bound {:.4e}; the series may diverge",
                epsilon,
                epsilon_min
            );
        }

        let shift = Complex64::new(0.0, epsilon);
        let potential = raw.mapv(|v| v - shift);
        let gamma = potential.mapv(|v| Complex64::i() * v / epsilon);

        let reference = k2 + shift;
        let greens = Array2::from_shape_fn(grid.shape, |(i, j)| {
            let p2 = grid.px[i] * grid.px[i] + grid.py[j] * grid.py[j];
            (Complex64::new(p2, 0.0) - reference).inv()
        });

        log::info!(
            "Born operator {:?}: k0 = {:.4}, k = {:.4}, epsilon = {:.4e} (min {:.4e})",
            grid.shape,
            k0,
            k,
            epsilon,
            epsilon_min
        );

        Ok(Self {
            k0,
            k,
            epsilon,
            epsilon_min,
            potential: WaveArray { data: potential },
            greens: WaveArray { data: greens },
            gamma: WaveArray { data: gamma },
        })
    }

    /// Grid shape the operators were built for
    pub fn shape(&self) -> (usize, usize) {
        self.potential.shape_tuple()
    }

    /// Whether the damping satisfies `ε >= ε_min`
    pub fn is_convergence_guaranteed(&self) -> bool {
        meets_bound(self.epsilon, self.epsilon_min)
    }
}
