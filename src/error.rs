//! Error types for simulation setup.
//!
//! Only configuration problems are errors. Convergence outcomes (not
//! converged, cancelled, diverged) are reported through
//! [`ConvergenceStatus`](crate::domain::simulation::ConvergenceStatus).

use thiserror::Error;

/// Errors that can occur while configuring or starting a simulation.
#[derive(Debug, Error)]
pub enum WaveSimError {
    /// Two arrays that must share a shape do not.
    #[error("shape mismatch for {what}: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        /// Which array was checked
        what: &'static str,
        /// Expected shape (rows, columns)
        expected: (usize, usize),
        /// Actual shape (rows, columns)
        got: (usize, usize),
    },

    /// Wavelength is invalid (must be finite and > 0).
    #[error("invalid wavelength: {wavelength} (must be finite and > 0)")]
    InvalidWavelength {
        /// The invalid wavelength
        wavelength: f64,
    },

    /// A configuration value is out of range.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter {
        /// Parameter name
        name: &'static str,
        /// Why it was rejected
        reason: String,
    },

    /// Region of interest does not fit inside the grid.
    #[error("region of interest {roi} does not fit in grid of shape {shape:?}")]
    RoiOutOfBounds {
        /// Display form of the offending region
        roi: String,
        /// Grid shape (rows, columns)
        shape: (usize, usize),
    },

    /// Parameters could not be parsed.
    #[error("failed to parse configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// Parameters file could not be read.
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized `Result` type for simulation setup.
pub type Result<T> = std::result::Result<T, WaveSimError>;

impl WaveSimError {
    /// Returns `true` for shape, range and ROI problems detected before any
    /// iteration runs.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            WaveSimError::ShapeMismatch { .. }
                | WaveSimError::InvalidWavelength { .. }
                | WaveSimError::InvalidParameter { .. }
                | WaveSimError::RoiOutOfBounds { .. }
        )
    }

    /// Returns `true` if this is a shape mismatch.
    pub fn is_shape_error(&self) -> bool {
        matches!(self, WaveSimError::ShapeMismatch { .. })
    }

    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        WaveSimError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}
