//! WaveSim2D - 2D Helmholtz solver using the Modified Born Series
//!
//! Solves `∇²E + ε_r(x, y)·k0²·E = −S` in a heterogeneous medium by a
//! fixed-point iteration evaluated with FFT-based convolution. A simulation
//! is built once per medium and wavelength and can then be run for any
//! number of sources.

pub mod domain;
pub mod engine;
pub mod error;

// Re-export commonly used types
pub use domain::simulation::{
    BornSimulation, ConvergenceStatus, SimulationParams, SimulationResult,
};
pub use engine::array::{Complex64, WaveArray};
pub use error::{Result, WaveSimError};

pub mod prelude {
    //! Common imports for using the WaveSim2D library
    pub use crate::domain::embedding::{embed, extract, physical_axes};
    pub use crate::domain::grid::{Grid, Roi};
    pub use crate::domain::medium::{Medium, PaddedMedium};
    pub use crate::domain::operator::BornOperator;
    pub use crate::domain::progress::{
        CancelToken, LogProgress, ProgressCallback, ProgressSnapshot,
    };
    pub use crate::domain::simulation::{
        BornSimulation, ConvergenceStatus, SimulationParams, SimulationResult,
    };
    pub use crate::engine::array::{Complex64, WaveArray};
    pub use crate::engine::backend::BackendKind;
    pub use crate::error::{Result, WaveSimError};
}
