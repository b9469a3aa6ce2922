//! Domain module for the Modified Born Series solver

pub mod convergence;
pub mod embedding;
pub mod grid;
pub mod iteration;
pub mod medium;
pub mod operator;
pub mod progress;
pub mod simulation;

pub use grid::{Grid, Roi};
pub use medium::{Medium, PaddedMedium};
pub use operator::BornOperator;
pub use simulation::{BornSimulation, ConvergenceStatus, SimulationParams, SimulationResult};
