//! Engine module containing array abstractions and compute backends

pub mod array;
pub mod backend;

pub use array::{Complex64, WaveArray};
pub use backend::{create_backend, BackendKind, ComputeBackend};
