//! Core array type for wave simulations
//!
//! This module provides the fundamental 2D array type used throughout the library.
//! It wraps ndarray for efficient numerical operations with complex numbers.

use ndarray::{s, Array2};
use num_complex::Complex;
use num_traits::Zero;
use std::ops::Mul;

/// Type alias for Complex64
pub type Complex64 = Complex<f64>;

/// The main array type for wave simulations
#[derive(Debug, Clone, PartialEq)]
pub struct WaveArray<T = Complex64> {
    /// The underlying ndarray
    pub data: Array2<T>,
}

impl<T> WaveArray<T>
where
    T: Clone + Zero,
{
    /// Create a new array with zeros
    pub fn zeros(shape: (usize, usize)) -> Self {
        Self {
            data: Array2::zeros(shape),
        }
    }

    /// Create a new array from a scalar value
    pub fn from_scalar(shape: (usize, usize), value: T) -> Self {
        Self {
            data: Array2::from_elem(shape, value),
        }
    }

    /// Get the shape of the array
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    /// Get the shape as a tuple
    pub fn shape_tuple(&self) -> (usize, usize) {
        self.data.dim()
    }
}

impl WaveArray<Complex64> {
    /// Sum of squared magnitudes over all elements
    pub fn norm_squared(&self) -> f64 {
        self.data.iter().map(|c| c.norm_sqr()).sum()
    }

    /// Largest magnitude over all elements
    pub fn max_norm(&self) -> f64 {
        self.data.iter().fold(0.0_f64, |acc, c| acc.max(c.norm()))
    }

    /// True when every element is exactly zero
    pub fn is_all_zero(&self) -> bool {
        self.data.iter().all(|c| c.is_zero())
    }
}

impl Mul<Complex64> for WaveArray<Complex64> {
    type Output = Self;

    fn mul(self, scalar: Complex64) -> Self {
        Self {
            data: &self.data * scalar,
        }
    }
}

/// Trait for rectangular sub-array access
pub trait ArraySlice {
    /// Copy out the block `[start, stop)`
    fn slice(&self, start: [usize; 2], stop: [usize; 2]) -> Self;

    /// Overwrite the block starting at `start` with `block`
    fn write_block(&mut self, start: [usize; 2], block: &Self);
}

impl ArraySlice for WaveArray<Complex64> {
    fn slice(&self, start: [usize; 2], stop: [usize; 2]) -> Self {
        Self {
            data: self
                .data
                .slice(s![start[0]..stop[0], start[1]..stop[1]])
                .to_owned(),
        }
    }

    fn write_block(&mut self, start: [usize; 2], block: &Self) {
        let (rows, cols) = block.shape_tuple();
        self.data
            .slice_mut(s![start[0]..start[0] + rows, start[1]..start[1] + cols])
            .assign(&block.data);
    }
}
