//! Grid descriptor and region of interest
//!
//! A [`Grid`] describes the padded simulation window: its shape, the spatial
//! axes and the matching spatial-frequency axes used by the spectral
//! Green's function. A [`Roi`] marks the physical sub-area inside the padding.

use crate::error::{Result, WaveSimError};
use ndarray::Array1;
use std::f64::consts::PI;
use std::fmt;
use std::ops::Range;

/// Immutable description of the padded simulation grid
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    /// Overall padded size (rows, columns)
    pub shape: (usize, usize),
    /// Pixel size, in the same unit as the wavelength
    pub pixel_size: f64,
    /// Spatial coordinates along axis 0
    pub x: Array1<f64>,
    /// Spatial coordinates along axis 1
    pub y: Array1<f64>,
    /// Angular spatial frequencies along axis 0
    pub px: Array1<f64>,
    /// Angular spatial frequencies along axis 1
    pub py: Array1<f64>,
}

impl Grid {
    /// Build a grid with uniform `pixel_size` and origin at index 0
    pub fn new(shape: (usize, usize), pixel_size: f64) -> Result<Self> {
        if shape.0 == 0 || shape.1 == 0 {
            return Err(WaveSimError::invalid(
                "shape",
                format!("grid must be non-empty, got {shape:?}"),
            ));
        }
        if !(pixel_size.is_finite() && pixel_size > 0.0) {
            return Err(WaveSimError::invalid(
                "pixel_size",
                format!("must be finite and > 0, got {pixel_size}"),
            ));
        }

        Ok(Self {
            shape,
            pixel_size,
            x: Array1::from_shape_fn(shape.0, |i| i as f64 * pixel_size),
            y: Array1::from_shape_fn(shape.1, |j| j as f64 * pixel_size),
            px: frequency_axis(shape.0, pixel_size),
            py: frequency_axis(shape.1, pixel_size),
        })
    }

    /// Region covering the entire grid
    pub fn full_roi(&self) -> Roi {
        Roi::new(0..self.shape.0, 0..self.shape.1)
    }
}

/// Angular frequencies `2π·k/(n·d)` in FFT order: `[0, 1, ..., -2, -1]`
pub fn frequency_axis(n: usize, d: f64) -> Array1<f64> {
    Array1::from_shape_fn(n, |i| {
        let freq = if i < n.div_ceil(2) {
            i as f64
        } else {
            i as f64 - n as f64
        };
        2.0 * PI * freq / (n as f64 * d)
    })
}

/// Index ranges of the physical region inside the padded grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roi {
    /// Row range (axis 0)
    pub rows: Range<usize>,
    /// Column range (axis 1)
    pub cols: Range<usize>,
}

impl Roi {
    /// Create a region from row and column ranges
    pub fn new(rows: Range<usize>, cols: Range<usize>) -> Self {
        Self { rows, cols }
    }

    /// Region of `shape` placed at `offset`
    pub fn from_offset(offset: (usize, usize), shape: (usize, usize)) -> Self {
        Self::new(offset.0..offset.0 + shape.0, offset.1..offset.1 + shape.1)
    }

    /// Shape of the region (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.cols.len())
    }

    /// First corner, inclusive
    pub fn start(&self) -> [usize; 2] {
        [self.rows.start, self.cols.start]
    }

    /// Last corner, exclusive
    pub fn stop(&self) -> [usize; 2] {
        [self.rows.end, self.cols.end]
    }

    /// Check the region is non-empty and inside a grid of `shape`
    pub fn validate(&self, shape: (usize, usize)) -> Result<()> {
        let fits = self.rows.start < self.rows.end
            && self.cols.start < self.cols.end
            && self.rows.end <= shape.0
            && self.cols.end <= shape.1;
        if fits {
            Ok(())
        } else {
            Err(WaveSimError::RoiOutOfBounds {
                roi: self.to_string(),
                shape,
            })
        }
    }
}

impl fmt::Display for Roi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}..{}, {}..{}]",
            self.rows.start, self.rows.end, self.cols.start, self.cols.end
        )
    }
}
