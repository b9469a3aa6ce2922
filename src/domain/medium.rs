//! Medium adapter
//!
//! The solver only needs a padded permittivity map, a reference (center)
//! permittivity, the grid it lives on and the region of interest. Anything
//! that can supply those implements [`Medium`].

use crate::domain::grid::{Grid, Roi};
use crate::engine::array::Complex64;
use crate::error::{Result, WaveSimError};
use ndarray::{s, Array2};
use std::fmt::Debug;

/// Trait defining what the operator builder reads from a medium
pub trait Medium: Debug + Send + Sync {
    /// Relative permittivity over the padded grid
    fn permittivity(&self) -> &Array2<Complex64>;

    /// Reference permittivity of the background medium
    fn center_permittivity(&self) -> Complex64;

    /// The padded grid
    fn grid(&self) -> &Grid;

    /// Physical region inside the padding
    fn roi(&self) -> &Roi;
}

/// A permittivity map on a padded grid
#[derive(Debug, Clone)]
pub struct PaddedMedium {
    permittivity: Array2<Complex64>,
    center: Complex64,
    grid: Grid,
    roi: Roi,
}

impl PaddedMedium {
    /// Wrap an already padded permittivity map.
    ///
    /// The center permittivity is the center of the bounding box of all
    /// permittivity values in the complex plane.
    pub fn new(permittivity: Array2<Complex64>, pixel_size: f64, roi: Roi) -> Result<Self> {
        let grid = Grid::new(permittivity.dim(), pixel_size)?;
        roi.validate(grid.shape)?;
        let center = bounding_center(&permittivity);
        Ok(Self {
            permittivity,
            center,
            grid,
            roi,
        })
    }

    /// Uniform medium without padding; the ROI is the whole grid
    pub fn homogeneous(shape: (usize, usize), pixel_size: f64, value: Complex64) -> Result<Self> {
        let grid = Grid::new(shape, pixel_size)?;
        let roi = grid.full_roi();
        Ok(Self {
            permittivity: Array2::from_elem(shape, value),
            center: value,
            grid,
            roi,
        })
    }

    /// Pad `physical` with absorbing layers of the given widths.
    ///
    /// `widths[axis] = [before, after]`. Padding continues the nearest edge
    /// value and adds a linear imaginary ramp of peak `strength`, which is 0
    /// next to the physical region and largest at the grid edge.
    pub fn with_absorbing_boundaries(
        physical: &Array2<Complex64>,
        widths: [[usize; 2]; 2],
        strength: f64,
        pixel_size: f64,
    ) -> Result<Self> {
        let (rows, cols) = physical.dim();
        if rows == 0 || cols == 0 {
            return Err(WaveSimError::invalid("permittivity", "physical region is empty"));
        }
        if !(strength.is_finite() && strength >= 0.0) {
            return Err(WaveSimError::invalid(
                "strength",
                format!("must be finite and >= 0, got {strength}"),
            ));
        }

        let shape = (
            rows + widths[0][0] + widths[0][1],
            cols + widths[1][0] + widths[1][1],
        );
        let offset = (widths[0][0], widths[1][0]);

        let mut padded = Array2::from_shape_fn(shape, |(i, j)| {
            let pi = i.saturating_sub(offset.0).min(rows - 1);
            let pj = j.saturating_sub(offset.1).min(cols - 1);
            physical[[pi, pj]]
        });

        for axis in 0..2 {
            let [before, after] = widths[axis];
            for k in 0..before {
                add_absorption(&mut padded, axis, k, ramp(before - k, before, strength));
            }
            let len = if axis == 0 { shape.0 } else { shape.1 };
            for k in 0..after {
                add_absorption(&mut padded, axis, len - after + k, ramp(k + 1, after, strength));
            }
        }

        let roi = Roi::from_offset(offset, (rows, cols));
        Self::new(padded, pixel_size, roi)
    }

    /// Override the reference permittivity
    pub fn with_center(mut self, center: Complex64) -> Self {
        self.center = center;
        self
    }
}

impl Medium for PaddedMedium {
    fn permittivity(&self) -> &Array2<Complex64> {
        &self.permittivity
    }

    fn center_permittivity(&self) -> Complex64 {
        self.center
    }

    fn grid(&self) -> &Grid {
        &self.grid
    }

    fn roi(&self) -> &Roi {
        &self.roi
    }
}

/// Imaginary permittivity added `depth` pixels into a layer of `width`
fn ramp(depth: usize, width: usize, strength: f64) -> Complex64 {
    Complex64::new(0.0, strength * depth as f64 / width as f64)
}

fn add_absorption(array: &mut Array2<Complex64>, axis: usize, index: usize, value: Complex64) {
    let mut lane = if axis == 0 {
        array.slice_mut(s![index, ..])
    } else {
        array.slice_mut(s![.., index])
    };
    lane.mapv_inplace(|v| v + value);
}

/// Center of the axis-aligned bounding box of the values
fn bounding_center(values: &Array2<Complex64>) -> Complex64 {
    let mut r_min = f64::INFINITY;
    let mut r_max = f64::NEG_INFINITY;
    let mut i_min = f64::INFINITY;
    let mut i_max = f64::NEG_INFINITY;

    for val in values.iter() {
        r_min = r_min.min(val.re);
        r_max = r_max.max(val.re);
        i_min = i_min.min(val.im);
        i_max = i_max.max(val.im);
    }

    Complex64::new((r_min + r_max) / 2.0, (i_min + i_max) / 2.0)
}
