//! Moving arrays between the physical region and the padded grid

use crate::domain::grid::{Grid, Roi};
use crate::engine::array::{ArraySlice, Complex64, WaveArray};
use crate::error::{Result, WaveSimError};
use ndarray::Array1;

/// Place `source` at `roi` inside an all-zero array of `shape`.
///
/// Everything outside the region stays exactly zero.
pub fn embed(
    source: &WaveArray<Complex64>,
    roi: &Roi,
    shape: (usize, usize),
) -> Result<WaveArray<Complex64>> {
    roi.validate(shape)?;
    if source.shape_tuple() != roi.shape() {
        return Err(WaveSimError::ShapeMismatch {
            what: "source",
            expected: roi.shape(),
            got: source.shape_tuple(),
        });
    }

    let mut padded = WaveArray::zeros(shape);
    padded.write_block(roi.start(), source);
    Ok(padded)
}

/// Copy the region `roi` out of a padded field
pub fn extract(field: &WaveArray<Complex64>, roi: &Roi) -> Result<WaveArray<Complex64>> {
    roi.validate(field.shape_tuple())?;
    Ok(field.slice(roi.start(), roi.stop()))
}

/// Grid axes restricted to `roi`, shifted so the first point is 0
pub fn physical_axes(grid: &Grid, roi: &Roi) -> Result<(Array1<f64>, Array1<f64>)> {
    roi.validate(grid.shape)?;
    let x0 = grid.x[roi.rows.start];
    let y0 = grid.y[roi.cols.start];
    let x = grid.x.slice(ndarray::s![roi.rows.clone()]).mapv(|v| v - x0);
    let y = grid.y.slice(ndarray::s![roi.cols.clone()]).mapv(|v| v - y0);
    Ok((x, y))
}
