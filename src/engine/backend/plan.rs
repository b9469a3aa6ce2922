//! FFT plans shared by the CPU backends

use ndarray::ArrayViewMut1;
use num_complex::Complex64;
use num_traits::Zero;
use rustfft::{Fft, FftPlanner};
use std::borrow::Cow;
use std::sync::Arc;

/// Forward and inverse plans for both axes of one grid shape
#[derive(Clone)]
pub(crate) struct FftPlans {
    pub shape: (usize, usize),
    /// Along axis 1 (each row has `shape.1` elements)
    pub row_forward: Arc<dyn Fft<f64>>,
    pub row_inverse: Arc<dyn Fft<f64>>,
    /// Along axis 0 (each column has `shape.0` elements)
    pub col_forward: Arc<dyn Fft<f64>>,
    pub col_inverse: Arc<dyn Fft<f64>>,
}

impl FftPlans {
    pub fn new(shape: (usize, usize)) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            shape,
            row_forward: planner.plan_fft_forward(shape.1),
            row_inverse: planner.plan_fft_inverse(shape.1),
            col_forward: planner.plan_fft_forward(shape.0),
            col_inverse: planner.plan_fft_inverse(shape.0),
        }
    }

    /// Normalization applied after an inverse transform
    pub fn inverse_normalization(&self) -> f64 {
        1.0 / (self.shape.0 * self.shape.1) as f64
    }

    /// Return prepared plans if they match `shape`, otherwise plan now
    pub fn resolve<'a>(
        prepared: &'a Option<FftPlans>,
        shape: (usize, usize),
        backend: &str,
    ) -> Cow<'a, FftPlans> {
        match prepared {
            Some(plans) if plans.shape == shape => Cow::Borrowed(plans),
            _ => {
                log::warn!(
                    "{} backend: transform on unprepared shape {:?}, planning per call",
                    backend,
                    shape
                );
                Cow::Owned(FftPlans::new(shape))
            }
        }
    }
}

/// Transform one lane (row or column) in place.
///
/// Contiguous lanes are processed directly; strided lanes go through `buffer`.
pub(crate) fn process_lane(
    mut lane: ArrayViewMut1<'_, Complex64>,
    fft: &dyn Fft<f64>,
    buffer: &mut Vec<Complex64>,
    scratch: &mut Vec<Complex64>,
) {
    let scratch_len = fft.get_inplace_scratch_len();
    if scratch.len() < scratch_len {
        scratch.resize(scratch_len, Complex64::zero());
    }

    if let Some(slice) = lane.as_slice_mut() {
        fft.process_with_scratch(slice, &mut scratch[..scratch_len]);
        return;
    }

    buffer.clear();
    buffer.extend(lane.iter().copied());
    fft.process_with_scratch(buffer, &mut scratch[..scratch_len]);
    for (dst, src) in lane.iter_mut().zip(buffer.iter()) {
        *dst = *src;
    }
}
