//! RustFFT backend implementation
//!
//! Pure Rust, single-threaded. This backend is available on all platforms.

use super::plan::{process_lane, FftPlans};
use super::ComputeBackend;
use ndarray::{Array2, ArrayView2, Zip};
use num_complex::Complex64;
use rustfft::Fft;

/// RustFFT-based sequential compute backend
#[derive(Default)]
pub struct RustFFTBackend {
    plans: Option<FftPlans>,
}

impl RustFFTBackend {
    /// Create a new, unprepared RustFFT backend
    pub fn new() -> Self {
        Self { plans: None }
    }

    fn transform(data: &mut Array2<Complex64>, rows: &dyn Fft<f64>, cols: &dyn Fft<f64>) {
        let mut buffer = Vec::new();
        let mut scratch = Vec::new();

        for row in data.rows_mut() {
            process_lane(row, rows, &mut buffer, &mut scratch);
        }
        for col in data.columns_mut() {
            process_lane(col, cols, &mut buffer, &mut scratch);
        }
    }
}

impl ComputeBackend for RustFFTBackend {
    fn prepare(&mut self, shape: (usize, usize)) {
        self.plans = Some(FftPlans::new(shape));
    }

    fn is_prepared_for(&self, shape: (usize, usize)) -> bool {
        matches!(&self.plans, Some(plans) if plans.shape == shape)
    }

    fn fft_2d(&self, data: &mut Array2<Complex64>) {
        let plans = FftPlans::resolve(&self.plans, data.dim(), self.name());
        Self::transform(data, &*plans.row_forward, &*plans.col_forward);
    }

    fn ifft_2d(&self, data: &mut Array2<Complex64>) {
        let plans = FftPlans::resolve(&self.plans, data.dim(), self.name());
        Self::transform(data, &*plans.row_inverse, &*plans.col_inverse);
        let normalization = plans.inverse_normalization();
        data.mapv_inplace(|v| v * normalization);
    }

    fn multiply_add(
        &self,
        a: &Array2<Complex64>,
        b: &Array2<Complex64>,
        c: Option<&Array2<Complex64>>,
        out: &mut Array2<Complex64>,
    ) {
        match c {
            Some(c) => Zip::from(out)
                .and(a)
                .and(b)
                .and(c)
                .for_each(|o, &a, &b, &c| *o = a * b + c),
            None => Zip::from(out)
                .and(a)
                .and(b)
                .for_each(|o, &a, &b| *o = a * b),
        }
    }

    fn multiply_assign(&self, data: &mut Array2<Complex64>, factor: &Array2<Complex64>) {
        Zip::from(data).and(factor).for_each(|d, &f| *d *= f);
    }

    fn relax(
        &self,
        current: &Array2<Complex64>,
        weight: &Array2<Complex64>,
        target: &mut Array2<Complex64>,
    ) {
        Zip::from(target)
            .and(current)
            .and(weight)
            .for_each(|t, &x, &w| *t = x + w * (*t - x));
    }

    fn difference_energy(
        &self,
        a: ArrayView2<'_, Complex64>,
        b: ArrayView2<'_, Complex64>,
    ) -> f64 {
        Zip::from(&a)
            .and(&b)
            .fold(0.0, |acc, &x, &y| acc + (x - y).norm_sqr())
    }

    fn name(&self) -> &'static str {
        "rustfft"
    }
}
