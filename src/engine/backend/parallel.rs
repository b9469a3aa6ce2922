//! Rayon backend implementation
//!
//! Same algorithms as the RustFFT backend, with rows, columns and elementwise
//! kernels spread over the rayon thread pool. Results agree with the
//! sequential backend up to floating-point summation order in reductions.

use super::plan::{process_lane, FftPlans};
use super::ComputeBackend;
use ndarray::parallel::prelude::*;
use ndarray::{Array2, ArrayView2, Axis, Zip};
use num_complex::Complex64;
use rustfft::Fft;

/// Data-parallel CPU compute backend
#[derive(Default)]
pub struct RayonBackend {
    plans: Option<FftPlans>,
}

impl RayonBackend {
    /// Create a new, unprepared rayon backend
    pub fn new() -> Self {
        Self { plans: None }
    }

    fn transform(data: &mut Array2<Complex64>, rows: &dyn Fft<f64>, cols: &dyn Fft<f64>) {
        data.axis_iter_mut(Axis(0)).into_par_iter().for_each_init(
            || (Vec::new(), Vec::new()),
            |(buffer, scratch), row| process_lane(row, rows, buffer, scratch),
        );
        data.axis_iter_mut(Axis(1)).into_par_iter().for_each_init(
            || (Vec::new(), Vec::new()),
            |(buffer, scratch), col| process_lane(col, cols, buffer, scratch),
        );
    }
}

impl ComputeBackend for RayonBackend {
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
        data.par_mapv_inplace(|v| v * normalization);
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
                .par_for_each(|o, &a, &b, &c| *o = a * b + c),
            None => Zip::from(out)
                .and(a)
                .and(b)
                .par_for_each(|o, &a, &b| *o = a * b),
        }
    }

    fn multiply_assign(&self, data: &mut Array2<Complex64>, factor: &Array2<Complex64>) {
        Zip::from(data).and(factor).par_for_each(|d, &f| *d *= f);
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
            .par_for_each(|t, &x, &w| *t = x + w * (*t - x));
    }

    fn difference_energy(
        &self,
        a: ArrayView2<'_, Complex64>,
        b: ArrayView2<'_, Complex64>,
    ) -> f64 {
        Zip::from(&a).and(&b).par_fold(
            || 0.0,
            |acc, &x, &y| acc + (x - y).norm_sqr(),
            |l, r| l + r,
        )
    }

    fn name(&self) -> &'static str {
        "rayon"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::backend::RustFFTBackend;
    use approx::assert_abs_diff_eq;

    fn sample(shape: (usize, usize)) -> Array2<Complex64> {
        Array2::from_shape_fn(shape, |(i, j)| {
            Complex64::new(((i * 7 + j) as f64 * 0.31).sin(), ((i + 3 * j) as f64 * 0.17).cos())
        })
    }

    #[test]
    fn test_matches_sequential_fft() {
        let shape = (12, 10);
        let mut parallel = RayonBackend::new();
        let mut sequential = RustFFTBackend::new();
        parallel.prepare(shape);
        sequential.prepare(shape);

        let mut a = sample(shape);
        let mut b = a.clone();
        parallel.fft_2d(&mut a);
        sequential.fft_2d(&mut b);

        for (x, y) in a.iter().zip(b.iter()) {
            assert_abs_diff_eq!((x - y).norm(), 0.0, epsilon = 1e-10);
        }

        parallel.ifft_2d(&mut a);
        let original = sample(shape);
        for (x, y) in a.iter().zip(original.iter()) {
            assert_abs_diff_eq!((x - y).norm(), 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_matches_sequential_kernels() {
        let shape = (9, 7);
        let parallel = RayonBackend::new();
        let sequential = RustFFTBackend::new();

        let a = sample(shape);
        let b = a.mapv(|v| v.conj() * 0.5);
        let c = a.mapv(|v| v * Complex64::new(0.0, 1.0));

        let mut out_p = Array2::zeros(shape);
        let mut out_s = Array2::zeros(shape);
        parallel.multiply_add(&a, &b, Some(&c), &mut out_p);
        sequential.multiply_add(&a, &b, Some(&c), &mut out_s);
        assert_eq!(out_p, out_s);

        parallel.relax(&a, &b, &mut out_p);
        sequential.relax(&a, &b, &mut out_s);
        assert_eq!(out_p, out_s);

        assert_abs_diff_eq!(
            parallel.difference_energy(a.view(), c.view()),
            sequential.difference_energy(a.view(), c.view()),
            epsilon = 1e-10
        );
    }
}
