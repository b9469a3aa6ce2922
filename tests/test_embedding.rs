//! Region-of-interest embedding and operator construction


use approx::assert_abs_diff_eq;
use num_complex::Complex;
use std::f64::consts::PI;
use test_utils::*;
use wavesim2d::domain::operator::MIN_DAMPING;
use wavesim2d::prelude::*;

#[test]
fn test_embed_extract_random_sources() {
    let cases = [
        ((4, 6), (10, 12), (3, 2)),
        ((7, 7), (7, 7), (0, 0)),
        ((1, 9), (5, 9), (4, 0)),
    ];
    for (seed, (source_shape, grid_shape, offset)) in cases.into_iter().enumerate() {
        let source = random_source(source_shape, seed as u64);
        let roi = Roi::from_offset(offset, source_shape);

        let padded = embed(&source, &roi, grid_shape).unwrap();
        assert_eq!(padded.shape_tuple(), grid_shape);
        assert_eq!(padded.norm_squared(), source.norm_squared());
        assert_eq!(extract(&padded, &roi).unwrap(), source);

        // Outside the region everything is exactly zero
        for ((i, j), v) in padded.data.indexed_iter() {
            if !roi.rows.contains(&i) || !roi.cols.contains(&j) {
                assert_eq!(*v, Complex::new(0.0, 0.0));
            }
        }
    }
}

#[test]
fn test_roi_must_fit_grid() {
    let source = random_source((4, 4), 0);
    let err = embed(&source, &Roi::from_offset((3, 0), (4, 4)), (6, 6)).unwrap_err();
    assert!(matches!(err, WaveSimError::RoiOutOfBounds { .. }));

    let perm = ndarray::Array2::from_elem((6, 6), Complex::new(1.0, 0.0));
    assert!(PaddedMedium::new(perm, 0.1, Roi::from_offset((2, 2), (5, 5))).is_err());
}

#[test]
fn test_operator_in_vacuum() {
    let medium = PaddedMedium::homogeneous((8, 8), 0.25, Complex::new(1.0, 0.0)).unwrap();
    let op = BornOperator::build(&medium, 1.0, None).unwrap();

    assert_abs_diff_eq!(op.k0, 2.0 * PI, epsilon = 1e-12);
    assert_abs_diff_eq!(op.k.re, 2.0 * PI, epsilon = 1e-12);
    assert_eq!(op.epsilon, MIN_DAMPING);
    assert_eq!(op.epsilon_min, MIN_DAMPING);
    // γ = iV/ε = 1 when V = −iε
    for g in op.gamma.data.iter() {
        assert_abs_diff_eq!(g.re, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(g.im, 0.0, epsilon = 1e-12);
    }
}

#[test]
fn test_damping_bounds_potential() {
    let medium = lossy_cylinder_medium((16, 16));
    let op = BornOperator::build(&medium, 0.7, None).unwrap();
    let k02 = op.k0 * op.k0;

    // Center is halfway between 1.0 and 1.3 on the real axis
    assert_abs_diff_eq!(medium.center_permittivity().re, 1.15, epsilon = 1e-12);
    assert_abs_diff_eq!(op.epsilon, 0.15 * k02, epsilon = 1e-9);
    assert!(op.is_convergence_guaranteed());

    let forced = BornOperator::build(&medium, 0.7, Some(0.01)).unwrap();
    assert_abs_diff_eq!(forced.epsilon, 0.01 * k02, epsilon = 1e-9);
    assert!(!forced.is_convergence_guaranteed());
}

#[test]
fn test_invalid_configuration_is_rejected() {
    let medium = lossy_cylinder_medium((8, 8));
    for wavelength in [0.0, -1.0, f64::NAN] {
        let err = BornOperator::build(&medium, wavelength, None).unwrap_err();
        assert!(matches!(err, WaveSimError::InvalidWavelength { .. }));
    }
    assert!(BornOperator::build(&medium, 1.0, Some(0.0)).is_err());

    let err = BornSimulation::new(
        &medium,
        SimulationParams {
            max_iterations: 0,
            ..Default::default()
        },
    )
    .unwrap_err();
    assert!(err.is_configuration_error());
}
