//! Backend selection, parity and concurrent use


use test_utils::*;
use wavesim2d::engine::backend::{create_backend, ComputeBackend};
use wavesim2d::prelude::*;

fn params(backend: BackendKind) -> SimulationParams {
    SimulationParams {
        backend,
        energy_threshold: 1e-14,
        max_iterations: 10_000,
        ..Default::default()
    }
}

#[test]
fn test_backend_parity() {
    let medium = lossy_cylinder_medium((24, 20));
    let source = random_source((24, 20), 42);

    let cpu = BornSimulation::new(&medium, params(BackendKind::Cpu)).unwrap();
    let par = BornSimulation::new(&medium, params(BackendKind::Parallel)).unwrap();
    assert_eq!(cpu.backend_name(), "rustfft");
    assert_eq!(par.backend_name(), "rayon");

    let a = cpu.exec(&source).unwrap();
    let b = par.exec(&source).unwrap();

    assert_eq!(a.status, ConvergenceStatus::Converged);
    assert_eq!(b.status, ConvergenceStatus::Converged);
    assert!(a.iterations.abs_diff(b.iterations) <= 1);
    assert!(all_close(&a.field, &b.field, 1e-8, 1e-12));
}

#[test]
fn test_backend_kind_parsing() {
    assert_eq!("cpu".parse::<BackendKind>().unwrap(), BackendKind::Cpu);
    assert_eq!("rayon".parse::<BackendKind>().unwrap(), BackendKind::Parallel);
    assert!("cuda".parse::<BackendKind>().is_err());
    assert_eq!(BackendKind::Parallel.to_string(), "parallel");
}

#[test]
fn test_unprepared_backend_still_transforms() {
    let backend = create_backend(BackendKind::Cpu);
    assert!(!backend.is_prepared_for((8, 8)));

    let source = random_source((8, 8), 1);
    let mut data = source.data.clone();
    backend.fft_2d(&mut data);
    backend.ifft_2d(&mut data);
    assert!(all_close(&WaveArray { data }, &source, 1e-12, 1e-12));
}

#[test]
fn test_concurrent_runs_share_one_simulation() {
    let medium = lossy_cylinder_medium((16, 16));
    let sim = BornSimulation::new(&medium, params(BackendKind::Cpu)).unwrap();
    let sources: Vec<_> = (0..4).map(|seed| random_source((16, 16), seed)).collect();

    let sequential: Vec<_> = sources.iter().map(|s| sim.exec(s).unwrap()).collect();
    let sim = &sim;
    let concurrent: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = sources
            .iter()
            .map(|s| scope.spawn(move || sim.exec(s).unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for (a, b) in sequential.iter().zip(&concurrent) {
        assert_eq!(a.field, b.field);
        assert_eq!(a.iterations, b.iterations);
        assert_eq!(a.energy_history, b.energy_history);
    }
}
