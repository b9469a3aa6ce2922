//! Cylinder scattering with the Modified Born Series
//!
//! Solves the 2D Helmholtz equation for a point source next to a dielectric
//! cylinder, surrounded by absorbing layers, and logs a summary of the run.
//! Set `RUST_LOG=info` to follow progress.

use clap::Parser;
use ndarray::Array2;
use num_complex::Complex;
use std::path::PathBuf;
use wavesim2d::prelude::*;

/// Command-line arguments for the cylinder scattering simulation
#[derive(Parser, Debug)]
#[command(name = "helmholtz2d")]
#[command(about = "2D Helmholtz scattering by a cylinder (Modified Born Series)", long_about = None)]
struct Args {
    /// Wavelength, in the same unit as the pixel size
    #[arg(long, default_value_t = 1.0)]
    wavelength: f64,

    /// Pixel size
    #[arg(long, default_value_t = 0.125)]
    pixel_size: f64,

    /// Side of the square physical region in pixels
    #[arg(long, default_value_t = 128)]
    size: usize,

    /// Absorbing layer width in pixels on every side
    #[arg(long, default_value_t = 32)]
    padding: usize,

    /// Peak imaginary permittivity added at the outer edge of the layer
    #[arg(long, default_value_t = 0.5)]
    absorption: f64,

    /// Cylinder radius in wavelengths
    #[arg(long, default_value_t = 1.0)]
    radius: f64,

    /// Real part of the cylinder permittivity
    #[arg(long, default_value_t = 2.25)]
    permittivity: f64,

    /// Compute backend: cpu or parallel
    #[arg(long, default_value = "cpu")]
    backend: BackendKind,

    /// Hard iteration cap
    #[arg(long, default_value_t = 10_000)]
    max_iterations: usize,

    /// JSON file with simulation parameters; command-line values are ignored
    /// for any field it sets
    #[arg(long)]
    params: Option<PathBuf>,
}

impl Args {
    fn simulation_params(&self) -> Result<SimulationParams> {
        match &self.params {
            Some(path) => SimulationParams::from_file(path),
            None => {
                let params = SimulationParams {
                    wavelength: self.wavelength,
                    max_iterations: self.max_iterations,
                    backend: self.backend,
                    ..Default::default()
                };
                params.validate()?;
                Ok(params)
            }
        }
    }

    fn cylinder(&self, wavelength: f64) -> Array2<Complex64> {
        let n = self.size;
        let center = (n as f64 - 1.0) / 2.0;
        let radius = self.radius * wavelength / self.pixel_size;
        let inside = Complex::new(self.permittivity, 0.0);
        let outside = Complex::new(1.0, 0.0);
        Array2::from_shape_fn((n, n), |(i, j)| {
            let di = i as f64 - center;
            let dj = j as f64 - center;
            if di * di + dj * dj <= radius * radius {
                inside
            } else {
                outside
            }
        })
    }
}

fn run(args: &Args) -> Result<()> {
    let params = args.simulation_params()?;
    log::info!("Parameters: {:?}", params);

    let physical = args.cylinder(params.wavelength);
    let widths = [[args.padding; 2]; 2];
    let medium = PaddedMedium::with_absorbing_boundaries(
        &physical,
        widths,
        args.absorption,
        args.pixel_size,
    )?;

    let sim = BornSimulation::new(&medium, params)?;

    // Point source one quarter of the way across, on the cylinder axis
    let mut source = WaveArray::zeros((args.size, args.size));
    source.data[[args.size / 2, args.size / 4]] = Complex::new(1.0, 0.0);

    let mut progress = LogProgress;
    let result = sim.exec_with(&source, Some(&mut progress), None)?;

    let final_energy = result.energy_history.last().copied().unwrap_or(0.0);
    log::info!("Status: {}", result.status);
    log::info!(
        "Iterations: {} in {:.2?} ({} backend)",
        result.iterations,
        result.elapsed,
        sim.backend_name()
    );
    log::info!(
        "Damping: {:.4e} (bound {:.4e})",
        result.epsilon,
        sim.operator().epsilon_min
    );
    log::info!(
        "Last added energy: {:.3e} (threshold {:.3e})",
        final_energy,
        result.threshold
    );
    log::info!(
        "Field: max |E| = {:.4e}, total energy = {:.4e}",
        result.field.max_norm(),
        result.field.norm_squared()
    );

    if !result.is_converged() {
        log::warn!("Run ended without convergence: {}", result.status);
    }
    Ok(())
}

fn main() {
    env_logger::init();

    let args = Args::parse();
    log::info!("Rayon thread pool: {} threads", rayon::current_num_threads());

    if let Err(err) = run(&args) {
        log::error!("{err}");
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}
