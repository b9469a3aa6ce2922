//! Convergence bookkeeping
//!
//! Entry 0 of the energy history is the injected source energy; entry `n` is
//! the energy added by step `n` inside the region of interest. A run stops at
//! the first entry below `threshold_fraction · en[0]`, without requiring the
//! energy to stay below it afterwards.

/// What the monitor decided after recording one step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Keep iterating
    Continue,
    /// Added energy fell below the threshold
    Converged,
    /// Added energy kept rising (or stopped being finite)
    Diverged,
    /// Iteration cap reached without meeting the threshold
    Exhausted,
}

#[derive(Debug, Clone)]
struct DivergenceWatch {
    window: usize,
    rising: usize,
}

/// Tracks the per-iteration energy history of one run
#[derive(Debug, Clone)]
pub struct ConvergenceMonitor {
    history: Vec<f64>,
    threshold: f64,
    max_iterations: usize,
    divergence: Option<DivergenceWatch>,
}

impl ConvergenceMonitor {
    /// Start a history with the source energy as entry 0
    pub fn new(source_energy: f64, threshold_fraction: f64, max_iterations: usize) -> Self {
        let mut history = Vec::with_capacity(max_iterations.saturating_add(1).min(1 << 16));
        history.push(source_energy);
        Self {
            history,
            threshold: threshold_fraction * source_energy,
            max_iterations,
            divergence: None,
        }
    }

    /// Flag divergence after `window` consecutive increases of added energy
    pub fn watch_divergence(mut self, window: usize) -> Self {
        self.divergence = Some(DivergenceWatch {
            window: window.max(1),
            rising: 0,
        });
        self
    }

    /// Absolute energy threshold
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Energy injected by the source
    pub fn source_energy(&self) -> f64 {
        self.history[0]
    }

    /// A zero source has nothing to converge to
    pub fn is_degenerate(&self) -> bool {
        self.history[0] == 0.0
    }

    /// Steps recorded so far
    pub fn iterations(&self) -> usize {
        self.history.len() - 1
    }

    /// History recorded so far
    pub fn history(&self) -> &[f64] {
        &self.history
    }

    /// Consume the monitor, keeping the history
    pub fn into_history(self) -> Vec<f64> {
        self.history
    }

    /// Record the energy added by the latest step and decide what to do next
    pub fn record(&mut self, added_energy: f64) -> Decision {
        let previous = self.history.last().copied();
        self.history.push(added_energy);
        let n = self.iterations();

        if added_energy.abs() < self.threshold {
            return Decision::Converged;
        }

        if let Some(watch) = self.divergence.as_mut() {
            if !added_energy.is_finite() {
                return Decision::Diverged;
            }
            match previous {
                Some(prev) if n >= 2 && added_energy > prev => watch.rising += 1,
                _ => watch.rising = 0,
            }
            if watch.rising >= watch.window {
                return Decision::Diverged;
            }
        }

        if n >= self.max_iterations {
            Decision::Exhausted
        } else {
            Decision::Continue
        }
    }
}
