//! Progress reporting for the proximal gradient methods
//!
//! Solvers never print. They hand the initial cost, the cost after every
//! iteration, each [`Warning`] and the final [`Status`] to an [`Observer`],
//! which is free to log, record or ignore them. Observers cannot steer the
//! run.

use ndarray::NdFloat;

use crate::prox::{Status, Warning};

/// Receives the events of a proximal gradient run
///
/// Every method defaults to doing nothing, so an implementation only
/// overrides what it needs.
pub trait Observer<S> {
    /// Objective at the initial point
    fn initial(&mut self, _cost: S) {}

    /// Objective after iteration `iter` (counting from 1)
    fn iteration(&mut self, _iter: usize, _cost: S) {}

    /// A recoverable problem, in the order raised
    fn warning(&mut self, _warning: Warning) {}

    /// Called once, after the last iteration
    fn finished(&mut self, _iterations: usize, _status: &Status<S>) {}
}

/// Ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl<S> Observer<S> for Silent {}

/// Reports through the `log` facade
///
/// Initial cost and termination go to `info`, per-iteration costs to
/// `debug` and warnings to `warn`, under the `mushi::observe` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct Logger;

fn as_f64<S: NdFloat>(v: S) -> f64 {
    v.to_f64().unwrap_or(std::f64::NAN)
}

impl<S: NdFloat> Observer<S> for Logger {
    fn initial(&mut self, cost: S) {
        log::info!("initial cost {:.6e}", as_f64(cost));
    }

    fn iteration(&mut self, iter: usize, cost: S) {
        log::debug!("iteration {}, cost {:.6e}", iter, as_f64(cost));
    }

    fn warning(&mut self, warning: Warning) {
        log::warn!("{}", warning);
    }

    fn finished(&mut self, iterations: usize, status: &Status<S>) {
        match *status {
            Status::Converged { rel_change } => log::info!(
                "relative change in objective function {:.2e} is within tolerance after {} iterations",
                as_f64(rel_change),
                iterations
            ),
            Status::MaxIter { rel_change } => log::info!(
                "maximum iteration {} reached with relative change in objective function {:.2e}",
                iterations,
                as_f64(rel_change)
            ),
        }
    }
}

/// Records everything in memory
#[derive(Debug, Clone, PartialEq)]
pub struct Trace<S> {
    /// initial cost followed by the cost of every iteration
    pub costs: Vec<S>,
    pub warnings: Vec<Warning>,
    pub status: Option<Status<S>>,
}

impl<S> Default for Trace<S> {
    fn default() -> Self {
        Trace {
            costs: Vec::new(),
            warnings: Vec::new(),
            status: None,
        }
    }
}

impl<S> Trace<S> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S: Copy> Observer<S> for Trace<S> {
    fn initial(&mut self, cost: S) {
        self.costs.clear();
        self.warnings.clear();
        self.status = None;
        self.costs.push(cost);
    }

    fn iteration(&mut self, _iter: usize, cost: S) {
        self.costs.push(cost);
    }

    fn warning(&mut self, warning: Warning) {
        self.warnings.push(warning);
    }

    fn finished(&mut self, _iterations: usize, status: &Status<S>) {
        self.status = Some(*status);
    }
}
