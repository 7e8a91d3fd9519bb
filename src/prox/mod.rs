//! Minimization for Composite Functions consisting of
//! a smooth _g_ and one or two non-smooth prox-friendly penalties
//!
//! This includes the k-SFS inference problems of [`crate::ksfs`], where
//! a Poisson or least-squares loss is combined with a non-negativity
//! constraint and a smoothness or sparsity penalty, as well as smooth
//! constrained problems, as a projection is the proximal operator of a
//! constraint set.
//!
//! Both methods backtrack on the step size instead of taking a Lipschitz
//! constant, report progress to an [`Observer`](crate::observe::Observer),
//! and return a [`Solution`] carrying the final iterate with diagnostics.

use std::fmt;

use ndarray::prelude::*;
use ndarray::{Dimension, NdFloat};

use crate::observe::Observer;

mod linesearch;

mod apgd;
pub use apgd::*;

mod three_op;
pub use three_op::*;

/// Differentiable term $`g`$ of a composite objective
pub trait Smooth<S, D>
where
    S: NdFloat,
    D: Dimension,
{
    /// $`g(x)`$
    fn value(&self, x: ArrayView<S, D>) -> S;

    /// $`\nabla g(x)`$, with the shape of `x`
    fn gradient(&self, x: ArrayView<S, D>) -> Array<S, D>;
}

/// Non-smooth term $`h`$ of a composite objective, given by its proximal operator
///
/// ```math
/// \mathrm{prox}_{s h}(v) = \mathrm{arg}\!\min_x h(x) + \frac{1}{2s}\|x - v\|_2^2
/// ```
///
/// `value` may return $`+\infty`$ to encode a constraint.
pub trait Penalty<S, D>
where
    S: NdFloat,
    D: Dimension,
{
    /// $`h(x)`$
    fn value(&self, x: ArrayView<S, D>) -> S;

    /// $`\mathrm{prox}_{s h}(v)`$, with the shape of `v`
    fn prox(&self, v: ArrayView<S, D>, step: S) -> Array<S, D>;
}

/// A [`Smooth`] term from a pair of closures `(g, grad_g)`
#[derive(Debug, Clone, Copy)]
pub struct FnSmooth<F, G>(pub F, pub G);

impl<S, D, F, G> Smooth<S, D> for FnSmooth<F, G>
where
    S: NdFloat,
    D: Dimension,
    F: Fn(ArrayView<S, D>) -> S,
    G: Fn(ArrayView<S, D>) -> Array<S, D>,
{
    fn value(&self, x: ArrayView<S, D>) -> S {
        (self.0)(x)
    }

    fn gradient(&self, x: ArrayView<S, D>) -> Array<S, D> {
        (self.1)(x)
    }
}

/// A [`Penalty`] from a pair of closures `(h, prox)`
#[derive(Debug, Clone, Copy)]
pub struct FnPenalty<H, P>(pub H, pub P);

impl<S, D, H, P> Penalty<S, D> for FnPenalty<H, P>
where
    S: NdFloat,
    D: Dimension,
    H: Fn(ArrayView<S, D>) -> S,
    P: Fn(ArrayView<S, D>, S) -> Array<S, D>,
{
    fn value(&self, x: ArrayView<S, D>) -> S {
        (self.0)(x)
    }

    fn prox(&self, v: ArrayView<S, D>, step: S) -> Array<S, D> {
        (self.1)(v, step)
    }
}

/// Recoverable numerical trouble; the run carries on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Warning {
    /// Backtracking used all its attempts without sufficient decrease.
    LineSearchFailed { iteration: usize },
    /// The iterate has a `NaN` or infinite entry.
    NonFiniteIterate { iteration: usize },
}

impl Warning {
    /// Iteration (counting from 1) that raised the warning
    pub fn iteration(&self) -> usize {
        match *self {
            Warning::LineSearchFailed { iteration } | Warning::NonFiniteIterate { iteration } => {
                iteration
            }
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::LineSearchFailed { iteration } => {
                write!(f, "line search failed at iteration {}", iteration)
            }
            Warning::NonFiniteIterate { iteration } => {
                write!(f, "x contains invalid values at iteration {}", iteration)
            }
        }
    }
}

/// How a run ended, with the last relative change of the objective
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Status<S> {
    Converged { rel_change: S },
    MaxIter { rel_change: S },
}

impl<S: Copy> Status<S> {
    /// Relative change of the objective in the last iteration
    pub fn rel_change(&self) -> S {
        match *self {
            Status::Converged { rel_change } | Status::MaxIter { rel_change } => rel_change,
        }
    }
}

/// Result of a proximal gradient run
#[derive(Debug, Clone)]
pub struct Solution<S, D>
where
    D: Dimension,
{
    /// final iterate, same shape as the initial point
    pub x: Array<S, D>,
    /// objective at `x`
    pub cost: S,
    pub iterations: usize,
    pub status: Status<S>,
    /// warnings in the order they were raised
    pub warnings: Vec<Warning>,
    /// norm of the last step for the accelerated method,
    /// of the primal disagreement $`x - z`$ for splitting
    pub residual: S,
}

impl<S, D> Solution<S, D>
where
    D: Dimension,
{
    /// Whether the run stopped on the tolerance rather than `max_iter`
    pub fn converged(&self) -> bool {
        match self.status {
            Status::Converged { .. } => true,
            Status::MaxIter { .. } => false,
        }
    }
}

// Shared bookkeeping between the two methods.

fn inner<S, D>(a: &Array<S, D>, b: &Array<S, D>) -> S
where
    S: NdFloat,
    D: Dimension,
{
    a.iter()
        .zip(b.iter())
        .fold(S::zero(), |acc, (&a, &b)| acc + a * b)
}

fn norm<S, D>(a: &Array<S, D>) -> S
where
    S: NdFloat,
    D: Dimension,
{
    inner(a, a).sqrt()
}

fn all_finite<S, D>(a: &Array<S, D>) -> bool
where
    S: NdFloat,
    D: Dimension,
{
    a.iter().all(|v| v.is_finite())
}

/// $`|f - f_{old}| / |f_{old}|`$, zero when the objective did not move at all
fn relative_change<S: NdFloat>(f: S, f_old: S) -> S {
    if f == f_old {
        S::zero()
    } else {
        ((f - f_old) / f_old).abs()
    }
}

fn raise<S, O>(observer: &mut O, warnings: &mut Vec<Warning>, warning: Warning)
where
    O: Observer<S>,
{
    observer.warning(warning);
    warnings.push(warning);
}
