//! Accelerated Proximal Gradient Descent with backtracking

#![allow(non_snake_case)]

use ndarray::prelude::*;
use ndarray::{Dimension, NdFloat};

use super::linesearch::backtrack;
use super::{
    all_finite, inner, norm, raise, relative_change, Penalty, Smooth, Solution, Status, Warning,
};
use crate::error::{Error, Result};
use crate::observe::Observer;
use crate::options::ProxOptions;

/// Nesterov Accelerated Proximal Gradient Descent
///
/// minimize $`g(x) + h(x)`$ with $`g`$ differentiable and the proximal
/// operator of $`h`$ available, see [\[EG\]](#references).
///
/// Algorithm
/// ---------
/// ```math
/// \begin{aligned}
/// x_k &= \mathrm{prox}_{s h}\left(q_{k-1} - s \nabla g(q_{k-1})\right) \\
/// G_s &= (q_{k-1} - x_k) / s \\
/// q_k &= x_k + \frac{k-1}{k+2}(x_k - x_{k-1})
/// \end{aligned}
/// ```
/// where $`q_0 = x_0`$ and the step $`s`$ shrinks by `gamma` until
/// ```math
/// g(q - sG_s) \leq g(q) - s\langle \nabla g(q), G_s \rangle + \frac{s}{2}\|G_s\|_2^2
/// ```
/// If no step passes within `max_line_iter` attempts, the last candidate is
/// kept, a [`Warning::LineSearchFailed`](super::Warning) is raised and the step
/// is reset to `s0`. A non-finite iterate raises a warning but does not stop the
/// run. The run stops once the relative change of $`g + h`$ drops below `tol`,
/// or after `max_iter` iterations.
///
/// Parameters
/// ----------
/// - __g:__         smooth term
/// - __h:__         non-smooth term
/// - __x0:__        initial guess
/// - __opts:__      tolerances, step size and iteration limits
/// - __observer:__  receives the initial cost, every iterate's cost and warnings
///
/// Errors
/// ------
/// [`Error::NonFiniteGradient`] as soon as $`\nabla g(q)`$ has a non-finite
/// entry at any line search attempt; [`Error::InvalidOption`] for bad options.
///
/// References
/// ----------
/// \[EG\]: [ El Ghaoui L, "EE227A Lecture 18: Proximal gradient method",
///           UC Berkeley ](https://people.eecs.berkeley.edu/~elghaoui/Teaching/EE227A/lecture18.pdf)
pub fn acc_prox_grad<S, D, G, H, O>(
    g: &G,
    h: &H,
    x0: ArrayView<S, D>,
    opts: &ProxOptions<S>,
    observer: &mut O,
) -> Result<Solution<S, D>>
where
    S: NdFloat,
    D: Dimension,
    G: Smooth<S, D>,
    H: Penalty<S, D>,
    O: Observer<S>,
{
    opts.validate()?;
    let two = S::one() + S::one();

    let mut s = opts.s0;
    let mut x = x0.to_owned();
    // momentum iterate
    let mut q = x0.to_owned();

    let mut f = g.value(x.view()) + h.value(x.view());
    observer.initial(f);

    let mut warnings = Vec::new();
    let mut residual = S::zero();
    let mut status = Status::MaxIter {
        rel_change: S::infinity(),
    };
    let mut iterations = 0;

    for k in 1..=opts.max_iter {
        iterations = k;
        let g_q = g.value(q.view());
        let grad_q = g.gradient(q.view());

        let search = backtrack(s, opts.gamma, opts.max_line_iter, |s, line_iter| {
            if !all_finite(&grad_q) {
                return Err(Error::NonFiniteGradient {
                    iteration: k,
                    line_search_step: Some(line_iter),
                });
            }
            let x = h.prox((&q - &(&grad_q * s)).view(), s);
            // gradient mapping
            let G = (&q - &x) / s;
            let decrease = g.value((&q - &(&G * s)).view())
                <= g_q - s * inner(&grad_q, &G) + s / two * inner(&G, &G);
            Ok((x, decrease))
        })?;
        s = search.step;

        let x_old = std::mem::replace(&mut x, search.candidate);
        let beta = S::from(k - 1).unwrap() / S::from(k + 2).unwrap();
        q = &x + &((&x - &x_old) * beta);

        if !search.accepted {
            raise::<S, _>(observer, &mut warnings, Warning::LineSearchFailed { iteration: k });
            s = opts.s0;
        }
        if !all_finite(&x) {
            raise::<S, _>(observer, &mut warnings, Warning::NonFiniteIterate { iteration: k });
        }
        residual = norm(&(&x - &x_old));

        let f_old = f;
        f = g.value(x.view()) + h.value(x.view());
        observer.iteration(k, f);
        let rel_change = relative_change(f, f_old);
        if rel_change < opts.tol {
            status = Status::Converged { rel_change };
            break;
        }
        status = Status::MaxIter { rel_change };
    }

    observer.finished(iterations, &status);
    Ok(Solution {
        x,
        cost: f,
        iterations,
        status,
        warnings,
        residual,
    })
}
