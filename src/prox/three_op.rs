//! Three Operator Splitting

use ndarray::prelude::*;
use ndarray::{Dimension, NdFloat};

use super::linesearch::backtrack;
use super::{
    all_finite, inner, norm, raise, relative_change, Penalty, Smooth, Solution, Status, Warning,
};
use crate::error::{Error, Result};
use crate::observe::Observer;
use crate::options::ProxOptions;

/// Three Operator Splitting Proximal Gradient Descent with backtracking
///
/// minimize $`g(x) + h_1(x) + h_2(x)`$ where $`g`$ is differentiable and the
/// proximal operators of $`h_1`$ and $`h_2`$ are available separately,
/// following the adaptive method of [\[PG18\]](#references).
///
/// Algorithm
/// ---------
/// ```math
/// \begin{aligned}
/// x_k &= \mathrm{prox}_{s h_1}\left(z_{k-1} - s(u_{k-1} + \nabla g(z_{k-1}))\right) \\
/// z_k &= \mathrm{prox}_{s h_2}\left(x_k + s u_{k-1}\right) \\
/// u_k &= u_{k-1} + (x_k - z_k) / s \\
/// s &\leftarrow \min(s / \gamma^2, s_0)
/// \end{aligned}
/// ```
/// with $`z_0 = x_0`$, $`u_0 = 0`$, and $`s`$ shrunk by $`\gamma`$ until the
/// quadratic upper bound holds up to `ls_tol`:
/// ```math
/// g(x_k) \leq g(z) + \langle \nabla g(z), x_k - z \rangle + \frac{1}{2s}\|x_k - z\|_2^2 + \mathrm{ls\_tol}
/// ```
/// A failed line search raises a warning and, unlike
/// [`acc_prox_grad`](super::acc_prox_grad), keeps the shrunk step; the growth
/// step caps it at $`s_0`$ again. Convergence is tested on
/// $`g(z) + h_1(z) + h_2(z)`$ and $`z`$ is returned.
///
/// Parameters
/// ----------
/// - __g:__         smooth term
/// - __h1:__        first non-smooth term (prox applied to the gradient step)
/// - __h2:__        second non-smooth term
/// - __x0:__        initial guess
/// - __opts:__      tolerances, step size and iteration limits
/// - __observer:__  receives the initial cost, every iterate's cost and warnings
///
/// Errors
/// ------
/// [`Error::NonFiniteGradient`] when $`\nabla g(z)`$ has a non-finite entry
/// (checked once per iteration); [`Error::InvalidOption`] for bad options.
///
/// References
/// ----------
/// \[PG18\]: [ Pedregosa F, Gidel G,
///             "Adaptive Three Operator Splitting", ICML 2018 ](https://arxiv.org/abs/1804.02339)
pub fn three_op_prox_grad<S, D, G, H1, H2, O>(
    g: &G,
    h1: &H1,
    h2: &H2,
    x0: ArrayView<S, D>,
    opts: &ProxOptions<S>,
    observer: &mut O,
) -> Result<Solution<S, D>>
where
    S: NdFloat,
    D: Dimension,
    G: Smooth<S, D>,
    H1: Penalty<S, D>,
    H2: Penalty<S, D>,
    O: Observer<S>,
{
    opts.validate()?;
    let two = S::one() + S::one();
    let cost = |z: &Array<S, D>| g.value(z.view()) + h1.value(z.view()) + h2.value(z.view());

    let mut s = opts.s0;
    let mut z = x0.to_owned();
    // dual variable
    let mut u: Array<S, D> = Array::zeros(z.raw_dim());

    let mut f = cost(&z);
    observer.initial(f);

    let mut warnings = Vec::new();
    let mut residual = S::zero();
    let mut status = Status::MaxIter {
        rel_change: S::infinity(),
    };
    let mut iterations = 0;

    for k in 1..=opts.max_iter {
        iterations = k;
        let g_z = g.value(z.view());
        let grad_z = g.gradient(z.view());
        if !all_finite(&grad_z) {
            return Err(Error::NonFiniteGradient {
                iteration: k,
                line_search_step: None,
            });
        }
        let dir = &u + &grad_z;

        let search = backtrack(s, opts.gamma, opts.max_line_iter, |s, _| {
            let x = h1.prox((&z - &(&dir * s)).view(), s);
            let step = &x - &z;
            // quadratic upper bound of g around z
            let quad = g_z + inner(&grad_z, &step) + inner(&step, &step) / (two * s);
            let sufficient = g.value(x.view()) - quad <= opts.ls_tol;
            Ok((x, sufficient))
        })?;
        s = search.step;
        let x = search.candidate;
        if !search.accepted {
            raise::<S, _>(observer, &mut warnings, Warning::LineSearchFailed { iteration: k });
        }

        z = h2.prox((&x + &(&u * s)).view(), s);
        let primal = &x - &z;
        u = u + &primal / s;
        residual = norm(&primal);
        s = (s / (opts.gamma * opts.gamma)).min(opts.s0);

        if !all_finite(&x) {
            raise::<S, _>(observer, &mut warnings, Warning::NonFiniteIterate { iteration: k });
        }

        let f_old = f;
        f = cost(&z);
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
        x: z,
        cost: f,
        iterations,
        status,
        warnings,
        residual,
    })
}
