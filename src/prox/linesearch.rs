//! Backtracking step size search

use ndarray::NdFloat;

use crate::error::Result;

/// Outcome of [`backtrack`]
pub(crate) struct Backtrack<S, T> {
    /// last candidate produced
    pub candidate: T,
    /// step size after the search; shrunk once more than the last
    /// attempt when the search failed
    pub step: S,
    pub accepted: bool,
}

/// Shrink the step by `gamma` until `attempt` reports sufficient decrease.
///
/// `attempt(step, line_iter)` returns a candidate and whether it is
/// accepted; `line_iter` counts from 1. At most `max_line_iter` attempts
/// are made (at least one always is). The first error aborts the search.
pub(crate) fn backtrack<S, T>(
    mut step: S,
    gamma: S,
    max_line_iter: usize,
    mut attempt: impl FnMut(S, usize) -> Result<(T, bool)>,
) -> Result<Backtrack<S, T>>
where
    S: NdFloat,
{
    let mut line_iter = 1;
    let (mut candidate, mut sufficient) = attempt(step, line_iter)?;
    while !sufficient {
        step *= gamma;
        if line_iter >= max_line_iter {
            return Ok(Backtrack {
                candidate,
                step,
                accepted: false,
            });
        }
        line_iter += 1;
        let (next, ok) = attempt(step, line_iter)?;
        candidate = next;
        sufficient = ok;
    }
    Ok(Backtrack {
        candidate,
        step,
        accepted: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use approx::assert_abs_diff_eq;

    #[test]
    fn accepts_first_sufficient_step() {
        // gradient step on x^2 from x = 10 decreases only for step < 1
        let res = backtrack(1., 0.5, 10, |s, _| {
            let x = 10. - s * 20.;
            Ok((x, x * x < 100.))
        })
        .unwrap();
        assert!(res.accepted);
        assert_abs_diff_eq!(res.step, 0.5);
        assert_abs_diff_eq!(res.candidate, 0.);
    }

    #[test]
    fn exhaustion_keeps_last_candidate() {
        let mut calls = Vec::new();
        let res = backtrack(1., 0.5, 3, |s, line_iter| {
            calls.push(line_iter);
            Ok((s, false))
        })
        .unwrap();
        assert!(!res.accepted);
        assert_eq!(calls, vec![1, 2, 3]);
        assert_abs_diff_eq!(res.candidate, 0.25);
        assert_abs_diff_eq!(res.step, 0.125);
    }

    #[test]
    fn errors_abort() {
        let res: Result<Backtrack<f64, f64>> = backtrack(1., 0.5, 3, |_, line_iter| {
            if line_iter == 2 {
                Err(Error::NonFiniteGradient {
                    iteration: 1,
                    line_search_step: Some(line_iter),
                })
            } else {
                Ok((0., false))
            }
        });
        assert_eq!(
            res.err(),
            Some(Error::NonFiniteGradient {
                iteration: 1,
                line_search_step: Some(2)
            })
        );
    }
}
