//! Solver configuration shared by the proximal gradient methods.

use ndarray::NdFloat;

use crate::error::{Error, Result};

/// Tuning knobs for [`acc_prox_grad`](crate::prox::acc_prox_grad) and
/// [`three_op_prox_grad`](crate::prox::three_op_prox_grad).
///
/// Parameters
/// ----------
/// - __tol:__           relative tolerance on the change of the objective
/// - __max_iter:__      maximum number of proximal gradient steps
/// - __s0:__            initial (and, for splitting, maximal) step size
/// - __max_line_iter:__ maximum number of backtracking attempts per step
/// - __gamma:__         step size shrinkage rate for the line search, in (0, 1)
/// - __ls_tol:__        slack allowed in the splitting line search test
///
/// `ls_tol` is ignored by the accelerated method.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProxOptions<S> {
    pub tol: S,
    pub max_iter: usize,
    pub s0: S,
    pub max_line_iter: usize,
    pub gamma: S,
    pub ls_tol: S,
}

impl<S: NdFloat> Default for ProxOptions<S> {
    fn default() -> Self {
        ProxOptions {
            tol: S::from(1e-10).unwrap(),
            max_iter: 100,
            s0: S::one(),
            max_line_iter: 100,
            gamma: S::from(0.8).unwrap(),
            ls_tol: S::zero(),
        }
    }
}

impl<S: NdFloat> ProxOptions<S> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_tol(mut self, tol: S) -> Self {
        self.tol = tol;
        self
    }

    #[must_use]
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    #[must_use]
    pub fn with_step(mut self, s0: S) -> Self {
        self.s0 = s0;
        self
    }

    #[must_use]
    pub fn with_max_line_iter(mut self, max_line_iter: usize) -> Self {
        self.max_line_iter = max_line_iter;
        self
    }

    #[must_use]
    pub fn with_gamma(mut self, gamma: S) -> Self {
        self.gamma = gamma;
        self
    }

    #[must_use]
    pub fn with_ls_tol(mut self, ls_tol: S) -> Self {
        self.ls_tol = ls_tol;
        self
    }

    /// Check every option is in range.
    ///
    /// # Errors
    /// [`Error::InvalidOption`] naming the first offending option.
    pub fn validate(&self) -> Result<()> {
        let invalid = |name, value: S, reason| Error::InvalidOption {
            name,
            value: value.to_f64().unwrap_or(std::f64::NAN),
            reason,
        };
        if !self.tol.is_finite() || self.tol < S::zero() {
            return Err(invalid("tol", self.tol, "must be finite and non-negative"));
        }
        if self.max_iter == 0 {
            return Err(Error::InvalidOption {
                name: "max_iter",
                value: 0.,
                reason: "must be at least 1",
            });
        }
        if !self.s0.is_finite() || self.s0 <= S::zero() {
            return Err(invalid("s0", self.s0, "must be finite and positive"));
        }
        if self.max_line_iter == 0 {
            return Err(Error::InvalidOption {
                name: "max_line_iter",
                value: 0.,
                reason: "must be at least 1",
            });
        }
        if !(self.gamma > S::zero() && self.gamma < S::one()) {
            return Err(invalid("gamma", self.gamma, "must lie strictly between 0 and 1"));
        }
        if !self.ls_tol.is_finite() || self.ls_tol < S::zero() {
            return Err(invalid("ls_tol", self.ls_tol, "must be finite and non-negative"));
        }
        Ok(())
    }
}
