//! Error types for the solvers and the k-SFS model builders.

use thiserror::Error;

/// Errors that abort a computation.
///
/// Numerical trouble that a run may recover from (a failed line search,
/// a non-finite iterate) is not an error; see [`Warning`](crate::prox::Warning).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The gradient of the smooth term has a non-finite entry.
    ///
    /// `line_search_step` is `None` when the gradient is checked once,
    /// before the line search.
    #[error("invalid gradient at iteration {iteration}{}", fmt_line_step(.line_search_step))]
    NonFiniteGradient {
        iteration: usize,
        line_search_step: Option<usize>,
    },

    /// A solver option is out of range.
    #[error("invalid option {name} = {value}: {reason}")]
    InvalidOption {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    /// Operands with incompatible shapes.
    #[error("shape mismatch for {what}: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        what: &'static str,
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    /// The number of sampled haplotypes is too small.
    #[error("invalid sample size n = {n}: at least 3 haplotypes are required")]
    InvalidSampleSize { n: usize },

    /// Bad time grid or epoch population sizes.
    #[error("invalid time grid: {reason}")]
    InvalidTimeGrid { reason: &'static str },
}

fn fmt_line_step(step: &Option<usize>) -> String {
    match step {
        Some(step) => format!(", line search step {}", step),
        None => String::new(),
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
