//! The `mushi` crate infers mutation spectrum histories from k-SFS data by
//! minimizing composite objectives over `ndarray`s.
//!
//! It provides:
//! - accelerated proximal gradient descent
//! - adaptive three operator splitting
//! - penalties with closed form proximal operators
//! - the coalescent model matrices and k-SFS losses
//!
//! Both solvers backtrack on the step size, report progress through an
//! [`Observer`](observe::Observer) and distinguish fatal errors
//! ([`Error`]) from recoverable numerical trouble ([`Warning`](prox::Warning)).
//!
//! ```no_run
//! use mushi::ksfs::{model_matrix, Divergence, KsfsLoss};
//! use mushi::observe::Logger;
//! use mushi::penalty::{NonNegative, Smoothness};
//! use mushi::prox::three_op_prox_grad;
//! use mushi::ProxOptions;
//! use ndarray::prelude::*;
//!
//! # fn main() -> mushi::Result<()> {
//! let t = array![0., 1., 10., std::f64::INFINITY];
//! let y = array![1., 2., 1.];
//! let l = model_matrix(10, t.view(), y.view())?;
//! let x = Array2::from_elem((9, 6), 10.);
//! let loss = KsfsLoss::new(Divergence::Poisson, x, l)?;
//! let z0 = Array2::<f64>::ones(loss.history_shape());
//! let sol = three_op_prox_grad(
//!     &loss,
//!     &NonNegative,
//!     &Smoothness::new(1.),
//!     z0.view(),
//!     &ProxOptions::default().with_max_iter(1000),
//!     &mut Logger,
//! )?;
//! println!("{} after {} iterations", sol.cost, sol.iterations);
//! # Ok(())
//! # }
//! ```

#![cfg_attr(all(rustc_nightly, test), feature(test))]
#[cfg(all(rustc_nightly, test))]
extern crate test;

pub mod error;
pub mod ksfs;
pub mod linop;
pub mod observe;
pub mod options;
pub mod penalty;
pub mod prox;

pub use error::{Error, Result};
pub use options::ProxOptions;
