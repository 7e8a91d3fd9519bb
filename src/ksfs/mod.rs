//! k-SFS models for mutation spectrum history inference
//!
//! The k-SFS of `n` sampled haplotypes counts, for each mutation type `k`,
//! the sites where `b = 1, ..., n - 1` haplotypes carry the derived allele.
//! Given a piecewise constant demography, [`model_matrix`] maps a history of
//! mutation rates per epoch and type to its expected k-SFS, and [`KsfsLoss`]
//! scores a history against observed counts so the methods of
//! [`crate::prox`] can infer it.

mod matrices;
pub use matrices::*;

mod loss;
pub use loss::*;
