//! Losses between an observed k-SFS and its expectation under a history

use ndarray::prelude::*;
use ndarray::Zip;

use crate::error::{Error, Result};
use crate::linop::Adjoint;
use crate::prox::Smooth;

/// Expected k-SFS $`\Xi = LZ`$
fn expected(z: ArrayView2<f64>, l: ArrayView2<f64>) -> Array2<f64> {
    l.dot(&z)
}

/// $`x \ln \xi`$ with $`0 \ln \xi = 0`$, and $`-\infty`$ for a positive count
/// over a non-positive expectation
fn x_ln(x: f64, xi: f64) -> f64 {
    if x == 0. {
        0.
    } else if xi <= 0. {
        std::f64::NEG_INFINITY
    } else {
        x * xi.ln()
    }
}

/// Poisson random field log-likelihood of history `z`
///
/// ```math
/// \ell(Z) = \sum_{b,k} X_{bk} \ln \Xi_{bk} - \Xi_{bk}, \qquad \Xi = LZ
/// ```
/// up to the $`\ln X!`$ constant.
///
/// Parameters
/// ----------
/// - __z:__  mutation spectrum history, `T × K`
/// - __x:__  observed k-SFS, `(n - 1) × K`
/// - __l:__  model matrix, `(n - 1) × T`
pub fn prf(z: ArrayView2<f64>, x: ArrayView2<f64>, l: ArrayView2<f64>) -> f64 {
    let xi = expected(z, l);
    x.iter()
        .zip(xi.iter())
        .fold(0., |acc, (&x, &xi)| acc + x_ln(x, xi) - xi)
}

/// Generalized Kullback-Leibler divergence between the observed k-SFS and
/// its expectation
///
/// ```math
/// D(X \| \Xi) = \sum_{b,k} X_{bk} \ln \frac{X_{bk}}{\Xi_{bk}} - X_{bk} + \Xi_{bk}
/// ```
/// a Bregman divergence, with the arguments of [`prf`].
pub fn d_kl(z: ArrayView2<f64>, x: ArrayView2<f64>, l: ArrayView2<f64>) -> f64 {
    let xi = expected(z, l);
    x.iter().zip(xi.iter()).fold(0., |acc, (&x, &xi)| {
        let log_ratio = if x == 0. {
            0.
        } else {
            x_ln(x, x) - x_ln(x, xi)
        };
        acc + log_ratio - x + xi
    })
}

/// Least-squares loss $`\frac{1}{2}\|LZ - X\|_F^2`$, with the arguments of [`prf`]
pub fn lsq(z: ArrayView2<f64>, x: ArrayView2<f64>, l: ArrayView2<f64>) -> f64 {
    let xi = expected(z, l);
    x.iter()
        .zip(xi.iter())
        .fold(0., |acc, (&x, &xi)| acc + (xi - x) * (xi - x))
        / 2.
}

/// Which discrepancy [`KsfsLoss`] minimizes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Divergence {
    /// negative [`prf`]
    Poisson,
    /// [`d_kl`]
    KullbackLeibler,
    /// [`lsq`]
    LeastSquares,
}

/// Smooth term for inferring a mutation spectrum history
///
/// Pairs an observed k-SFS `x` with a model matrix `l` and exposes the
/// chosen [`Divergence`] as a function of the history $`Z`$, ready for
/// [`acc_prox_grad`](crate::prox::acc_prox_grad) or
/// [`three_op_prox_grad`](crate::prox::three_op_prox_grad). The gradients
/// are
/// ```math
/// L^H (1 - X / \Xi) \quad \text{(Poisson, KL)}, \qquad L^H (\Xi - X) \quad \text{(least squares)}
/// ```
/// A zero count contributes nothing to the log terms, while a positive
/// count over a non-positive expectation makes the cost $`+\infty`$ and the
/// gradient non-finite.
///
/// Histories must have shape [`history_shape`](KsfsLoss::history_shape);
/// other shapes panic in the matrix product.
#[derive(Debug, Clone)]
pub struct KsfsLoss {
    divergence: Divergence,
    x: Array2<f64>,
    l: Array2<f64>,
}

impl KsfsLoss {
    /// Errors with [`Error::ShapeMismatch`] unless `x` and `l` have the
    /// same number of rows.
    pub fn new(divergence: Divergence, x: Array2<f64>, l: Array2<f64>) -> Result<Self> {
        if l.nrows() != x.nrows() {
            return Err(Error::ShapeMismatch {
                what: "model matrix",
                expected: vec![x.nrows(), l.ncols()],
                found: l.shape().to_vec(),
            });
        }
        Ok(KsfsLoss { divergence, x, l })
    }

    pub fn divergence(&self) -> Divergence {
        self.divergence
    }

    /// `(T, K)`: epochs by mutation types
    pub fn history_shape(&self) -> (usize, usize) {
        (self.l.ncols(), self.x.ncols())
    }
}

impl Smooth<f64, Ix2> for KsfsLoss {
    fn value(&self, z: ArrayView2<f64>) -> f64 {
        let (x, l) = (self.x.view(), self.l.view());
        match self.divergence {
            Divergence::Poisson => -prf(z, x, l),
            Divergence::KullbackLeibler => d_kl(z, x, l),
            Divergence::LeastSquares => lsq(z, x, l),
        }
    }

    fn gradient(&self, z: ArrayView2<f64>) -> Array2<f64> {
        let xi = expected(z, self.l.view());
        let residual = match self.divergence {
            Divergence::Poisson | Divergence::KullbackLeibler => {
                let mut r = Array2::<f64>::zeros(xi.raw_dim());
                Zip::from(&mut r)
                    .and(&self.x)
                    .and(&xi)
                    .apply(|r, &x, &xi| {
                        *r = if x == 0. {
                            1.
                        } else if xi <= 0. {
                            std::f64::NEG_INFINITY
                        } else {
                            1. - x / xi
                        }
                    });
                r
            }
            Divergence::LeastSquares => xi - &self.x,
        };
        self.l.adj().dot(&residual)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ksfs::model_matrix;
    use crate::observe::{Silent, Trace};
    use crate::options::ProxOptions;
    use crate::penalty::{NonNegative, Smoothness, Zero};
    use crate::prox::{acc_prox_grad, three_op_prox_grad};
    use approx::assert_abs_diff_eq;
    use ndarray_rand::rand_distr::Uniform;
    use ndarray_rand::RandomExt;
    use std::f64::INFINITY;

    fn model() -> Array2<f64> {
        model_matrix(6, array![0., 0.5, 1., 2., INFINITY].view(), array![1., 2., 0.5, 1.].view())
            .unwrap()
    }

    #[test]
    fn loss_values() {
        let l = array![[1., 0.], [1., 1.]];
        let z = array![[1.], [2.]];
        let x = array![[2.], [0.]];
        // Xi = [1, 3]
        assert_abs_diff_eq!(prf(z.view(), x.view(), l.view()), -4.);
        assert_abs_diff_eq!(d_kl(z.view(), x.view(), l.view()), 2. * 2f64.ln() - 2. + 4.);
        assert_abs_diff_eq!(lsq(z.view(), x.view(), l.view()), 5.);
    }

    #[test]
    fn divergences_agree_at_the_data() {
        // a history that reproduces the data exactly
        let l = model();
        let z = Array::random((4, 3), Uniform::new(0.5, 2.));
        let x = l.dot(&z);
        assert_abs_diff_eq!(d_kl(z.view(), x.view(), l.view()), 0., epsilon = 1e-10);
        assert_abs_diff_eq!(lsq(z.view(), x.view(), l.view()), 0., epsilon = 1e-12);
        for &divergence in &[Divergence::Poisson, Divergence::KullbackLeibler, Divergence::LeastSquares] {
            let loss = KsfsLoss::new(divergence, x.clone(), l.clone()).unwrap();
            assert_abs_diff_eq!(loss.gradient(z.view()), Array2::<f64>::zeros((4, 3)), epsilon = 1e-10);
        }
    }

    #[test]
    fn gradient_matches_finite_differences() {
        let l = model();
        let x = Array::random((5, 2), Uniform::new(0., 10.)).mapv(f64::round);
        let z = Array::random((4, 2), Uniform::new(0.5, 2.));
        let eps = 1e-6;
        for &divergence in &[Divergence::Poisson, Divergence::KullbackLeibler, Divergence::LeastSquares] {
            let loss = KsfsLoss::new(divergence, x.clone(), l.clone()).unwrap();
            let grad = loss.gradient(z.view());
            for ((i, j), &g) in grad.indexed_iter() {
                let mut zp = z.clone();
                zp[(i, j)] += eps;
                let mut zm = z.clone();
                zm[(i, j)] -= eps;
                let fd = (loss.value(zp.view()) - loss.value(zm.view())) / (2. * eps);
                assert_abs_diff_eq!(g, fd, epsilon = 1e-5 * (1. + g.abs()));
            }
        }
    }

    #[test]
    fn zero_counts_and_expectations() {
        let l = array![[1., 0.], [0., 1.]];
        let x = array![[0.], [3.]];
        let loss = KsfsLoss::new(Divergence::Poisson, x.clone(), l.clone()).unwrap();

        // a zero count over a zero expectation is harmless
        let z = array![[0.], [1.]];
        assert_abs_diff_eq!(loss.value(z.view()), 1.);
        assert_abs_diff_eq!(loss.gradient(z.view()), array![[1.], [-2.]]);
        assert_abs_diff_eq!(d_kl(z.view(), x.view(), l.view()), 3. * 3f64.ln() - 2.);

        // a positive count over a zero expectation is not
        let z = array![[1.], [0.]];
        assert_eq!(loss.value(z.view()), INFINITY);
        assert_eq!(d_kl(z.view(), x.view(), l.view()), INFINITY);
        assert!(!loss.gradient(z.view()).iter().all(|v| v.is_finite()));
    }

    #[test]
    fn shape_mismatch() {
        let err = KsfsLoss::new(Divergence::Poisson, Array2::zeros((5, 2)), Array2::zeros((4, 3)));
        assert_eq!(
            err.unwrap_err(),
            Error::ShapeMismatch {
                what: "model matrix",
                expected: vec![5, 3],
                found: vec![4, 3],
            }
        );
        let loss =
            KsfsLoss::new(Divergence::LeastSquares, Array2::zeros((5, 2)), Array2::zeros((5, 3))).unwrap();
        assert_eq!(loss.history_shape(), (3, 2));
        assert_eq!(loss.divergence(), Divergence::LeastSquares);
    }

    #[test]
    fn least_squares_inference() {
        let l = model();
        let truth = Array::random((4, 2), Uniform::new(0.5, 2.));
        let x = l.dot(&truth);
        let loss = KsfsLoss::new(Divergence::LeastSquares, x, l).unwrap();
        let z0 = Array2::<f64>::ones(loss.history_shape());
        let opts = ProxOptions::default().with_max_iter(300);
        let mut trace = Trace::new();
        let sol = acc_prox_grad(&loss, &NonNegative, z0.view(), &opts, &mut trace).unwrap();
        assert!(sol.x.iter().all(|&v| v >= 0.));
        assert!(sol.cost < trace.costs[0]);
        assert_eq!(trace.costs.len(), sol.iterations + 1);

        let smooth = Smoothness::new(0.1);
        let sol = three_op_prox_grad(&loss, &NonNegative, &smooth, z0.view(), &opts, &mut Silent).unwrap();
        assert_eq!(sol.x.dim(), (4, 2));
        assert!(sol.cost < loss.value(z0.view()));
    }

    #[test]
    fn poisson_inference() {
        let l = model();
        let truth = array![[1., 2., 0.5], [1.5, 1., 0.5], [0.5, 2., 1.], [1., 1., 2.]];
        let x = (l.dot(&truth) * 10.).mapv(f64::round);
        let loss = KsfsLoss::new(Divergence::Poisson, x, l).unwrap();
        let z0 = Array2::<f64>::ones(loss.history_shape());
        let opts = ProxOptions::default().with_max_iter(200);
        let sol = three_op_prox_grad(&loss, &NonNegative, &Zero, z0.view(), &opts, &mut Silent).unwrap();
        assert_eq!(sol.x.dim(), (4, 3));
        assert!(sol.x.iter().all(|&v| v >= 0.));
        assert!(sol.cost < loss.value(z0.view()));
        assert!(sol.cost.is_finite());
    }
}
