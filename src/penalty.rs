//! Penalties with cheap proximal operators
//!
//! These fill the `h`, `h1` and `h2` slots of the methods in
//! [`crate::prox`]. For mutation spectrum histories the usual pairing is
//! [`NonNegative`] (rates cannot be negative) with [`Smoothness`] or [`L1`]
//! acting along the time axis.

use ndarray::prelude::*;
use ndarray::{Dimension, NdFloat};
use ndarray_linalg::Scalar;

use crate::linop::{FirstDifference, LinearOperator};
use crate::prox::Penalty;

/// $`h(x) = 0`$, whose prox is the identity
#[derive(Debug, Default, Clone, Copy)]
pub struct Zero;

impl<S, D> Penalty<S, D> for Zero
where
    S: NdFloat,
    D: Dimension,
{
    fn value(&self, _x: ArrayView<S, D>) -> S {
        S::zero()
    }

    fn prox(&self, v: ArrayView<S, D>, _step: S) -> Array<S, D> {
        v.to_owned()
    }
}

/// Indicator of the non-negative orthant
///
/// The prox clips negative entries to exactly zero and leaves `NaN`s
/// alone, so that invalid values stay visible to the solver.
#[derive(Debug, Default, Clone, Copy)]
pub struct NonNegative;

impl<S, D> Penalty<S, D> for NonNegative
where
    S: NdFloat,
    D: Dimension,
{
    fn value(&self, x: ArrayView<S, D>) -> S {
        if x.iter().all(|&v| v >= S::zero()) {
            S::zero()
        } else {
            S::infinity()
        }
    }

    fn prox(&self, v: ArrayView<S, D>, _step: S) -> Array<S, D> {
        v.mapv(|a| if a < S::zero() { S::zero() } else { a })
    }
}

/// $`h(x) = \lambda \|x\|_1`$, whose prox is soft thresholding at $`\lambda s`$
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct L1<S> {
    pub lambda: S,
}

impl<S> L1<S> {
    pub fn new(lambda: S) -> Self {
        L1 { lambda }
    }
}

impl<S, D> Penalty<S, D> for L1<S>
where
    S: NdFloat,
    D: Dimension,
{
    fn value(&self, x: ArrayView<S, D>) -> S {
        self.lambda * x.fold(S::zero(), |acc, &v| acc + v.abs())
    }

    fn prox(&self, v: ArrayView<S, D>, step: S) -> Array<S, D> {
        let threshold = self.lambda * step;
        v.mapv(|a| {
            if a > threshold {
                a - threshold
            } else if a < -threshold {
                a + threshold
            } else {
                S::zero()
            }
        })
    }
}

/// Squared first differences along the first (time) axis
///
/// ```math
/// h(X) = \frac{\lambda}{2} \|DX\|_F^2
/// ```
/// with $`D`$ the [`FirstDifference`] operator, so consecutive epochs of a
/// history are pulled together. The prox solves the tridiagonal system
/// ```math
/// (I + \lambda s D^HD) X = V
/// ```
/// column by column with the Thomas algorithm.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Smoothness<S> {
    pub lambda: S,
}

impl<S> Smoothness<S> {
    pub fn new(lambda: S) -> Self {
        Smoothness { lambda }
    }
}

/// Solve $`(I + cD^HD)X = V`$ in place, one column at a time.
fn laplacian_solve<S: NdFloat>(mut v: Array2<S>, c: S) -> Array2<S> {
    let t = v.nrows();
    if t < 2 || c == S::zero() {
        return v;
    }
    let one = S::one();
    let two = one + one;
    let off = -c;
    // forward elimination is shared by all columns
    let mut denom = Vec::with_capacity(t);
    let mut upper = Vec::with_capacity(t);
    for i in 0..t {
        let diag = one + c * if i == 0 || i == t - 1 { one } else { two };
        let d = if i == 0 {
            diag
        } else {
            diag - off * upper[i - 1]
        };
        denom.push(d);
        upper.push(off / d);
    }
    for mut col in v.axis_iter_mut(Axis(1)) {
        col[0] = col[0] / denom[0];
        for i in 1..t {
            col[i] = (col[i] - off * col[i - 1]) / denom[i];
        }
        for i in (0..t - 1).rev() {
            col[i] = col[i] - upper[i] * col[i + 1];
        }
    }
    v
}

impl<S> Penalty<S, Ix2> for Smoothness<S>
where
    S: NdFloat + Scalar,
{
    fn value(&self, x: ArrayView2<S>) -> S {
        let dx = FirstDifference::<S>::new().apply2(&x);
        let two = S::one() + S::one();
        self.lambda * dx.fold(S::zero(), |acc, &v| acc + v * v) / two
    }

    fn prox(&self, v: ArrayView2<S>, step: S) -> Array2<S> {
        laplacian_solve(v.to_owned(), self.lambda * step)
    }
}

impl<S> Penalty<S, Ix1> for Smoothness<S>
where
    S: NdFloat + Scalar,
{
    fn value(&self, x: ArrayView1<S>) -> S {
        Penalty::<S, Ix2>::value(self, x.insert_axis(Axis(1)))
    }

    fn prox(&self, v: ArrayView1<S>, step: S) -> Array1<S> {
        Penalty::<S, Ix2>::prox(self, v.insert_axis(Axis(1)), step).index_axis_move(Axis(1), 0)
    }
}
