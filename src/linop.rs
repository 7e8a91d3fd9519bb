//! Abstract Linear Operators and Adjoints
//! building upon ndarray_linalg::operator
//!
//! The model matrix of a k-SFS loss is applied through its [`Adjoint`] when
//! forming gradients, and the time-smoothness penalty is defined through the
//! [`FirstDifference`] operator.

use std::marker::PhantomData;

use ndarray::prelude::*;
use ndarray::{Data, DataMut, DataOwned, NdFloat};
pub use ndarray_linalg::operator::LinearOperator;
use ndarray_linalg::Scalar;
use num_traits::Float;

pub trait Adjoint<'a> {
    type Output;
    fn adj(&'a self) -> Self::Output;
}

impl<'a, A, S> Adjoint<'a> for ArrayBase<S, Ix2>
where
    A: 'a + Float,
    S: Data<Elem = A>,
{
    type Output = ArrayView<'a, A, Ix2>;

    fn adj(&'a self) -> Self::Output {
        self.t()
    }
}

/// Forward difference along the first axis, padded to stay square.
///
/// ```math
/// (Dx)_i = x_{i+1} - x_i \quad (i < T-1), \qquad (Dx)_{T-1} = 0
/// ```
///
/// Applied to a matrix, it acts on every column, i.e. it differences
/// consecutive rows (epochs). The adjoint is
/// $`(D^Hy)_j = y_{j-1} - y_j`$ with out of range terms (and $`y_{T-1}`$) dropped,
/// so $`D^HD`$ is the tridiagonal path Laplacian.
#[derive(Debug, Clone, Copy)]
pub struct FirstDifference<A> {
    transposed: bool,
    phantom: PhantomData<*const A>,
}

impl<A> Default for FirstDifference<A> {
    fn default() -> Self {
        FirstDifference::new()
    }
}

impl<A> FirstDifference<A> {
    #[must_use]
    pub fn new() -> FirstDifference<A> {
        FirstDifference {
            transposed: false,
            phantom: PhantomData,
        }
    }

    /// Whether this is $`D^H`$ rather than $`D`$.
    pub fn is_adjoint(&self) -> bool {
        self.transposed
    }
}

fn difference_in_place<A, S>(a: &mut ArrayBase<S, Ix1>, transposed: bool)
where
    A: NdFloat,
    S: DataMut<Elem = A>,
{
    let t = a.len();
    if t == 0 {
        return;
    }
    if transposed {
        // descending, so a[j - 1] is still the input value
        for j in (0..t).rev() {
            let lower = if j >= 1 { a[j - 1] } else { A::zero() };
            let upper = if j + 1 < t { a[j] } else { A::zero() };
            a[j] = lower - upper;
        }
    } else {
        for i in 0..t - 1 {
            a[i] = a[i + 1] - a[i];
        }
        a[t - 1] = A::zero();
    }
}

impl<A> LinearOperator for FirstDifference<A>
where
    A: NdFloat + Scalar,
{
    type Elem = A;

    /// Apply operator out-place
    fn apply<S>(&self, a: &ArrayBase<S, Ix1>) -> Array1<S::Elem>
    where
        S: Data<Elem = Self::Elem>,
    {
        let mut b = a.to_owned();
        self.apply_mut(&mut b);
        b
    }

    /// Apply operator in-place
    fn apply_mut<S>(&self, a: &mut ArrayBase<S, Ix1>)
    where
        S: DataMut<Elem = Self::Elem>,
    {
        difference_in_place(a, self.transposed);
    }

    /// Apply operator with move
    fn apply_into<S>(&self, mut a: ArrayBase<S, Ix1>) -> ArrayBase<S, Ix1>
    where
        S: DataOwned<Elem = Self::Elem> + DataMut,
    {
        self.apply_mut(&mut a);
        a
    }

    /// Apply operator to matrix out-place
    fn apply2<S>(&self, a: &ArrayBase<S, Ix2>) -> Array2<S::Elem>
    where
        S: Data<Elem = Self::Elem>,
    {
        let mut b = a.to_owned();
        self.apply2_mut(&mut b);
        b
    }

    /// Apply operator to matrix in-place
    fn apply2_mut<S>(&self, a: &mut ArrayBase<S, Ix2>)
    where
        S: DataMut<Elem = Self::Elem>,
    {
        for mut col in a.axis_iter_mut(Axis(1)) {
            difference_in_place(&mut col, self.transposed);
        }
    }

    /// Apply operator to matrix with move
    fn apply2_into<S>(&self, mut a: ArrayBase<S, Ix2>) -> ArrayBase<S, Ix2>
    where
        S: DataOwned<Elem = Self::Elem> + DataMut,
    {
        self.apply2_mut(&mut a);
        a
    }
}

impl<'a, A: 'a> Adjoint<'a> for FirstDifference<A> {
    type Output = FirstDifference<A>;

    fn adj(&'a self) -> Self::Output {
        FirstDifference {
            transposed: !self.transposed,
            phantom: PhantomData,
        }
    }
}
