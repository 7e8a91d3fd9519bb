//! Model matrices relating a demographic history to the expected SFS

use ndarray::prelude::*;

use crate::error::{Error, Result};

/// Coalescent combinatorial matrix $`C`$ for `n` sampled haplotypes
///
/// Entry $`(b, j)`$, for $`b, j = 1, \dots, n-1`$, weighs the expected
/// time with $`j + 1`$ lineages into the expected number of sites where
/// $`b`$ of the $`n`$ haplotypes carry the derived allele. The matrix is
/// the difference $`W_1 - W_2`$ of two hypergeometric-type sums, whose
/// columns are generated by three-term recurrences in $`j`$:
/// ```math
/// w_{j+2} = \frac{a_j w_j + b_j w_{j+1}}{d_j}
/// ```
/// with polynomial coefficients in $`j`$, $`b`$ and $`n`$ and the first two
/// columns given in closed form.
///
/// The first row sums to $`n`$ and every other row sums to zero.
///
/// Errors
/// ------
/// [`Error::InvalidSampleSize`] for `n < 3`.
pub fn combinatorial_matrix(n: usize) -> Result<Array2<f64>> {
    if n < 3 {
        return Err(Error::InvalidSampleSize { n });
    }
    let nf = n as f64;
    let mut c = Array2::<f64>::zeros((n - 1, n - 1));
    let mut w1 = Array1::<f64>::zeros(n - 1);
    let mut w2 = Array1::<f64>::zeros(n - 1);
    for (row, mut out) in c.outer_iter_mut().enumerate() {
        let b = (row + 1) as f64;
        w1.fill(0.);
        w2.fill(0.);
        w1[0] = 6. / (nf + 1.);
        w1[1] = 10. * (5. * nf - 6. * b - 4.) / (nf + 2.) / (nf + 1.);
        w2[1] = 20. * (nf - 2.) / (nf + 1.) / (nf + 2.);
        for col in 0..n - 3 {
            let j = (col + 2) as f64;
            let (j2, j3, j4) = (j * j, j * j * j, j * j * j * j);

            let a1 = (j - 1.)
                * (1. + j).powi(2)
                * (3. + 2. * j)
                * (j - nf)
                * (4. + 2. * j - 2. * b * j + j2 - b * j2 + 4. * nf + 2. * j * nf + j2 * nf);
            let b1 = (2. * j - 1.)
                * (3. + 2. * j)
                * (-4. * j - 12. * b * j - 4. * b * b * j - 6. * j2 - 12. * b * j2
                    - 2. * b * b * j2
                    - 4. * j3
                    + 4. * b * b * j3
                    - 2. * j4
                    + 2. * b * b * j4
                    + 4. * nf
                    + 2. * j * nf
                    - 6. * b * j * nf
                    + j2 * nf
                    - 9. * b * j2 * nf
                    - 2. * j3 * nf
                    - 6. * b * j3 * nf
                    - j4 * nf
                    - 3. * b * j4 * nf
                    + 4. * nf * nf
                    + 6. * j * nf * nf
                    + 7. * j2 * nf * nf
                    + 2. * j3 * nf * nf
                    + j4 * nf * nf);
            let d1 = j2
                * (2. + j)
                * (2. * j - 1.)
                * (1. + j + nf)
                * (3. + b + j2 - b * j2 + 3. * nf + j2 * nf);
            w1[col + 2] = (a1 * w1[col] + b1 * w1[col + 1]) / d1;

            let a2 = (j - 1.)
                * (1. + j)
                * (2. + j)
                * (3. + 2. * j)
                * (j - nf)
                * (1. + j - nf)
                * (1. + j + nf);
            let b2 = (2. * j - 1.)
                * (3. + 2. * j)
                * (1. + j - nf)
                * (j + nf)
                * (2. - j - 2. * b * j - j2 - 2. * b * j2 + 2. * nf + j * nf + j2 * nf);
            let d2 = (j - 1.) * j * (2. + j) * (2. * j - 1.) * (j - nf) * (j + nf) * (1. + j + nf);
            w2[col + 2] = (a2 * w2[col] + b2 * w2[col + 1]) / d2;
        }
        out.assign(&(&w1 - &w2));
    }
    Ok(c)
}

/// Check a piecewise constant history: `t` holds the `T + 1` epoch
/// boundaries and `y` the `T` epoch sizes.
fn validate_history(t: ArrayView1<f64>, y: ArrayView1<f64>) -> Result<()> {
    if y.is_empty() {
        return Err(Error::InvalidTimeGrid {
            reason: "at least one epoch is required",
        });
    }
    if t.len() != y.len() + 1 {
        return Err(Error::InvalidTimeGrid {
            reason: "t must have one more entry than y",
        });
    }
    if t[0] != 0. {
        return Err(Error::InvalidTimeGrid {
            reason: "t must start at 0",
        });
    }
    if t[t.len() - 1] != std::f64::INFINITY {
        return Err(Error::InvalidTimeGrid {
            reason: "t must end at infinity",
        });
    }
    if (1..t.len()).any(|i| !(t[i] > t[i - 1])) {
        return Err(Error::InvalidTimeGrid {
            reason: "t must be strictly increasing",
        });
    }
    if y.iter().any(|&v| !(v > 0.) || !v.is_finite()) {
        return Err(Error::InvalidTimeGrid {
            reason: "y must be positive and finite",
        });
    }
    Ok(())
}

/// Epoch matrix $`M`$ of a piecewise constant history
///
/// The history has size $`y_j`$ on $`[t_j, t_{j+1})`$, with $`t_0 = 0`$ and
/// the last epoch unbounded. With $`c_m = \binom{m}{2}`$ and
/// ```math
/// A_{m,j} = \frac{1}{c_m} \exp\Big(-c_m \sum_{l < j} \frac{t_{l+1} - t_l}{y_l}\Big),
/// \qquad A_{m,T} = 0,
/// ```
/// the entries are $`M_{m,j} = y_j (A_{m,j} - A_{m,j+1})`$ for
/// $`m = 2, \dots, n`$, i.e. the expected time spent with $`m`$ lineages
/// during epoch $`j`$. Shape `(n - 1, T)`.
///
/// Errors
/// ------
/// [`Error::InvalidSampleSize`] for `n < 3`, [`Error::InvalidTimeGrid`] when
/// `t` does not run strictly increasing from `0` to `inf`, or `y` is not
/// positive and finite.
pub fn epoch_matrix(n: usize, t: ArrayView1<f64>, y: ArrayView1<f64>) -> Result<Array2<f64>> {
    if n < 3 {
        return Err(Error::InvalidSampleSize { n });
    }
    validate_history(t, y)?;
    let epochs = y.len();
    // coalescent time units elapsed before each epoch; the infinite
    // last epoch never contributes
    let mut elapsed = Array1::<f64>::zeros(epochs);
    for j in 1..epochs {
        elapsed[j] = elapsed[j - 1] + (t[j] - t[j - 1]) / y[j - 1];
    }
    let mut m = Array2::<f64>::zeros((n - 1, epochs));
    for (row, mut out) in m.outer_iter_mut().enumerate() {
        let lineages = (row + 2) as f64;
        let c = lineages * (lineages - 1.) / 2.;
        let a = |j: usize| {
            if j == epochs {
                0.
            } else {
                (-c * elapsed[j]).exp() / c
            }
        };
        for j in 0..epochs {
            out[j] = y[j] * (a(j) - a(j + 1));
        }
    }
    Ok(m)
}

/// Model matrix $`L = CM`$ mapping a history's mutation rates per epoch to
/// the expected SFS, shape `(n - 1, T)`.
///
/// See [`combinatorial_matrix`] and [`epoch_matrix`].
pub fn model_matrix(n: usize, t: ArrayView1<f64>, y: ArrayView1<f64>) -> Result<Array2<f64>> {
    let m = epoch_matrix(n, t, y)?;
    let c = combinatorial_matrix(n)?;
    Ok(c.dot(&m))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::INFINITY;

    #[test]
    fn combinatorial_small() {
        let c = combinatorial_matrix(4).unwrap();
        assert_abs_diff_eq!(
            c,
            array![[1.2, 2., 0.8], [1.2, 0., -1.2], [1.2, -2., 0.8]],
            epsilon = 1e-12
        );
        let c = combinatorial_matrix(5).unwrap();
        assert_abs_diff_eq!(
            c.row(0),
            array![1., 2.142857142857142, 1.5, 0.357142857142857],
            epsilon = 1e-12
        );
    }

    #[test]
    fn combinatorial_leading_columns() {
        for n in 3..=20 {
            let c = combinatorial_matrix(n).unwrap();
            let nf = n as f64;
            for (row, c_b) in c.outer_iter().enumerate() {
                let b = (row + 1) as f64;
                assert_abs_diff_eq!(c_b[0], 6. / (nf + 1.), epsilon = 1e-12);
                let second = 10. * (5. * nf - 6. * b - 4.) / ((nf + 2.) * (nf + 1.))
                    - 20. * (nf - 2.) / ((nf + 1.) * (nf + 2.));
                assert_abs_diff_eq!(c_b[1], second, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn combinatorial_row_sums() {
        for &n in &[3, 4, 7, 15] {
            let c = combinatorial_matrix(n).unwrap();
            assert_eq!(c.dim(), (n - 1, n - 1));
            let sums = c.sum_axis(Axis(1));
            assert_abs_diff_eq!(sums[0], n as f64, epsilon = 1e-9);
            for &s in sums.iter().skip(1) {
                assert_abs_diff_eq!(s, 0., epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn small_sample_size() {
        assert_eq!(combinatorial_matrix(2), Err(Error::InvalidSampleSize { n: 2 }));
        let t = array![0., INFINITY];
        let y = array![1.];
        assert_eq!(
            epoch_matrix(1, t.view(), y.view()),
            Err(Error::InvalidSampleSize { n: 1 })
        );
    }

    #[test]
    fn epoch_matrix_values() {
        let t = array![0., 1., 3., INFINITY];
        let y = array![2., 1., 3.];
        let m = epoch_matrix(5, t.view(), y.view()).unwrap();
        assert_eq!(m.dim(), (4, 3));
        assert_abs_diff_eq!(
            m.row(0),
            array![0.7869386805747332, 0.5244456610887346, 0.2462549958716964],
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(
            m.row(3),
            array![0.1986524106001829, 0.0006737946985197524, 4.166383159489206e-12],
            epsilon = 1e-12
        );
    }

    #[test]
    fn constant_history() {
        // a single epoch of size 2 spends 1 / c_m time units with m lineages
        let m = epoch_matrix(3, array![0., INFINITY].view(), array![2.].view()).unwrap();
        assert_abs_diff_eq!(m, array![[2.], [2. / 3.]], epsilon = 1e-12);
        // and the expected SFS of a unit size history is 2 / b
        let l = model_matrix(6, array![0., INFINITY].view(), array![1.].view()).unwrap();
        let expected = Array1::from_shape_fn(5, |b| 2. / (b + 1) as f64);
        assert_abs_diff_eq!(l.column(0), expected, epsilon = 1e-10);
    }

    #[test]
    fn model_matrix_values() {
        let t = array![0., 1., 3., INFINITY];
        let y = array![2., 1., 3.];
        let l = model_matrix(5, t.view(), y.view()).unwrap();
        assert_eq!(l.dim(), (4, 3));
        assert_abs_diff_eq!(
            l.row(0),
            array![2.4428064928216804, 0.6961166182247932, 0.24744040609309872],
            epsilon = 1e-10
        );
        assert!(l.iter().all(|&v| v > 0.));
    }

    #[test]
    fn invalid_time_grids() {
        let y = array![1., 1.];
        let bad = [
            array![0., 1.],
            array![1., 2., INFINITY],
            array![0., 1., 5.],
            array![0., 0., INFINITY],
            array![0., -1., INFINITY],
        ];
        for t in bad.iter() {
            match epoch_matrix(4, t.view(), y.view()) {
                Err(Error::InvalidTimeGrid { .. }) => {}
                other => panic!("expected an invalid time grid, got {:?}", other),
            }
        }
        let t = array![0., 1., INFINITY];
        for y in [array![1., 0.], array![-1., 1.], array![1., INFINITY]].iter() {
            match model_matrix(4, t.view(), y.view()) {
                Err(Error::InvalidTimeGrid { .. }) => {}
                other => panic!("expected an invalid time grid, got {:?}", other),
            }
        }
        assert!(epoch_matrix(4, array![0.].view(), Array1::zeros(0).view()).is_err());
    }
}
