//! Reductions and elementwise numeric helpers
//!
//! Everything here takes `&dyn Matrix`, so the helpers work on dense storage
//! and on any view (sub-windows, padded planes, transposes) alike.

use crate::error::{NnError, Result};
use crate::matrix::{Dense, DiagMatrix, Matrix, Vector};

/// Guards `ln(0)` in [`cross_entropy_error`].
pub const CROSS_ENTROPY_DELTA: f64 = 1e-6;

/// Sum of a slice.
pub fn sum(s: &[f64]) -> f64 {
    s.iter().sum()
}

/// Vector whose entry `i` is the sum of row `i`.
pub fn sum_rows(m: &dyn Matrix) -> Vector {
    let (rows, cols) = m.dims();
    Vector::new(
        (0..rows)
            .map(|i| (0..cols).map(|j| m.at(i, j)).sum())
            .collect(),
    )
}

/// Vector whose entry `j` is the sum of column `j`.
pub fn sum_cols(m: &dyn Matrix) -> Vector {
    sum_rows(&*m.t())
}

/// Vector whose entry `i` is the maximum of row `i` (`-inf` for empty rows).
pub fn max_rows(m: &dyn Matrix) -> Vector {
    let (rows, cols) = m.dims();
    Vector::new(
        (0..rows)
            .map(|i| (0..cols).map(|j| m.at(i, j)).fold(f64::NEG_INFINITY, f64::max))
            .collect(),
    )
}

/// Divides every row of `m` by its sum.
///
/// Implemented as a left product with the diagonal matrix of reciprocal row
/// sums.
pub fn normalize_each_row(m: &mut Dense) {
    let mut denom = sum_rows(&*m);
    denom.apply(|x| 1.0 / x);
    let k = DiagMatrix::new(denom);
    *m = Dense::mul(&k, &*m);
}

/// Row-wise softmax.
///
/// Each row is shifted by its maximum before exponentiating, so the result is
/// invariant to adding a constant to a row and does not overflow for large
/// inputs.
///
/// # Example
///
/// ```
/// use rust_cnn_layers::matrix::{Dense, Matrix};
/// use rust_cnn_layers::utils::softmax;
///
/// let x = Dense::new(1, 3, vec![1000.0, 1000.0, 1000.0]).unwrap();
/// let y = softmax(&x);
/// assert!((y.at(0, 0) - 1.0 / 3.0).abs() < 1e-12);
/// ```
pub fn softmax(m: &dyn Matrix) -> Dense {
    let max = max_rows(m);
    let mut ret = Dense::apply(m, |i, _, x| (x - max.at_vec(i)).exp());
    normalize_each_row(&mut ret);
    ret
}

/// Softmax over a single vector.
pub fn softmax_vec(v: &Vector) -> Vector {
    let mut ret = v.clone();
    if let Some(max) = ret.max() {
        ret.add_each(-max);
        ret.apply(f64::exp);
        let denom = 1.0 / ret.sum();
        ret.scale(denom);
    }
    ret
}

/// Cross-entropy between predictions `y` and targets `t` of identical shape.
///
/// With more than one column, rows are a batch and the result is averaged
/// over rows. A single column is treated as one vector and the sum is
/// returned unnormalised.
pub fn cross_entropy_error(y: &dyn Matrix, t: &dyn Matrix) -> Result<f64> {
    if y.dims() != t.dims() {
        return Err(NnError::shape("cross_entropy_error", y.dims(), t.dims()));
    }
    let (rows, cols) = y.dims();
    let mut acc = 0.0;
    for i in 0..rows {
        for j in 0..cols {
            acc += (y.at(i, j) + CROSS_ENTROPY_DELTA).ln() * t.at(i, j);
        }
    }
    if cols == 1 {
        Ok(-acc)
    } else {
        Ok(-acc / rows as f64)
    }
}

/// Index of the largest value, first occurrence winning ties. `None` when
/// empty.
pub fn argmax(v: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &x) in v.iter().enumerate() {
        match best {
            Some((_, max)) if x > max => best = Some((i, x)),
            None => best = Some((i, x)),
            _ => {}
        }
    }
    best.map(|(i, _)| i)
}

/// Index of the largest vector element, first occurrence winning ties.
///
/// Fails with [`NnError::EmptyVector`] on a zero-length vector.
pub fn argmax_v(v: &Vector) -> Result<usize> {
    match v.len() {
        0 => Err(NnError::EmptyVector),
        1 => Ok(0),
        _ => {
            let mut max = v.at_vec(0);
            let mut ret = 0;
            for i in 1..v.len() {
                if v.at_vec(i) > max {
                    max = v.at_vec(i);
                    ret = i;
                }
            }
            Ok(ret)
        }
    }
}

/// `| |a| / |b| - 1 |`, the relative error of `a` against reference `b`.
pub fn error_rate(a: f64, b: f64) -> f64 {
    (a.abs() / b.abs() - 1.0).abs()
}

/// Relative error below 0.1%. Two zeros compare equal.
pub fn nearly_equal(a: f64, b: f64) -> bool {
    if a == b {
        return true;
    }
    error_rate(a, b) < 0.001
}
