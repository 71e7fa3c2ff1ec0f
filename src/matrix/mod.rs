//! Matrix abstraction and composable views
//!
//! Every numeric routine in this crate works through the [`Matrix`] trait: a
//! read-only 2-D view exposing its dimensions, element access and a lazy
//! transpose. Concrete storage ([`Dense`], [`Vector`]) and views
//! ([`SubMatrix`], [`ZeroPadMatrix`], [`DiagMatrix`], [`Transposed`]) all
//! implement it, so views nest freely: a window over a zero-padded image plane
//! is just `SubMatrix::new(ZeroPadMatrix::new(plane, pad), ...)`.
//!
//! Views borrow or own their parent and compute coordinates on demand. Nothing
//! is copied when a view is built.

pub mod dense;
pub mod vector;
pub mod views;

pub use dense::{Dense, Transposed};
pub use vector::Vector;
pub use views::{DiagMatrix, SubMatrix, ZeroPadMatrix};

/// Read-only 2-D numeric view.
///
/// `at(i, j)` must be defined for all `i < rows` and `j < cols`. Out-of-range
/// access panics with a message naming the index and the matrix size.
pub trait Matrix {
    /// Returns `(rows, cols)`.
    fn dims(&self) -> (usize, usize);

    /// Element at row `i`, column `j`.
    fn at(&self, i: usize, j: usize) -> f64;

    /// Transposed view. Transposing twice yields a view with the same values
    /// as the original.
    fn t(&self) -> Box<dyn Matrix + '_>;

    /// Number of rows.
    fn rows(&self) -> usize {
        self.dims().0
    }

    /// Number of columns.
    fn cols(&self) -> usize {
        self.dims().1
    }

    /// Copies row `i` into a new vector.
    fn row(&self, i: usize) -> Vec<f64> {
        (0..self.cols()).map(|j| self.at(i, j)).collect()
    }

    /// Copies column `j` into a new vector.
    fn col(&self, j: usize) -> Vec<f64> {
        (0..self.rows()).map(|i| self.at(i, j)).collect()
    }
}

impl<M: Matrix + ?Sized> Matrix for &M {
    fn dims(&self) -> (usize, usize) {
        (**self).dims()
    }

    fn at(&self, i: usize, j: usize) -> f64 {
        (**self).at(i, j)
    }

    fn t(&self) -> Box<dyn Matrix + '_> {
        (**self).t()
    }
}

impl<M: Matrix + ?Sized> Matrix for Box<M> {
    fn dims(&self) -> (usize, usize) {
        (**self).dims()
    }

    fn at(&self, i: usize, j: usize) -> f64 {
        (**self).at(i, j)
    }

    fn t(&self) -> Box<dyn Matrix + '_> {
        (**self).t()
    }
}

#[inline]
pub(crate) fn check_index(dims: (usize, usize), i: usize, j: usize) {
    assert!(
        i < dims.0 && j < dims.1,
        "index ({}, {}) out of range for {}x{} matrix",
        i,
        j,
        dims.0,
        dims.1
    );
}

/// Flattens a matrix into a row-major sequence.
pub fn mat_flatten(m: &dyn Matrix) -> Vec<f64> {
    let (rows, cols) = m.dims();
    let mut out = Vec::with_capacity(rows * cols);
    for i in 0..rows {
        for j in 0..cols {
            out.push(m.at(i, j));
        }
    }
    out
}

/// Elementwise product-sum of two matrices of identical shape.
///
/// # Panics
///
/// Panics if the shapes differ.
pub fn dot(a: &dyn Matrix, b: &dyn Matrix) -> f64 {
    let (rows, cols) = a.dims();
    assert_eq!(
        (rows, cols),
        b.dims(),
        "dot operands must share a shape"
    );
    let mut acc = 0.0;
    for i in 0..rows {
        for j in 0..cols {
            acc += a.at(i, j) * b.at(i, j);
        }
    }
    acc
}

/// Pointwise equality of two matrices (same shape, identical values).
pub fn equal(a: &dyn Matrix, b: &dyn Matrix) -> bool {
    a.dims() == b.dims() && mat_flatten(a) == mat_flatten(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_row_major() {
        let m = Dense::new(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        assert_eq!(mat_flatten(&m), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(mat_flatten(&*m.t()), vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
    }

    #[test]
    fn test_dot() {
        let a = Dense::new(2, 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let b = Dense::new(2, 2, vec![0.5, 0.0, -1.0, 2.0]).unwrap();
        assert_eq!(dot(&a, &b), 0.5 - 3.0 + 8.0);
    }

    #[test]
    fn test_double_transpose_equal() {
        let m = Dense::new(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let tt = m.t();
        assert!(equal(&*tt.t(), &m));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_out_of_range_panics() {
        let m = Dense::zeros(2, 2);
        m.at(2, 0);
    }
}
