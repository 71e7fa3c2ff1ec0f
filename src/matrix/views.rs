//! Lazy windowing, padding and diagonal views
//!
//! Each view holds its parent (usually by reference) and maps coordinates on
//! every access. Construction is `O(1)` and element access costs one hop per
//! level of nesting.

use super::{check_index, Matrix, Vector};
use crate::error::{NnError, Result};

/// Rectangular window `[i0, i0 + rows) × [j0, j0 + cols)` into a parent matrix.
///
/// # Example
///
/// ```
/// use rust_cnn_layers::matrix::{Dense, Matrix, SubMatrix, ZeroPadMatrix};
///
/// let m = Dense::new(2, 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
/// let padded = ZeroPadMatrix::new(&m, 1);
/// let window = SubMatrix::new(&padded, 0, 0, 3, 3).unwrap();
/// assert_eq!(window.at(0, 0), 0.0);
/// assert_eq!(window.at(1, 1), 1.0);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SubMatrix<M> {
    parent: M,
    i0: usize,
    j0: usize,
    rows: usize,
    cols: usize,
}

impl<M: Matrix> SubMatrix<M> {
    /// Creates a window at offset `(i0, j0)` of size `rows × cols`.
    ///
    /// Fails with [`NnError::OutOfBounds`] if the window does not lie inside
    /// the parent. Windows are never clipped.
    pub fn new(parent: M, i0: usize, j0: usize, rows: usize, cols: usize) -> Result<Self> {
        let (parent_rows, parent_cols) = parent.dims();
        if i0 + rows > parent_rows || j0 + cols > parent_cols {
            return Err(NnError::OutOfBounds {
                row: i0,
                col: j0,
                rows,
                cols,
                parent_rows,
                parent_cols,
            });
        }
        Ok(Self {
            parent,
            i0,
            j0,
            rows,
            cols,
        })
    }

    /// Offset of the window's top-left corner in the parent.
    pub fn offset(&self) -> (usize, usize) {
        (self.i0, self.j0)
    }
}

impl<M: Matrix> Matrix for SubMatrix<M> {
    fn dims(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    fn at(&self, i: usize, j: usize) -> f64 {
        check_index((self.rows, self.cols), i, j);
        self.parent.at(self.i0 + i, self.j0 + j)
    }

    fn t(&self) -> Box<dyn Matrix + '_> {
        Box::new(SubMatrix {
            parent: self.parent.t(),
            i0: self.j0,
            j0: self.i0,
            rows: self.cols,
            cols: self.rows,
        })
    }
}

/// Parent matrix surrounded by `pad` virtual zeros on all four sides.
#[derive(Debug, Clone, Copy)]
pub struct ZeroPadMatrix<M> {
    parent: M,
    pad: usize,
}

impl<M: Matrix> ZeroPadMatrix<M> {
    /// # Panics
    ///
    /// Panics if the padded dimensions do not fit in `usize`.
    pub fn new(parent: M, pad: usize) -> Self {
        let (r, c) = parent.dims();
        let fits = pad
            .checked_mul(2)
            .map_or(false, |border| {
                r.checked_add(border).is_some() && c.checked_add(border).is_some()
            });
        assert!(fits, "padding {} around {}x{} matrix overflows", pad, r, c);
        Self { parent, pad }
    }

    pub fn pad(&self) -> usize {
        self.pad
    }
}

impl<M: Matrix> Matrix for ZeroPadMatrix<M> {
    fn dims(&self) -> (usize, usize) {
        let (r, c) = self.parent.dims();
        (r + 2 * self.pad, c + 2 * self.pad)
    }

    fn at(&self, i: usize, j: usize) -> f64 {
        check_index(self.dims(), i, j);
        if i < self.pad || j < self.pad {
            return 0.0;
        }
        let (pi, pj) = (i - self.pad, j - self.pad);
        let (r, c) = self.parent.dims();
        if pi >= r || pj >= c {
            0.0
        } else {
            self.parent.at(pi, pj)
        }
    }

    fn t(&self) -> Box<dyn Matrix + '_> {
        Box::new(ZeroPadMatrix::new(self.parent.t(), self.pad))
    }
}

/// Square diagonal matrix backed by a vector.
///
/// Left-multiplying by a `DiagMatrix` scales row `i` by `v[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagMatrix {
    v: Vector,
}

impl DiagMatrix {
    pub fn new(v: Vector) -> Self {
        Self { v }
    }

    pub fn diagonal(&self) -> &Vector {
        &self.v
    }
}

impl Matrix for DiagMatrix {
    fn dims(&self) -> (usize, usize) {
        let n = self.v.len();
        (n, n)
    }

    fn at(&self, i: usize, j: usize) -> f64 {
        check_index(self.dims(), i, j);
        if i == j {
            self.v.at_vec(i)
        } else {
            0.0
        }
    }

    // symmetric
    fn t(&self) -> Box<dyn Matrix + '_> {
        Box::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::{equal, mat_flatten, Dense};

    fn sample() -> Dense {
        Dense::new(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap()
    }

    #[test]
    fn test_submatrix_window() {
        let m = sample();
        let s = SubMatrix::new(&m, 0, 1, 2, 2).unwrap();
        assert_eq!(mat_flatten(&s), vec![2.0, 3.0, 5.0, 6.0]);
    }

    #[test]
    fn test_submatrix_rejects_overflow() {
        let m = sample();
        assert!(matches!(
            SubMatrix::new(&m, 1, 1, 2, 2),
            Err(NnError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_submatrix_transpose_swaps_offsets() {
        let m = sample();
        let s = SubMatrix::new(&m, 1, 1, 1, 2).unwrap();
        let t = s.t();
        assert_eq!(t.dims(), (2, 1));
        assert_eq!(mat_flatten(&*t), vec![5.0, 6.0]);
    }

    #[test]
    fn test_zero_pad_borders() {
        let m = sample();
        let p = ZeroPadMatrix::new(&m, 1);
        assert_eq!(p.dims(), (4, 5));
        assert_eq!(p.at(0, 0), 0.0);
        assert_eq!(p.at(1, 1), 1.0);
        assert_eq!(p.at(2, 3), 6.0);
        assert_eq!(p.at(3, 4), 0.0);
        assert_eq!(p.at(2, 4), 0.0);
    }

    #[test]
    fn test_zero_pad_transpose() {
        let m = sample();
        let p = ZeroPadMatrix::new(&m, 2);
        let explicit = Dense::from_matrix(&p);
        assert!(equal(&*p.t(), &*explicit.t()));
    }

    #[test]
    fn test_diag() {
        let d = DiagMatrix::new(Vector::new(vec![2.0, 3.0]));
        assert_eq!(d.dims(), (2, 2));
        assert_eq!(mat_flatten(&d), vec![2.0, 0.0, 0.0, 3.0]);
        assert!(equal(&*d.t(), &d));
    }

    #[test]
    fn test_view_accessors() {
        let m = sample();
        let p = ZeroPadMatrix::new(&m, 2);
        assert_eq!(p.pad(), 2);
        let s = SubMatrix::new(&p, 1, 3, 2, 2).unwrap();
        assert_eq!(s.offset(), (1, 3));
        let d = DiagMatrix::new(Vector::new(vec![2.0, 3.0]));
        assert_eq!(d.diagonal().as_slice(), &[2.0, 3.0]);
    }

    #[test]
    #[should_panic(expected = "overflows")]
    fn test_zero_pad_overflowing_padding_panics() {
        let m = sample();
        ZeroPadMatrix::new(&m, usize::MAX / 2);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_zero_pad_outside_padded_extent_panics() {
        let m = sample();
        ZeroPadMatrix::new(&m, 1).at(4, 0);
    }
}
