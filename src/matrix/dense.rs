//! Dense row-major matrix storage and the generic transpose view

use super::{check_index, Matrix, Vector};
use crate::error::{NnError, Result};

/// Owned matrix stored in row-major order.
///
/// # Example
///
/// ```
/// use rust_cnn_layers::matrix::{Dense, Matrix};
///
/// let m = Dense::new(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
/// assert_eq!(m.dims(), (2, 3));
/// assert_eq!(m.at(1, 0), 4.0);
/// assert_eq!(m.t().at(0, 1), 4.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Dense {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Dense {
    /// Creates a matrix from row-major data.
    ///
    /// Fails with [`NnError::ShapeMismatch`] unless `data.len() == rows * cols`.
    pub fn new(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(NnError::shape("Dense::new", rows * cols, data.len()));
        }
        Ok(Self { rows, cols, data })
    }

    pub(crate) fn from_raw(rows: usize, cols: usize, data: Vec<f64>) -> Self {
        debug_assert_eq!(data.len(), rows * cols);
        Self { rows, cols, data }
    }

    /// Matrix of zeros.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Materialises any matrix view.
    pub fn from_matrix(m: &dyn Matrix) -> Self {
        Self::apply(m, |_, _, x| x)
    }

    /// Builds a matrix with `f(i, j, m[i][j])` at every position of `m`.
    pub fn apply(m: &dyn Matrix, f: impl Fn(usize, usize, f64) -> f64) -> Self {
        let (rows, cols) = m.dims();
        let mut data = Vec::with_capacity(rows * cols);
        for i in 0..rows {
            for j in 0..cols {
                data.push(f(i, j, m.at(i, j)));
            }
        }
        Self { rows, cols, data }
    }

    /// Matrix product `a · b`.
    ///
    /// Fails with [`NnError::ShapeMismatch`] when the inner dimensions differ.
    pub fn product(a: &dyn Matrix, b: &dyn Matrix) -> Result<Self> {
        let inner = a.cols();
        let (br, bc) = b.dims();
        if inner != br {
            return Err(NnError::shape("Dense::product", (inner, bc), (br, bc)));
        }
        Ok(Self::mul(a, b))
    }

    /// Product without the dimension check; the caller guarantees
    /// `a.cols() == b.rows()`.
    pub(crate) fn mul(a: &dyn Matrix, b: &dyn Matrix) -> Self {
        let (rows, inner) = a.dims();
        let cols = b.cols();
        let mut out = Self::zeros(rows, cols);
        for i in 0..rows {
            for k in 0..inner {
                let lhs = a.at(i, k);
                for j in 0..cols {
                    out.data[i * cols + j] += lhs * b.at(k, j);
                }
            }
        }
        out
    }

    /// Row-major element buffer.
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Mutable row-major element buffer.
    pub fn data_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Consumes the matrix and returns its buffer.
    pub fn into_data(self) -> Vec<f64> {
        self.data
    }

    /// Sets the element at `(i, j)`.
    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        check_index((self.rows, self.cols), i, j);
        self.data[i * self.cols + j] = value;
    }

    /// Applies `f` to every element in place.
    pub fn map_inplace(&mut self, f: impl Fn(f64) -> f64) {
        for value in self.data.iter_mut() {
            *value = f(*value);
        }
    }

    /// Multiplies every element by `k`.
    pub fn scale(&mut self, k: f64) {
        self.map_inplace(|x| x * k);
    }

    /// Adds `v` to every row (broadcast over the batch dimension).
    pub fn add_row_vector(&mut self, v: &Vector) -> Result<()> {
        if v.len() != self.cols {
            return Err(NnError::shape("Dense::add_row_vector", self.cols, v.len()));
        }
        for row in self.data.chunks_exact_mut(self.cols) {
            for (value, b) in row.iter_mut().zip(v.as_slice()) {
                *value += *b;
            }
        }
        Ok(())
    }

    /// Elementwise `self += other`.
    pub fn add_assign(&mut self, other: &dyn Matrix) -> Result<()> {
        if other.dims() != self.dims() {
            return Err(NnError::shape("Dense::add_assign", self.dims(), other.dims()));
        }
        for i in 0..self.rows {
            for j in 0..self.cols {
                self.data[i * self.cols + j] += other.at(i, j);
            }
        }
        Ok(())
    }
}

impl Matrix for Dense {
    fn dims(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    fn at(&self, i: usize, j: usize) -> f64 {
        check_index((self.rows, self.cols), i, j);
        self.data[i * self.cols + j]
    }

    fn t(&self) -> Box<dyn Matrix + '_> {
        Box::new(Transposed::new(self))
    }
}

/// Lazy transpose of any matrix.
#[derive(Debug, Clone, Copy)]
pub struct Transposed<M> {
    inner: M,
}

impl<M: Matrix> Transposed<M> {
    pub fn new(inner: M) -> Self {
        Self { inner }
    }
}

impl<M: Matrix> Matrix for Transposed<M> {
    fn dims(&self) -> (usize, usize) {
        let (r, c) = self.inner.dims();
        (c, r)
    }

    fn at(&self, i: usize, j: usize) -> f64 {
        self.inner.at(j, i)
    }

    fn t(&self) -> Box<dyn Matrix + '_> {
        Box::new(&self.inner)
    }
}
