//! Image tensor storage
//!
//! [`Images`] is a 4-D tensor (batch × channel × height × width) held in one
//! flat row-major buffer. The element `(b, c, y, x)` lives at
//! `((b * ch + c) * height + y) * width + x`, so each `(b, c)` plane is a
//! contiguous `height × width` block that [`Images::plane`] exposes as a
//! [`Matrix`] without copying.

use crate::error::{NnError, Result};
use crate::matrix::{check_index, Dense, Matrix, Transposed};
use crate::utils::numeric::nearly_equal;
use crate::utils::summary::stats;
use std::fmt;

/// Shape of an [`Images`] tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageShape {
    /// Batch count
    pub n: usize,
    /// Channel count
    pub ch: usize,
    /// Spatial height (rows of a plane)
    pub height: usize,
    /// Spatial width (columns of a plane)
    pub width: usize,
}

impl ImageShape {
    pub fn new(n: usize, ch: usize, height: usize, width: usize) -> Self {
        Self {
            n,
            ch,
            height,
            width,
        }
    }

    /// Total element count.
    pub fn len(&self) -> usize {
        self.n * self.ch * self.height * self.width
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Elements per `(b, c)` plane.
    pub fn plane_len(&self) -> usize {
        self.height * self.width
    }

    /// Elements per batch item.
    pub fn item_len(&self) -> usize {
        self.ch * self.plane_len()
    }

    /// Flat index of `(b, c, y, x)`.
    ///
    /// # Panics
    ///
    /// Panics if any coordinate is out of range.
    #[inline]
    pub fn index(&self, b: usize, c: usize, y: usize, x: usize) -> usize {
        assert!(
            b < self.n && c < self.ch && y < self.height && x < self.width,
            "index ({}, {}, {}, {}) out of range for shape {}",
            b,
            c,
            y,
            x,
            self
        );
        ((b * self.ch + c) * self.height + y) * self.width + x
    }
}

impl fmt::Display for ImageShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}x{}", self.n, self.ch, self.height, self.width)
    }
}

/// 4-D tensor of images.
///
/// # Example
///
/// ```
/// use rust_cnn_layers::matrix::Matrix;
/// use rust_cnn_layers::tensor::{ImageShape, Images};
///
/// let x = Images::new(ImageShape::new(1, 1, 2, 2), vec![1.0, 2.0, 3.0, 4.0]).unwrap();
/// assert_eq!(x.plane(0, 0).at(1, 0), 3.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Images {
    shape: ImageShape,
    data: Vec<f64>,
}

impl Images {
    /// Wraps a flat buffer.
    ///
    /// Fails with [`NnError::ShapeMismatch`] unless `data.len()` equals the
    /// shape's element count.
    pub fn new(shape: ImageShape, data: Vec<f64>) -> Result<Self> {
        if data.len() != shape.len() {
            return Err(NnError::shape("Images::new", shape.len(), data.len()));
        }
        Ok(Self { shape, data })
    }

    pub fn zeros(shape: ImageShape) -> Self {
        Self {
            shape,
            data: vec![0.0; shape.len()],
        }
    }

    pub fn shape(&self) -> ImageShape {
        self.shape
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<f64> {
        self.data
    }

    pub fn at(&self, b: usize, c: usize, y: usize, x: usize) -> f64 {
        self.data[self.shape.index(b, c, y, x)]
    }

    pub fn set(&mut self, b: usize, c: usize, y: usize, x: usize, value: f64) {
        let idx = self.shape.index(b, c, y, x);
        self.data[idx] = value;
    }

    /// Adds `value` to the element at `(b, c, y, x)`.
    pub fn add_at(&mut self, b: usize, c: usize, y: usize, x: usize, value: f64) {
        let idx = self.shape.index(b, c, y, x);
        self.data[idx] += value;
    }

    /// The `(b, c)` plane as a `height × width` matrix view.
    ///
    /// # Panics
    ///
    /// Panics if `b` or `c` is out of range.
    pub fn plane(&self, b: usize, c: usize) -> ImagePlane<'_> {
        assert!(
            b < self.shape.n && c < self.shape.ch,
            "plane ({}, {}) out of range for shape {}",
            b,
            c,
            self.shape
        );
        let len = self.shape.plane_len();
        let start = (b * self.shape.ch + c) * len;
        ImagePlane {
            data: &self.data[start..start + len],
            height: self.shape.height,
            width: self.shape.width,
        }
    }

    /// Reinterprets the buffer under a new shape with the same element count.
    pub fn reshape(self, shape: ImageShape) -> Result<Self> {
        Self::new(shape, self.data)
    }

    /// One row per batch item (`n × ch·height·width`).
    pub fn to_dense(&self) -> Dense {
        Dense::from_raw(self.shape.n, self.shape.item_len(), self.data.clone())
    }

    /// Inverse of [`Images::to_dense`].
    pub fn from_dense(shape: ImageShape, m: &Dense) -> Result<Self> {
        if m.dims() != (shape.n, shape.item_len()) {
            return Err(NnError::shape(
                "Images::from_dense",
                (shape.n, shape.item_len()),
                m.dims(),
            ));
        }
        Self::new(shape, m.data().to_vec())
    }

    /// Same shape and every element within `tolerance` (absolute).
    pub fn approx_eq(&self, other: &Images, tolerance: f64) -> bool {
        self.shape == other.shape
            && self
                .data
                .iter()
                .zip(&other.data)
                .all(|(a, b)| (a - b).abs() <= tolerance)
    }

    /// Same shape and every element within 0.1% relative error.
    pub fn nearly_equal(&self, other: &Images) -> bool {
        self.shape == other.shape
            && self
                .data
                .iter()
                .zip(&other.data)
                .all(|(&a, &b)| nearly_equal(a, b))
    }
}

impl fmt::Display for Images {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = stats(self.data.iter().copied());
        write!(f, "Images({}) {}", self.shape, s)?;
        const PREVIEW: usize = 8;
        let shown: Vec<String> = self
            .data
            .iter()
            .take(PREVIEW)
            .map(|x| format!("{:.4}", x))
            .collect();
        write!(f, " [{}", shown.join(", "))?;
        if self.data.len() > PREVIEW {
            write!(f, ", ...")?;
        }
        write!(f, "]")
    }
}

/// Borrowed `height × width` plane of an [`Images`] tensor.
#[derive(Debug, Clone, Copy)]
pub struct ImagePlane<'a> {
    data: &'a [f64],
    height: usize,
    width: usize,
}

impl ImagePlane<'_> {
    pub fn as_slice(&self) -> &[f64] {
        self.data
    }
}

impl Matrix for ImagePlane<'_> {
    fn dims(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    fn at(&self, i: usize, j: usize) -> f64 {
        check_index((self.height, self.width), i, j);
        self.data[i * self.width + j]
    }

    fn t(&self) -> Box<dyn Matrix + '_> {
        Box::new(Transposed::new(*self))
    }
}
