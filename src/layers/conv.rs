//! 2D Convolutional layer implementation
//!
//! This module provides a Convolution layer that performs 2D cross-correlation
//! over batches of multi-channel images, commonly used in computer vision
//! tasks like image classification.
//!
//! Both passes are written against matrix views instead of an im2col buffer:
//! every input channel plane is wrapped in a [`ZeroPadMatrix`], and every
//! receptive field is a [`SubMatrix`] window into that padded plane. The
//! backward pass is the transpose of that gather: each output-gradient scalar
//! is scatter-added through the same window geometry into a padded
//! input-gradient plane, whose border is stripped at the end.
//!
//! Both passes run in parallel over `(batch item, filter)` pairs.

use crate::error::{NnError, Result};
use crate::layers::{Layer, Parameterized};
use crate::matrix::{dot, mat_flatten, Matrix, SubMatrix, Vector, ZeroPadMatrix};
use crate::tensor::{ImagePlane, ImageShape, Images};
use crate::utils::SimpleRng;
use log::{debug, trace};
use rayon::prelude::*;
use std::cell::RefCell;

/// 2D Convolutional layer with learnable filters.
///
/// Slides each filter over the zero-padded input and produces one feature map
/// per filter. Filters are applied as stored (cross-correlation, no kernel
/// flip).
///
/// # Fields
///
/// * `weights` - Filters (filter_count × in_channels × kernel_height × kernel_width)
/// * `biases` - Bias for each filter (filter_count)
/// * `stride` - Step between neighbouring windows, at least 1
/// * `pad` - Zero-padding applied symmetrically to every input plane
///
/// # Example
///
/// ```
/// use rust_cnn_layers::layers::{Convolution, Layer};
/// use rust_cnn_layers::matrix::Vector;
/// use rust_cnn_layers::tensor::{ImageShape, Images};
///
/// let w = Images::new(ImageShape::new(1, 1, 2, 2), vec![1.0, 0.0, 0.0, 1.0]).unwrap();
/// let conv = Convolution::new(w, Vector::zeros(1), 1, 0).unwrap();
/// let x = Images::new(ImageShape::new(1, 1, 2, 2), vec![1.0, 2.0, 3.0, 4.0]).unwrap();
/// let y = conv.forward(&x).unwrap();
/// assert_eq!(y.data(), &[5.0]);
/// ```
pub struct Convolution {
    weights: Images,
    biases: Vector,
    stride: usize,
    pad: usize,
    // Gradient accumulators (mutable interior via RefCell for trait compatibility)
    grad_weights: RefCell<Images>,
    grad_biases: RefCell<Vector>,
    input: RefCell<Option<Images>>,
}

/// Gradient contributions of one `(batch item, filter)` pair.
struct PairGradient {
    b: usize,
    f: usize,
    // 1 × in_channels × padded height × padded width
    grad_padded: Images,
    // 1 × in_channels × kernel_height × kernel_width
    grad_weights: Images,
    grad_bias: f64,
}

impl Convolution {
    /// Create a layer from an already shaped filter tensor.
    ///
    /// # Errors
    ///
    /// [`NnError::InvalidConfig`] if the bias length differs from the filter
    /// count, if `stride` is zero, or if the filter tensor has an empty
    /// dimension.
    pub fn new(weights: Images, biases: Vector, stride: usize, pad: usize) -> Result<Self> {
        let shape = weights.shape();
        if shape.is_empty() {
            return Err(NnError::InvalidConfig(format!(
                "filter tensor {} has an empty dimension",
                shape
            )));
        }
        if biases.len() != shape.n {
            return Err(NnError::InvalidConfig(format!(
                "bias length {} does not match filter count {}",
                biases.len(),
                shape.n
            )));
        }
        if stride == 0 {
            return Err(NnError::InvalidConfig("stride must be at least 1".into()));
        }
        debug!(
            "Convolution filters {} stride {} pad {}",
            shape, stride, pad
        );
        Ok(Self {
            grad_weights: RefCell::new(Images::zeros(shape)),
            grad_biases: RefCell::new(Vector::zeros(shape.n)),
            input: RefCell::new(None),
            weights,
            biases,
            stride,
            pad,
        })
    }

    /// Create a layer with Xavier initialization and zero biases.
    ///
    /// fan_in = in_channels × kernel area, fan_out = filter_count × kernel area.
    #[allow(clippy::too_many_arguments)]
    pub fn new_random(
        filter_count: usize,
        in_channels: usize,
        kernel_height: usize,
        kernel_width: usize,
        stride: usize,
        pad: usize,
        rng: &mut SimpleRng,
    ) -> Result<Self> {
        let shape = ImageShape::new(filter_count, in_channels, kernel_height, kernel_width);
        let area = kernel_height * kernel_width;
        let weights = Images::new(
            shape,
            rng.xavier_vec(shape.len(), in_channels * area, filter_count * area),
        )?;
        Self::new(weights, Vector::zeros(filter_count), stride, pad)
    }

    /// Get the number of filters (output channels).
    pub fn filter_count(&self) -> usize {
        self.weights.shape().n
    }

    /// Get the number of input channels.
    pub fn in_channels(&self) -> usize {
        self.weights.shape().ch
    }

    /// Get the filter height.
    pub fn kernel_height(&self) -> usize {
        self.weights.shape().height
    }

    /// Get the filter width.
    pub fn kernel_width(&self) -> usize {
        self.weights.shape().width
    }

    /// Get the stride.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Get the zero-padding width.
    pub fn pad(&self) -> usize {
        self.pad
    }

    /// Get the filters (filter_count × in_channels × kernel_height × kernel_width).
    pub fn weights(&self) -> &Images {
        &self.weights
    }

    /// Get the per-filter biases.
    pub fn biases(&self) -> &Vector {
        &self.biases
    }

    /// Accumulated filter gradient.
    pub fn grad_weights(&self) -> Images {
        self.grad_weights.borrow().clone()
    }

    /// Accumulated bias gradient.
    pub fn grad_biases(&self) -> Vector {
        self.grad_biases.borrow().clone()
    }

    /// Output shape for an input of shape `input`.
    ///
    /// Calculated as: (size + 2*pad - kernel) / stride + 1 on each spatial
    /// axis.
    ///
    /// # Errors
    ///
    /// * [`NnError::ShapeMismatch`] if the channel count differs from the
    ///   filters'.
    /// * [`NnError::InvalidConfig`] if the filter is larger than the padded
    ///   input or the stride does not divide the sliding range exactly.
    pub fn output_shape(&self, input: ImageShape) -> Result<ImageShape> {
        let filter = self.weights.shape();
        if input.ch != filter.ch {
            return Err(NnError::shape("Convolution channels", filter.ch, input.ch));
        }
        let out_height = output_extent(input.height, filter.height, self.stride, self.pad)?;
        let out_width = output_extent(input.width, filter.width, self.stride, self.pad)?;
        Ok(ImageShape::new(input.n, filter.n, out_height, out_width))
    }
}

fn padded_extent(size: usize, pad: usize) -> Result<usize> {
    pad.checked_mul(2)
        .and_then(|border| size.checked_add(border))
        .ok_or_else(|| {
            NnError::InvalidConfig(format!(
                "padding {} around extent {} overflows",
                pad, size
            ))
        })
}

fn output_extent(size: usize, kernel: usize, stride: usize, pad: usize) -> Result<usize> {
    let padded = padded_extent(size, pad)?;
    if kernel > padded {
        return Err(NnError::InvalidConfig(format!(
            "filter extent {} exceeds padded input extent {}",
            kernel, padded
        )));
    }
    if (padded - kernel) % stride != 0 {
        return Err(NnError::InvalidConfig(format!(
            "stride {} does not tile padded extent {} with filter extent {}",
            stride, padded, kernel
        )));
    }
    Ok((padded - kernel) / stride + 1)
}

fn padded_planes(input: &Images, b: usize, pad: usize) -> Vec<ZeroPadMatrix<ImagePlane<'_>>> {
    (0..input.shape().ch)
        .map(|c| ZeroPadMatrix::new(input.plane(b, c), pad))
        .collect()
}

/// Fills the `(b, f)` output plane.
#[allow(clippy::too_many_arguments)]
fn correlate_plane(
    input: &Images,
    weights: &Images,
    bias: f64,
    b: usize,
    f: usize,
    stride: usize,
    pad: usize,
    out_width: usize,
    out: &mut [f64],
) -> Result<()> {
    let filter = weights.shape();
    let planes = padded_planes(input, b, pad);
    for (pos, value) in out.iter_mut().enumerate() {
        let (oy, ox) = (pos / out_width, pos % out_width);
        let mut acc = bias;
        for (c, plane) in planes.iter().enumerate() {
            let window = SubMatrix::new(
                plane,
                oy * stride,
                ox * stride,
                filter.height,
                filter.width,
            )?;
            acc += dot(&window, &weights.plane(f, c));
        }
        *value = acc;
    }
    Ok(())
}

/// Input shape grown by `pad` on every side of each plane.
fn padded_shape(input: ImageShape, pad: usize) -> Result<ImageShape> {
    Ok(ImageShape::new(
        input.n,
        input.ch,
        padded_extent(input.height, pad)?,
        padded_extent(input.width, pad)?,
    ))
}

/// Scatter-adds the `(b, f)` output-gradient plane into padded input-gradient
/// planes and gathers the filter and bias gradients of filter `f`.
fn backward_pair(
    input: &Images,
    weights: &Images,
    grad_output: &Images,
    b: usize,
    f: usize,
    stride: usize,
    pad: usize,
) -> Result<PairGradient> {
    let filter = weights.shape();
    let out_shape = grad_output.shape();
    let padded = padded_shape(input.shape(), pad)?;

    let mut grad_padded = Images::zeros(ImageShape::new(1, padded.ch, padded.height, padded.width));
    let mut grad_weights =
        Images::zeros(ImageShape::new(1, filter.ch, filter.height, filter.width));
    let mut grad_bias = 0.0;
    let planes = padded_planes(input, b, pad);
    let dout = grad_output.plane(b, f);

    for oy in 0..out_shape.height {
        for ox in 0..out_shape.width {
            let g = dout.at(oy, ox);
            grad_bias += g;
            let (y0, x0) = (oy * stride, ox * stride);
            for (c, plane) in planes.iter().enumerate() {
                let window = SubMatrix::new(plane, y0, x0, filter.height, filter.width)?;
                let kernel = weights.plane(f, c);
                for ky in 0..filter.height {
                    for kx in 0..filter.width {
                        grad_weights.add_at(0, c, ky, kx, g * window.at(ky, kx));
                        grad_padded.add_at(0, c, y0 + ky, x0 + kx, g * kernel.at(ky, kx));
                    }
                }
            }
        }
    }

    Ok(PairGradient {
        b,
        f,
        grad_padded,
        grad_weights,
        grad_bias,
    })
}

impl Layer for Convolution {
    type Input = Images;
    type Output = Images;

    /// Forward propagation.
    ///
    /// Output planes for distinct `(batch, filter)` pairs are disjoint and are
    /// computed in parallel. The unpadded input is cached for `backward`.
    fn forward(&self, input: &Images) -> Result<Images> {
        let out_shape = self.output_shape(input.shape())?;
        trace!("Convolution forward {} -> {}", input.shape(), out_shape);

        let mut output = Images::zeros(out_shape);
        let plane_len = out_shape.plane_len();
        if plane_len > 0 {
            let weights = &self.weights;
            let biases = &self.biases;
            let (stride, pad) = (self.stride, self.pad);
            output
                .data_mut()
                .par_chunks_mut(plane_len)
                .enumerate()
                .try_for_each(|(idx, plane)| {
                    let (b, f) = (idx / out_shape.ch, idx % out_shape.ch);
                    correlate_plane(
                        input,
                        weights,
                        biases.at_vec(f),
                        b,
                        f,
                        stride,
                        pad,
                        out_shape.width,
                        plane,
                    )
                })?;
        }

        *self.input.borrow_mut() = Some(input.clone());
        Ok(output)
    }

    /// Backward propagation.
    ///
    /// Every `(batch, filter)` pair is processed in parallel into its own
    /// padded input-gradient planes and partial filter/bias buffers; the
    /// partials are then summed in pair order, the padded border is stripped
    /// and the parameter gradients are added into the accumulators.
    fn backward(&self, grad_output: &Images) -> Result<Images> {
        let cache = self.input.borrow();
        let input = cache.as_ref().ok_or(NnError::NoForwardCache {
            layer: "Convolution",
        })?;
        let out_shape = self.output_shape(input.shape())?;
        if grad_output.shape() != out_shape {
            return Err(NnError::shape(
                "Convolution::backward",
                out_shape,
                grad_output.shape(),
            ));
        }
        let in_shape = input.shape();
        trace!("Convolution backward {} -> {}", out_shape, in_shape);

        let weights = &self.weights;
        let (stride, pad) = (self.stride, self.pad);
        let filters = out_shape.ch;
        let pairs = (0..in_shape.n * filters)
            .into_par_iter()
            .map(|idx| {
                backward_pair(input, weights, grad_output, idx / filters, idx % filters, stride, pad)
            })
            .collect::<Result<Vec<_>>>()?;

        let mut grad_padded = Images::zeros(padded_shape(in_shape, pad)?);
        let item_len = grad_padded.shape().item_len();
        let filter_len = self.weights.shape().item_len();
        let mut grad_weights = self.grad_weights.borrow_mut();
        let mut grad_biases = self.grad_biases.borrow_mut();
        for pair in pairs {
            let item = &mut grad_padded.data_mut()[pair.b * item_len..(pair.b + 1) * item_len];
            for (acc, g) in item.iter_mut().zip(pair.grad_padded.data()) {
                *acc += *g;
            }
            let slot = &mut grad_weights.data_mut()[pair.f * filter_len..(pair.f + 1) * filter_len];
            for (acc, g) in slot.iter_mut().zip(pair.grad_weights.data()) {
                *acc += *g;
            }
            grad_biases.as_mut_slice()[pair.f] += pair.grad_bias;
        }

        // strip the padded border
        let mut grad_input = Vec::with_capacity(in_shape.len());
        for b in 0..in_shape.n {
            for c in 0..in_shape.ch {
                let interior = SubMatrix::new(
                    grad_padded.plane(b, c),
                    pad,
                    pad,
                    in_shape.height,
                    in_shape.width,
                )?;
                grad_input.extend(mat_flatten(&interior));
            }
        }

        Images::new(in_shape, grad_input)
    }

    fn parameter_count(&self) -> usize {
        self.weights.shape().len() + self.biases.len()
    }
}

impl Parameterized for Convolution {
    fn reset_gradients(&mut self) {
        debug!("Convolution reset gradients");
        self.grad_weights.get_mut().data_mut().fill(0.0);
        self.grad_biases.get_mut().as_mut_slice().fill(0.0);
    }
}
