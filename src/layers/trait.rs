//! Layer trait definitions
//!
//! This module defines the call contract shared by every layer: a forward pass
//! that caches what the backward pass needs, and a backward pass that turns an
//! output gradient into an input gradient. Layers with parameters also
//! accumulate parameter gradients until the caller resets them.

use crate::error::Result;

/// Core trait for neural network layers.
///
/// Layers keep their forward cache and gradient accumulators behind interior
/// mutability, so both passes take `&self`.
///
/// # Example
///
/// ```
/// use rust_cnn_layers::layers::{Layer, ReLU};
/// use rust_cnn_layers::matrix::Dense;
///
/// let relu = ReLU::new();
/// let x = Dense::new(1, 3, vec![2.0, -1.0, -2.0]).unwrap();
/// let y = relu.forward(&x).unwrap();
/// assert_eq!(y.data(), &[2.0, 0.0, 0.0]);
///
/// let dout = Dense::new(1, 3, vec![-1.0, 1.0, -1.0]).unwrap();
/// let dx = relu.backward(&dout).unwrap();
/// assert_eq!(dx.data(), &[-1.0, 0.0, 0.0]);
/// ```
pub trait Layer {
    /// Value consumed by `forward` (and produced by `backward`).
    type Input;
    /// Value produced by `forward` (and consumed by `backward`).
    type Output;

    /// Forward propagation through the layer.
    ///
    /// Overwrites whatever the previous call cached.
    ///
    /// # Errors
    ///
    /// Fails when `input` does not fit the layer's parameters.
    fn forward(&self, input: &Self::Input) -> Result<Self::Output>;

    /// Backward propagation through the layer.
    ///
    /// Returns the gradient with respect to the input of the most recent
    /// `forward`. Parameterised layers add their parameter gradients into
    /// internal accumulators as a side effect.
    ///
    /// # Errors
    ///
    /// Fails if `forward` has not run yet or if `grad_output` does not have
    /// the shape the cached input produced.
    fn backward(&self, grad_output: &Self::Output) -> Result<Self::Input>;

    /// Number of trainable parameters.
    fn parameter_count(&self) -> usize;
}

/// Layers owning trainable parameters and gradient accumulators.
///
/// Accumulators sum contributions across `backward` calls until
/// `reset_gradients` clears them, typically right after an optimizer step.
pub trait Parameterized: Layer {
    /// Zeroes the gradient accumulators.
    fn reset_gradients(&mut self);
}
