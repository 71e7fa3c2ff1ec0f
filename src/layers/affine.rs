//! Affine (fully connected) layer implementation
//!
//! This module provides an Affine layer that performs the transformation:
//! output = input × weights + biases

use crate::error::{NnError, Result};
use crate::layers::{Layer, Parameterized};
use crate::matrix::{Dense, Matrix, Vector};
use crate::utils::numeric::sum_cols;
use crate::utils::SimpleRng;
use log::{debug, trace};
use std::cell::RefCell;

/// Affine layer with weights and biases.
///
/// Performs the linear transformation: y = xW + b
/// where x is the input (batch_size × input_size),
/// W is the weight matrix (input_size × output_size),
/// and b is the bias vector (output_size).
///
/// A single input vector is the one-row case, see
/// [`Affine::forward_vector`].
///
/// # Example
///
/// ```
/// use rust_cnn_layers::layers::Affine;
/// use rust_cnn_layers::matrix::{Dense, Vector};
///
/// let w = Dense::new(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
/// let layer = Affine::new(w, Vector::new(vec![7.0, 8.0, 9.0])).unwrap();
/// let y = layer.forward_vector(&Vector::new(vec![1.0, 2.0])).unwrap();
/// assert_eq!(y.as_slice(), &[16.0, 20.0, 24.0]);
/// ```
pub struct Affine {
    weights: Dense,
    biases: Vector,
    // Gradient accumulators (mutable interior via RefCell for trait compatibility)
    grad_weights: RefCell<Dense>,
    grad_biases: RefCell<Vector>,
    input: RefCell<Option<Dense>>,
}

impl Affine {
    /// Create a layer from explicit parameters.
    ///
    /// Fails with [`NnError::InvalidConfig`] unless the bias length equals the
    /// number of weight columns.
    pub fn new(weights: Dense, biases: Vector) -> Result<Self> {
        let (input_size, output_size) = weights.dims();
        if biases.len() != output_size {
            return Err(NnError::InvalidConfig(format!(
                "affine bias length {} does not match output size {}",
                biases.len(),
                output_size
            )));
        }
        debug!("Affine layer {}x{}", input_size, output_size);
        Ok(Self {
            grad_weights: RefCell::new(Dense::zeros(input_size, output_size)),
            grad_biases: RefCell::new(Vector::zeros(output_size)),
            input: RefCell::new(None),
            weights,
            biases,
        })
    }

    /// Create a layer with Xavier initialization and zero biases.
    ///
    /// Weights are sampled uniformly from [-limit, limit]
    /// where limit = sqrt(6 / (input_size + output_size)).
    pub fn new_random(input_size: usize, output_size: usize, rng: &mut SimpleRng) -> Result<Self> {
        let weights = Dense::new(
            input_size,
            output_size,
            rng.xavier_vec(input_size * output_size, input_size, output_size),
        )?;
        Self::new(weights, Vector::zeros(output_size))
    }

    /// Get the input size of the layer.
    pub fn input_size(&self) -> usize {
        self.weights.rows()
    }

    /// Get the output size of the layer.
    pub fn output_size(&self) -> usize {
        self.weights.cols()
    }

    /// Get the weight matrix (input_size × output_size).
    pub fn weights(&self) -> &Dense {
        &self.weights
    }

    /// Get the bias vector (output_size).
    pub fn biases(&self) -> &Vector {
        &self.biases
    }

    /// Accumulated weight gradient.
    pub fn grad_weights(&self) -> Dense {
        self.grad_weights.borrow().clone()
    }

    /// Accumulated bias gradient.
    pub fn grad_biases(&self) -> Vector {
        self.grad_biases.borrow().clone()
    }

    /// Forward pass for a single input vector.
    pub fn forward_vector(&self, x: &Vector) -> Result<Vector> {
        let row = Dense::new(1, x.len(), x.as_slice().to_vec())?;
        Ok(self.forward(&row)?.into_data().into())
    }

    /// Backward pass for a single output-gradient vector.
    pub fn backward_vector(&self, dout: &Vector) -> Result<Vector> {
        let row = Dense::new(1, dout.len(), dout.as_slice().to_vec())?;
        Ok(self.backward(&row)?.into_data().into())
    }
}

impl Layer for Affine {
    type Input = Dense;
    type Output = Dense;

    fn forward(&self, input: &Dense) -> Result<Dense> {
        if input.cols() != self.input_size() {
            return Err(NnError::shape(
                "Affine::forward",
                ("batch", self.input_size()),
                input.dims(),
            ));
        }
        trace!("Affine forward {:?}", input.dims());
        let mut output = Dense::product(input, &self.weights)?;
        output.add_row_vector(&self.biases)?;
        *self.input.borrow_mut() = Some(input.clone());
        Ok(output)
    }

    fn backward(&self, grad_output: &Dense) -> Result<Dense> {
        let cache = self.input.borrow();
        let input = cache
            .as_ref()
            .ok_or(NnError::NoForwardCache { layer: "Affine" })?;
        let expected = (input.rows(), self.output_size());
        if grad_output.dims() != expected {
            return Err(NnError::shape("Affine::backward", expected, grad_output.dims()));
        }
        trace!("Affine backward {:?}", grad_output.dims());

        let grad_input = Dense::product(grad_output, &*self.weights.t())?;
        let grad_w = Dense::product(&*input.t(), grad_output)?;
        self.grad_weights.borrow_mut().add_assign(&grad_w)?;

        let grad_b = sum_cols(grad_output);
        for (acc, g) in self
            .grad_biases
            .borrow_mut()
            .as_mut_slice()
            .iter_mut()
            .zip(grad_b.as_slice())
        {
            *acc += *g;
        }

        Ok(grad_input)
    }

    fn parameter_count(&self) -> usize {
        self.weights.data().len() + self.biases.len()
    }
}

impl Parameterized for Affine {
    fn reset_gradients(&mut self) {
        debug!("Affine reset gradients");
        self.grad_weights.get_mut().map_inplace(|_| 0.0);
        self.grad_biases.get_mut().apply(|_| 0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_affine_layer_creation() {
        let mut rng = SimpleRng::new(42);
        let layer = Affine::new_random(10, 5, &mut rng).unwrap();

        assert_eq!(layer.input_size(), 10);
        assert_eq!(layer.output_size(), 5);
        assert_eq!(layer.weights().data().len(), 50); // 10 × 5
        assert_eq!(layer.biases().len(), 5);
        assert_eq!(layer.parameter_count(), 55);
    }

    #[test]
    fn test_deterministic_initialization() {
        let layer1 = Affine::new_random(10, 5, &mut SimpleRng::new(42)).unwrap();
        let layer2 = Affine::new_random(10, 5, &mut SimpleRng::new(42)).unwrap();

        // Same seed should produce identical weights
        assert_eq!(layer1.weights(), layer2.weights());
        assert_eq!(layer1.biases(), layer2.biases());
    }

    #[test]
    fn test_bias_length_mismatch() {
        let w = Dense::zeros(2, 3);
        assert!(matches!(
            Affine::new(w, Vector::zeros(2)),
            Err(NnError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_backward_before_forward() {
        let layer = Affine::new(Dense::zeros(2, 3), Vector::zeros(3)).unwrap();
        assert!(matches!(
            layer.backward(&Dense::zeros(1, 3)),
            Err(NnError::NoForwardCache { .. })
        ));
    }

    #[test]
    fn test_reset_gradients() {
        let mut layer = Affine::new(Dense::zeros(2, 3), Vector::zeros(3)).unwrap();
        layer.forward(&Dense::new(1, 2, vec![1.0, 1.0]).unwrap()).unwrap();
        layer.backward(&Dense::new(1, 3, vec![1.0, 1.0, 1.0]).unwrap()).unwrap();
        assert_eq!(layer.grad_biases().as_slice(), &[1.0, 1.0, 1.0]);

        layer.reset_gradients();
        assert!(layer.grad_weights().data().iter().all(|&g| g == 0.0));
        assert!(layer.grad_biases().as_slice().iter().all(|&g| g == 0.0));
    }
}
