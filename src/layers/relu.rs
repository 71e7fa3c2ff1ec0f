//! Rectified linear activation layer

use crate::error::{NnError, Result};
use crate::layers::Layer;
use crate::matrix::{Dense, Matrix};
use log::trace;
use std::cell::RefCell;

/// Elementwise `max(0, x)`.
///
/// The forward pass records which entries were positive; the backward pass
/// lets the gradient through only at those entries.
#[derive(Default)]
pub struct ReLU {
    mask: RefCell<Option<Mask>>,
}

struct Mask {
    dims: (usize, usize),
    positive: Vec<bool>,
}

impl ReLU {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Layer for ReLU {
    type Input = Dense;
    type Output = Dense;

    fn forward(&self, input: &Dense) -> Result<Dense> {
        trace!("ReLU forward {:?}", input.dims());
        let positive: Vec<bool> = input.data().iter().map(|&x| x > 0.0).collect();
        let mut output = input.clone();
        for (value, &keep) in output.data_mut().iter_mut().zip(&positive) {
            if !keep {
                *value = 0.0;
            }
        }
        *self.mask.borrow_mut() = Some(Mask {
            dims: input.dims(),
            positive,
        });
        Ok(output)
    }

    fn backward(&self, grad_output: &Dense) -> Result<Dense> {
        let cache = self.mask.borrow();
        let mask = cache
            .as_ref()
            .ok_or(NnError::NoForwardCache { layer: "ReLU" })?;
        if grad_output.dims() != mask.dims {
            return Err(NnError::shape("ReLU::backward", mask.dims, grad_output.dims()));
        }
        let mut grad_input = grad_output.clone();
        for (value, &keep) in grad_input.data_mut().iter_mut().zip(&mask.positive) {
            if !keep {
                *value = 0.0;
            }
        }
        Ok(grad_input)
    }

    fn parameter_count(&self) -> usize {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relu_zero_is_masked() {
        let relu = ReLU::new();
        let x = Dense::new(1, 3, vec![0.0, 1e-9, -1e-9]).unwrap();
        assert_eq!(relu.forward(&x).unwrap().data(), &[0.0, 1e-9, 0.0]);
        let dx = relu.backward(&Dense::new(1, 3, vec![5.0, 5.0, 5.0]).unwrap()).unwrap();
        assert_eq!(dx.data(), &[0.0, 5.0, 0.0]);
    }

    #[test]
    fn test_relu_shape_guard() {
        let relu = ReLU::new();
        relu.forward(&Dense::zeros(2, 2)).unwrap();
        assert!(relu.backward(&Dense::zeros(1, 4)).is_err());
    }

    #[test]
    fn test_relu_backward_before_forward() {
        assert!(matches!(
            ReLU::new().backward(&Dense::zeros(1, 1)),
            Err(NnError::NoForwardCache { layer: "ReLU" })
        ));
    }
}
