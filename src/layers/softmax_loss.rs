//! Softmax followed by cross-entropy loss

use crate::error::{NnError, Result};
use crate::matrix::{Dense, Matrix};
use crate::utils::numeric::{cross_entropy_error, softmax};
use log::trace;
use std::cell::RefCell;

/// Output layer combining row-wise softmax and cross-entropy.
///
/// Rows of the score matrix are independent examples. The backward pass
/// returns `(softmax(x) - t) / rows`, the gradient of the mean loss.
#[derive(Default)]
pub struct SoftmaxWithLoss {
    cache: RefCell<Option<(Dense, Dense)>>,
}

impl SoftmaxWithLoss {
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes the loss of scores `x` against targets `t` and caches the
    /// probabilities for [`SoftmaxWithLoss::backward`].
    pub fn forward(&self, x: &Dense, t: &Dense) -> Result<f64> {
        if x.dims() != t.dims() {
            return Err(NnError::shape("SoftmaxWithLoss::forward", x.dims(), t.dims()));
        }
        trace!("SoftmaxWithLoss forward {:?}", x.dims());
        let y = softmax(x);
        let loss = cross_entropy_error(&y, t)?;
        *self.cache.borrow_mut() = Some((y, t.clone()));
        Ok(loss)
    }

    /// Probabilities from the most recent forward pass.
    pub fn output(&self) -> Option<Dense> {
        self.cache.borrow().as_ref().map(|(y, _)| y.clone())
    }

    /// Gradient of the loss with respect to the scores.
    pub fn backward(&self) -> Result<Dense> {
        let cache = self.cache.borrow();
        let (y, t) = cache.as_ref().ok_or(NnError::NoForwardCache {
            layer: "SoftmaxWithLoss",
        })?;
        let batch = y.rows().max(1) as f64;
        Ok(Dense::apply(y, |i, j, p| (p - t.at(i, j)) / batch))
    }
}
