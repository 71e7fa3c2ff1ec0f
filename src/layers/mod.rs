//! Layer abstractions for neural networks
//!
//! This module provides the Layer trait and implementations for the layer
//! types of a small convolutional network.

mod r#trait;
pub mod affine;
pub mod conv;
pub mod relu;
pub mod softmax_loss;

// Re-export the Layer traits for convenience
pub use r#trait::{Layer, Parameterized};
pub use affine::Affine;
pub use conv::Convolution;
pub use relu::ReLU;
pub use softmax_loss::SoftmaxWithLoss;
