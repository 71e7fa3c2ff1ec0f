//! Rust CNN Layers Library
//!
//! A from-scratch neural network layer library: affine layers, ReLU,
//! softmax/cross-entropy loss and 2-D convolution with forward and backward
//! passes, all built on a generic matrix abstraction with lazy views.
//!
//! # Modules
//!
//! - `matrix`: Matrix trait, dense storage and composable views (SubMatrix, ZeroPadMatrix, DiagMatrix)
//! - `tensor`: 4-D image tensors and plane views
//! - `layers`: Layer traits and implementations (Affine, ReLU, SoftmaxWithLoss, Convolution)
//! - `utils`: Reductions, softmax, cross-entropy, argmax, summaries, RNG
//! - `config`: Convolution layer configuration loaded from JSON
//! - `error`: Crate error type

pub mod config;
pub mod error;
pub mod layers;
pub mod matrix;
pub mod tensor;
pub mod utils;

pub use error::{NnError, Result};
