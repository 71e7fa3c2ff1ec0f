//! Configuration structures for convolution layers
//!
//! This module provides a JSON-backed description of a convolution layer so
//! layer geometry can be changed without code changes.

use crate::error::{NnError, Result};
use crate::layers::Convolution;
use crate::utils::SimpleRng;
use serde::Deserialize;
use std::fs;

/// Configuration for a single convolution layer.
///
/// # Example
///
/// ```json
/// {
///   "filters": 8,
///   "in_channels": 1,
///   "kernel_size": 3,
///   "stride": 1,
///   "pad": 1,
///   "seed": 42
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConvConfig {
    /// Number of filters (output channels)
    pub filters: usize,

    /// Number of input channels
    pub in_channels: usize,

    /// Kernel height, and width unless `kernel_width` is given
    pub kernel_size: usize,

    /// Kernel width for non-square kernels
    pub kernel_width: Option<usize>,

    /// Stride (default: 1)
    #[serde(default = "default_stride")]
    pub stride: usize,

    /// Zero-padding on every side (default: 0)
    #[serde(default)]
    pub pad: usize,

    /// Seed for weight initialization
    pub seed: Option<u64>,
}

fn default_stride() -> usize {
    1
}

impl ConvConfig {
    /// Square-kernel configuration with stride 1 and no padding.
    pub fn new(filters: usize, in_channels: usize, kernel_size: usize) -> Self {
        Self {
            filters,
            in_channels,
            kernel_size,
            kernel_width: None,
            stride: 1,
            pad: 0,
            seed: None,
        }
    }

    /// Effective kernel width.
    pub fn kernel_width(&self) -> usize {
        self.kernel_width.unwrap_or(self.kernel_size)
    }

    /// Builds a Xavier-initialised layer from this configuration.
    pub fn build(&self, rng: &mut SimpleRng) -> Result<Convolution> {
        validate_config(self)?;
        Convolution::new_random(
            self.filters,
            self.in_channels,
            self.kernel_size,
            self.kernel_width(),
            self.stride,
            self.pad,
            rng,
        )
    }

    /// Smallest `(height, width)`, each at least `min_size`, that this
    /// layer's kernel, stride and padding tile exactly.
    ///
    /// # Example
    ///
    /// ```
    /// use rust_cnn_layers::config::ConvConfig;
    ///
    /// let mut cfg = ConvConfig::new(1, 1, 3);
    /// cfg.stride = 2;
    /// assert_eq!(cfg.fitting_input(6), (7, 7));
    /// ```
    pub fn fitting_input(&self, min_size: usize) -> (usize, usize) {
        (
            fitting_extent(min_size, self.kernel_size, self.stride, self.pad),
            fitting_extent(min_size, self.kernel_width(), self.stride, self.pad),
        )
    }
}

fn fitting_extent(min_size: usize, kernel: usize, stride: usize, pad: usize) -> usize {
    let border = pad.saturating_mul(2);
    let padded = min_size.saturating_add(border).max(kernel);
    let stride = stride.max(1);
    let rem = (padded - kernel) % stride;
    let padded = if rem == 0 {
        padded
    } else {
        padded.saturating_add(stride - rem)
    };
    padded.saturating_sub(border)
}

/// Loads a convolution configuration from a JSON file.
///
/// Reads the file at `path` and deserializes its JSON contents into a `ConvConfig`.
///
/// # Returns
///
/// `Ok(ConvConfig)` on success, or an error if the file cannot be read, the
/// JSON is invalid, or a value is out of range.
///
/// # Examples
///
/// ```no_run
/// use rust_cnn_layers::config::load_config;
///
/// let cfg = load_config("config/conv.json").unwrap();
/// assert!(cfg.stride >= 1);
/// ```
pub fn load_config(path: &str) -> Result<ConvConfig> {
    let contents = fs::read_to_string(path)?;
    parse_config(&contents)
}

/// Parses and validates a configuration from a JSON string.
pub fn parse_config(json: &str) -> Result<ConvConfig> {
    let config: ConvConfig = serde_json::from_str(json)?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &ConvConfig) -> Result<()> {
    if config.filters == 0 {
        return Err(NnError::InvalidConfig("filters must be positive".into()));
    }
    if config.in_channels == 0 {
        return Err(NnError::InvalidConfig("in_channels must be positive".into()));
    }
    if config.kernel_size == 0 || config.kernel_width() == 0 {
        return Err(NnError::InvalidConfig("kernel size must be positive".into()));
    }
    if config.stride == 0 {
        return Err(NnError::InvalidConfig("stride must be at least 1".into()));
    }
    Ok(())
}
