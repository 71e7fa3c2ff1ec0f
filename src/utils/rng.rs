//! Simple random number generator for reproducibility.
//!
//! This module provides a lightweight xorshift-based PRNG used for parameter
//! initialisation and for randomised tests, so results are identical across
//! runs for a given seed.

/// Xorshift generator with an explicit seed.
pub struct SimpleRng {
    state: u64,
}

impl SimpleRng {
    /// Create a new RNG with explicit seed (if zero, use a fixed value).
    pub fn new(seed: u64) -> Self {
        let state = if seed == 0 { 0x9e3779b97f4a7c15 } else { seed };
        Self { state }
    }

    /// Basic xorshift to generate u32.
    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        (x >> 32) as u32
    }

    /// Uniform sample in [0, 1).
    pub fn next_f64(&mut self) -> f64 {
        self.next_u32() as f64 / (u32::MAX as f64 + 1.0)
    }

    /// Uniform sample in [low, high).
    pub fn gen_range_f64(&mut self, low: f64, high: f64) -> f64 {
        low + (high - low) * self.next_f64()
    }

    /// `n` uniform samples in [low, high).
    pub fn uniform_vec(&mut self, n: usize, low: f64, high: f64) -> Vec<f64> {
        (0..n).map(|_| self.gen_range_f64(low, high)).collect()
    }

    /// Xavier/Glorot uniform samples: limit = sqrt(6 / (fan_in + fan_out)).
    pub fn xavier_vec(&mut self, n: usize, fan_in: usize, fan_out: usize) -> Vec<f64> {
        let limit = (6.0 / (fan_in + fan_out) as f64).sqrt();
        self.uniform_vec(n, -limit, limit)
    }
}
