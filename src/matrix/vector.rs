//! Column vector storage

use super::{check_index, Matrix, Transposed};

/// Owned column vector, viewed as an `n × 1` matrix.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Vector {
    data: Vec<f64>,
}

impl Vector {
    pub fn new(data: Vec<f64>) -> Self {
        Self { data }
    }

    pub fn zeros(n: usize) -> Self {
        Self { data: vec![0.0; n] }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Element `i`.
    pub fn at_vec(&self, i: usize) -> f64 {
        self.data[i]
    }

    pub fn set_vec(&mut self, i: usize, value: f64) {
        self.data[i] = value;
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    /// Applies `f` to every element in place.
    pub fn apply(&mut self, f: impl Fn(f64) -> f64) {
        for value in self.data.iter_mut() {
            *value = f(*value);
        }
    }

    /// Adds `x` to every element.
    pub fn add_each(&mut self, x: f64) {
        self.apply(|a| a + x);
    }

    pub fn scale(&mut self, k: f64) {
        self.apply(|a| a * k);
    }

    /// Largest element, or `None` when empty.
    pub fn max(&self) -> Option<f64> {
        self.data.iter().copied().reduce(f64::max)
    }

    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }
}

impl From<Vec<f64>> for Vector {
    fn from(data: Vec<f64>) -> Self {
        Self::new(data)
    }
}

impl Matrix for Vector {
    fn dims(&self) -> (usize, usize) {
        (self.data.len(), 1)
    }

    fn at(&self, i: usize, j: usize) -> f64 {
        check_index(self.dims(), i, j);
        self.data[i]
    }

    fn t(&self) -> Box<dyn Matrix + '_> {
        Box::new(Transposed::new(self))
    }
}
