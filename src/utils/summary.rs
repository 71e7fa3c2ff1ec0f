//! Human-readable diagnostics for matrices and tensors
//!
//! Output format carries no contract; it exists for logs and debugging.

use crate::matrix::Matrix;
use std::fmt;

/// Basic statistics over a set of values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stats {
    pub count: usize,
    pub max: f64,
    pub min: f64,
    pub mean: f64,
    pub variance: f64,
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "max:{:.2e} min:{:.2e} ave:{:.2e} var:{:.2e}",
            self.max, self.min, self.mean, self.variance
        )
    }
}

/// Population statistics. An empty input yields zero count, `NaN` mean and
/// variance, and infinite extrema.
pub fn stats(values: impl IntoIterator<Item = f64>) -> Stats {
    let mut count = 0usize;
    let mut total = 0.0;
    let mut squares = 0.0;
    let mut max = f64::NEG_INFINITY;
    let mut min = f64::INFINITY;
    for x in values {
        count += 1;
        total += x;
        squares += x * x;
        max = max.max(x);
        min = min.min(x);
    }
    let n = count as f64;
    let mean = total / n;
    Stats {
        count,
        max,
        min,
        mean,
        variance: squares / n - mean * mean,
    }
}

/// One-line summary: shape followed by max, min, mean and variance.
pub fn summary(m: &dyn Matrix) -> String {
    let (rows, cols) = m.dims();
    let values = (0..rows).flat_map(|i| (0..cols).map(move |j| m.at(i, j)));
    format!("({}, {}) {}", rows, cols, stats(values))
}

/// Multi-line preview showing at most `excerpt` leading and trailing rows and
/// columns.
pub fn dump(m: &dyn Matrix, excerpt: usize) -> String {
    let (rows, cols) = m.dims();
    let pick = |n: usize| -> Vec<Option<usize>> {
        if n <= 2 * excerpt {
            (0..n).map(Some).collect()
        } else {
            (0..excerpt)
                .map(Some)
                .chain(std::iter::once(None))
                .chain((n - excerpt..n).map(Some))
                .collect()
        }
    };
    let col_sel = pick(cols);
    let mut lines = Vec::new();
    for row in pick(rows) {
        let line = match row {
            None => " ...".to_string(),
            Some(i) => {
                let cells: Vec<String> = col_sel
                    .iter()
                    .map(|c| match c {
                        Some(j) => format!("{:>10.4}", m.at(i, *j)),
                        None => "       ...".to_string(),
                    })
                    .collect();
                format!(" [{}]", cells.join(" "))
            }
        };
        lines.push(line);
    }
    lines.join("\n")
}
