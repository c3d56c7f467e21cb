//! Statistic kernels for one-dimensional `f64` arrays
//!
//! The sample statistics divide by `n - 1`; the moment ratios follow the
//! population form used by the pipeline that targets this runtime.

use crate::moments::{deviation_squares, moments_2_3, moments_2_4};

/// Sum all elements, left to right.
///
/// # Test Cases
/// - sum([1.0, 2.0, 3.0, 4.0]) = 10.0
/// - sum([]) = 0.0
#[inline(never)]
pub fn sum(xs: &[f64]) -> f64 {
    let mut total = 0.0;
    for &x in xs {
        total += x;
    }
    total
}

/// Arithmetic mean, `sum / n`.
///
/// # Test Cases
/// - mean([1.0, 2.0, 3.0, 4.0]) = 2.5
/// - mean([]) = NaN
#[inline(never)]
pub fn mean(xs: &[f64]) -> f64 {
    sum(xs) / xs.len() as f64
}

/// Sample variance, `m2 / (n - 1)`.
///
/// NaN for fewer than two elements.
///
/// # Test Cases
/// - variance([1.0, 2.0, 3.0, 4.0]) = 5/3
/// - variance([5.0]) = NaN
#[inline(never)]
pub fn variance(xs: &[f64]) -> f64 {
    // An empty slice would otherwise yield 0 / -1 = -0.0.
    if xs.is_empty() {
        return f64::NAN;
    }
    let n = xs.len() as f64;
    let mean = mean(xs);
    let m2 = deviation_squares(xs, mean);
    m2 / (n - 1.0)
}

/// Sample standard deviation, `sqrt(variance)`.
#[inline(never)]
pub fn stddev(xs: &[f64]) -> f64 {
    variance(xs).sqrt()
}

/// Skewness, `(m3 * sqrt(n)) / sqrt(m2)^3`.
///
/// NaN when `m2` is zero (constant input, single element, empty).
#[inline(never)]
pub fn skewness(xs: &[f64]) -> f64 {
    let n = xs.len() as f64;
    let mean = mean(xs);
    let (m2, m3) = moments_2_3(xs, mean);
    (m3 * n.sqrt()) / m2.sqrt().powi(3)
}

/// Kurtosis, `(n * m4) / m2^2`.
///
/// This is plain (not excess) kurtosis. NaN when `m2` is zero.
#[inline(never)]
pub fn kurtosis(xs: &[f64]) -> f64 {
    let n = xs.len() as f64;
    let mean = mean(xs);
    let (m2, m4) = moments_2_4(xs, mean);
    (n * m4) / (m2 * m2)
}
