//! Central moment accumulation passes
//!
//! Each function is a single traversal of the input. Callers supply the mean
//! from a separate pass.

/// Sum of squared deviations from `mean` (the second central moment, m2).
///
/// # Test Cases
/// - deviation_squares([1, 2, 3, 4], 2.5) = 5.0
/// - deviation_squares([], x) = 0.0
#[inline(never)]
pub fn deviation_squares(xs: &[f64], mean: f64) -> f64 {
    let mut m2 = 0.0;
    for &x in xs {
        let d = x - mean;
        m2 += d * d;
    }
    m2
}

/// Second and third central moments in one traversal.
///
/// Returns `(m2, m3)`.
#[inline(never)]
pub fn moments_2_3(xs: &[f64], mean: f64) -> (f64, f64) {
    let mut m2 = 0.0;
    let mut m3 = 0.0;
    for &x in xs {
        let d = x - mean;
        let d2 = d * d;
        m2 += d2;
        m3 += d2 * d;
    }
    (m2, m3)
}

/// Second and fourth central moments in one traversal.
///
/// Returns `(m2, m4)`.
#[inline(never)]
pub fn moments_2_4(xs: &[f64], mean: f64) -> (f64, f64) {
    let mut m2 = 0.0;
    let mut m4 = 0.0;
    for &x in xs {
        let d = x - mean;
        let d2 = d * d;
        m2 += d2;
        m4 += d2 * d2;
    }
    (m2, m4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deviation_squares() {
        assert_eq!(deviation_squares(&[1.0, 2.0, 3.0, 4.0], 2.5), 5.0);
        assert_eq!(deviation_squares(&[], 1.0), 0.0);
    }

    #[test]
    fn test_paired_moments_share_m2() {
        let xs = [1.0, 2.0, 3.0, 10.0];
        let (a, m3) = moments_2_3(&xs, 4.0);
        let (b, m4) = moments_2_4(&xs, 4.0);
        assert_eq!(a, 50.0);
        assert_eq!(b, 50.0);
        assert_eq!(a, deviation_squares(&xs, 4.0));
        // -27 - 8 - 1 + 216
        assert_eq!(m3, 180.0);
        // 81 + 16 + 1 + 1296
        assert_eq!(m4, 1394.0);
    }

    #[test]
    fn test_symmetric_third_moment_vanishes() {
        let (_, m3) = moments_2_3(&[1.0, 2.0, 3.0, 4.0], 2.5);
        assert_eq!(m3, 0.0);
    }
}
