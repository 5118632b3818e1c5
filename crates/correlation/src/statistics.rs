//! Correlation Statistics

/// Pearson product-moment correlation of two equally long series.
///
/// Returns `None` for fewer than two points or when either series has zero
/// variance, where the coefficient is undefined.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }

    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (&x, &y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x <= f64::EPSILON || var_y <= f64::EPSILON {
        return None;
    }

    // Rounding can push |r| marginally past 1
    Some((cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0))
}

/// Confidence in a coefficient computed from `n` points: 1 - 1/sqrt(n - 2)
pub fn sample_confidence(n: usize) -> f64 {
    if n <= 2 {
        return 0.0;
    }
    (1.0 - 1.0 / ((n - 2) as f64).sqrt()).clamp(0.0, 1.0)
}
