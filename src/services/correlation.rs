/// Pearson product-moment correlation of paired observations
///
/// Uses the sum-of-squares form so the pairs are walked once. Returns `0.0`
/// when there are no pairs or when either side has zero variance (a single
/// pair, or every `x` or every `y` identical): there is no linear relation to
/// measure. The result is clamped to `[-1, 1]` to absorb rounding drift.
#[must_use]
pub fn pearson(pairs: &[(f64, f64)]) -> f64 {
    if pairs.is_empty() {
        return 0.0;
    }

    let n = pairs.len() as f64;
    let (sum_x, sum_y, sum_x_sq, sum_y_sq, sum_xy) = pairs.iter().fold(
        (0.0, 0.0, 0.0, 0.0, 0.0),
        |(sx, sy, sxx, syy, sxy), &(x, y)| (sx + x, sy + y, sxx + x * x, syy + y * y, sxy + x * y),
    );

    let numerator = sum_xy - (sum_x * sum_y) / n;
    let variance_x = sum_x_sq - (sum_x * sum_x) / n;
    let variance_y = sum_y_sq - (sum_y * sum_y) / n;

    // Cancellation can leave a tiny negative residue instead of zero
    if variance_x <= 0.0 || variance_y <= 0.0 {
        return 0.0;
    }

    let denominator = (variance_x * variance_y).sqrt();
    if denominator == 0.0 || !denominator.is_finite() {
        return 0.0;
    }

    (numerator / denominator).clamp(-1.0, 1.0)
}
