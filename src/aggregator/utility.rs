/// Lowest and highest grade on the upstream scale.
pub const MIN_GRADE: f64 = 0.0;
pub const MAX_GRADE: f64 = 10.0;

/// Computes the arithmetic mean of a slice of values. Returns 0.0 for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Value one more grade must have for the mean over `values.len() + 1`
/// grades to equal `target`, clamped to the grade scale.
///
/// Returns `None` when there are no values or the mean already reaches `target`.
pub fn needed_for_target(values: &[f64], target: f64) -> Option<f64> {
    if values.is_empty() || mean(values) >= target {
        return None;
    }
    let sum: f64 = values.iter().sum();
    let needed = target * (values.len() + 1) as f64 - sum;
    Some(needed.clamp(MIN_GRADE, MAX_GRADE))
}
