//! Small descriptive-statistics helpers shared by the scoring code.

/// Arithmetic mean, 0 for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (divides by n), 0 for an empty slice
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let sum_sq: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (sum_sq / values.len() as f64).sqrt()
}

/// Standard deviation relative to the mean, 0 when the mean is not positive
pub fn coefficient_of_variation(values: &[f64]) -> f64 {
    let m = mean(values);
    if m > 0.0 {
        std_dev(values) / m
    } else {
        0.0
    }
}

pub fn min(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::min)
}

pub fn max(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}

/// Round half away from zero to two decimals
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Clamp into [0, 1] and round to two decimals
pub fn unit_score(value: f64) -> f64 {
    round2(value.clamp(0.0, 1.0))
}
