//! Observation feature scaling.
//!
//! Every feature maps `NaN`-free inputs to finite outputs: windows with
//! zero spread produce `0.0` instead of dividing by zero.

/// Mean and population standard deviation of `window`.
pub fn mean_std(window: &[f64]) -> (f64, f64) {
    if window.is_empty() {
        return (0.0, 0.0);
    }
    let n = window.len() as f64;
    let mean = window.iter().sum::<f64>() / n;
    let var = window.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    (mean, var.sqrt())
}

/// Standardizes `value` against `window`, or `0.0` for a flat window.
pub fn standardize(value: f64, window: &[f64]) -> f64 {
    let (mean, std) = mean_std(window);
    if std > 0.0 { (value - mean) / std } else { 0.0 }
}

/// Min-max scales `value` against `profile`, or `0.0` for a flat profile.
pub fn min_max(value: f64, profile: &[f64]) -> f64 {
    let min = profile.iter().copied().fold(f64::INFINITY, f64::min);
    let max = profile.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max > min {
        (value - min) / (max - min)
    } else {
        0.0
    }
}

/// Maps a TCL SoC from `[-1, 1]` onto `[0, 1]`.
pub fn rescale_soc(soc: f64) -> f64 {
    (soc + 1.0) / 2.0
}
