//! Rolling window extremes. NaN during warmup and for windows containing NaN.

fn rolling(values: &[f64], window: usize, pick: fn(f64, f64) -> f64) -> Vec<f64> {
    (0..values.len())
        .map(|i| {
            if window == 0 || i + 1 < window {
                return f64::NAN;
            }
            let slice = &values[i + 1 - window..=i];
            if slice.iter().any(|v| v.is_nan()) {
                f64::NAN
            } else {
                slice.iter().copied().reduce(pick).unwrap_or(f64::NAN)
            }
        })
        .collect()
}

pub fn rolling_max(values: &[f64], window: usize) -> Vec<f64> {
    rolling(values, window, f64::max)
}

pub fn rolling_min(values: &[f64], window: usize) -> Vec<f64> {
    rolling(values, window, f64::min)
}
