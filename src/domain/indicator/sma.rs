//! Simple Moving Average.
//!
//! SMA[i] = mean(values[i-n+1..=i]). The first (n-1) values are NaN, as is any
//! window containing NaN.

use crate::domain::indicator::{Args, ComputeError, IndicatorFn, IndicatorOutput};

pub fn sma(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 {
        return vec![f64::NAN; values.len()];
    }

    (0..values.len())
        .map(|i| {
            if i + 1 < period {
                f64::NAN
            } else {
                values[i + 1 - period..=i].iter().sum::<f64>() / period as f64
            }
        })
        .collect()
}

/// `SMA(series, period)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sma;

impl IndicatorFn for Sma {
    fn name(&self) -> String {
        "SMA".to_string()
    }

    fn compute(&self, args: &Args<'_>) -> Result<IndicatorOutput, ComputeError> {
        let values = args.series(0)?;
        let period = args.period(1)?;
        Ok(sma(values, period).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::Arg;

    #[test]
    fn sma_warmup_is_nan() {
        let out = sma(&[1.0, 2.0, 3.0, 4.0], 3);
        assert!(out[0].is_nan());
        assert!(out[1].is_nan());
        assert!((out[2] - 2.0).abs() < f64::EPSILON);
        assert!((out[3] - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn sma_period_1_is_identity() {
        assert_eq!(sma(&[5.0, 6.0], 1), vec![5.0, 6.0]);
    }

    #[test]
    fn sma_nan_in_window() {
        let out = sma(&[1.0, f64::NAN, 3.0, 4.0, 5.0], 2);
        assert!(out[1].is_nan());
        assert!(out[2].is_nan());
        assert!((out[3] - 3.5).abs() < f64::EPSILON);
    }

    #[test]
    fn sma_prefix_matches_full() {
        let values = [3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0];
        let full = sma(&values, 3);
        for end in 1..=values.len() {
            let prefix = sma(&values[..end], 3);
            for (a, b) in prefix.iter().zip(&full) {
                assert_eq!(a.to_bits(), b.to_bits());
            }
        }
    }

    #[test]
    fn sma_function_requires_positive_period() {
        let values = [1.0, 2.0];
        let args = Args::new(vec![Arg::Series(&values), Arg::Number(0.0)]);
        assert!(Sma.compute(&args).is_err());
    }
}
