//! Exponential Moving Average.
//!
//! alpha = 2/(span+1). Seeded with the first defined value, then
//! EMA[i] = (w*EMA[i-1] + alpha*x[i]) / (w + alpha), where w = (1-alpha)^k
//! and k counts the bars since the last defined value. Without gaps this is
//! x[i]*alpha + EMA[i-1]*(1-alpha); a gap decays the old average further.
//! Warmup: NaN until `span` defined values have been seen. Leading NaNs are
//! skipped; a NaN bar repeats the previous average.

use crate::domain::indicator::{Args, ComputeError, IndicatorFn, IndicatorOutput};

pub fn ema(values: &[f64], span: usize) -> Vec<f64> {
    if span == 0 {
        return vec![f64::NAN; values.len()];
    }

    let alpha = 2.0 / (span as f64 + 1.0);
    let decay = 1.0 - alpha;
    let mut average: Option<f64> = None;
    let mut old_weight = 1.0;
    let mut seen = 0usize;

    values
        .iter()
        .map(|&x| {
            let observed = !x.is_nan();
            match average {
                None if observed => average = Some(x),
                None => {}
                Some(prev) => {
                    old_weight *= decay;
                    if observed {
                        if prev != x {
                            average = Some((old_weight * prev + alpha * x) / (old_weight + alpha));
                        }
                        old_weight = 1.0;
                    }
                }
            }
            if observed {
                seen += 1;
            }
            match average {
                Some(v) if seen >= span => v,
                _ => f64::NAN,
            }
        })
        .collect()
}

/// `EMA(series, span)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ema;

impl IndicatorFn for Ema {
    fn name(&self) -> String {
        "EMA".to_string()
    }

    fn compute(&self, args: &Args<'_>) -> Result<IndicatorOutput, ComputeError> {
        let values = args.series(0)?;
        let span = args.period(1)?;
        Ok(ema(values, span).into())
    }
}
