//! Relative Strength Index (RSI), simple-mean variant.
//!
//! RS = mean(gains over the last `period` deltas) / mean(losses over the same deltas)
//! RSI = 100 - 100 / (1 + RS)
//! Lookback: period (needs period + 1 closes).
//! Edge case: a zero average loss leaves RS undefined and the output is NaN.
//! Callers treat that as "no reading", never as RSI = 100.

use crate::components::indicator::Indicator;
use crate::domain::Candle;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            name: format!("rsi_{period}"),
        }
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        rsi_of_series(&closes, self.period)
    }
}

/// RSI over an arbitrary series using rolling simple means of gains and losses.
pub fn rsi_of_series(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if period == 0 || n < period + 1 {
        return result;
    }

    // changes[i] = values[i] - values[i-1]; changes[0] is undefined
    let mut changes = vec![f64::NAN; n];
    for i in 1..n {
        changes[i] = values[i] - values[i - 1];
    }

    for i in period..n {
        let window = &changes[(i + 1 - period)..=i];
        if window.iter().any(|c| c.is_nan()) {
            continue;
        }
        let gain: f64 = window.iter().filter(|&&c| c > 0.0).sum();
        let loss: f64 = window.iter().filter(|&&c| c < 0.0).map(|c| -c).sum();
        let avg_gain = gain / period as f64;
        let avg_loss = loss / period as f64;
        if avg_loss == 0.0 {
            continue;
        }
        result[i] = 100.0 - 100.0 / (1.0 + avg_gain / avg_loss);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_candles};

    #[test]
    fn rsi_known_value() {
        // Changes: +2, -1, +2, -1 → gains 4/4 = 1.0, losses 2/4 = 0.5
        // RS = 2, RSI = 100 - 100/3 = 66.666...
        let candles = make_candles(&[10.0, 12.0, 11.0, 13.0, 12.0]);
        let result = Rsi::new(4).compute(&candles);
        assert!(result[..4].iter().all(|v| v.is_nan()));
        assert_approx(result[4], 100.0 - 100.0 / 3.0, 1e-9);
    }

    #[test]
    fn rsi_all_gains_is_undefined() {
        let result = rsi_of_series(&[100.0, 101.0, 102.0, 103.0, 104.0], 3);
        assert!(result.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn rsi_all_losses_is_zero() {
        let result = rsi_of_series(&[105.0, 104.0, 103.0, 102.0], 3);
        assert_approx(result[3], 0.0, 1e-9);
    }

    #[test]
    fn rsi_bounds() {
        let result = rsi_of_series(&[100.0, 105.0, 98.0, 110.0, 95.0, 115.0, 90.0, 120.0], 3);
        for (i, &v) in result.iter().enumerate() {
            if !v.is_nan() {
                assert!((0.0..=100.0).contains(&v), "RSI out of bounds at {i}: {v}");
            }
        }
    }

    #[test]
    fn rsi_uses_only_trailing_window() {
        // An early huge drop must fall out of the 3-delta window.
        let result = rsi_of_series(&[200.0, 100.0, 101.0, 100.5, 101.5, 101.0], 3);
        // Window at index 5 holds deltas -0.5, +1.0, -0.5
        // gains 1.0/3, losses 1.0/3 → RS = 1 → RSI = 50
        assert_approx(result[5], 50.0, 1e-9);
    }

    #[test]
    fn rsi_lookback() {
        assert_eq!(Rsi::new(14).lookback(), 14);
    }
}
