//! Bollinger Bands: moving average +/- standard deviation multiplier.
//!
//! - Middle: SMA(close, period)
//! - Upper/Lower: middle +/- mult * population stddev(close, period)
//!
//! Lookback: period - 1.

use crate::components::indicator::Indicator;
use crate::domain::Candle;
use crate::indicators::sma::sma_of_series;

/// Which band of the Bollinger Bands to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BollingerBand {
    Upper,
    Middle,
    Lower,
}

#[derive(Debug, Clone)]
pub struct Bollinger {
    period: usize,
    multiplier: f64,
    band: BollingerBand,
    name: String,
}

impl Bollinger {
    pub fn new(period: usize, multiplier: f64, band: BollingerBand) -> Self {
        assert!(period >= 1, "Bollinger period must be >= 1");
        let tag = match band {
            BollingerBand::Upper => "upper",
            BollingerBand::Middle => "middle",
            BollingerBand::Lower => "lower",
        };
        Self {
            period,
            multiplier,
            band,
            name: format!("bollinger_{tag}_{period}_{multiplier}"),
        }
    }

    pub fn middle(period: usize) -> Self {
        Self::new(period, 2.0, BollingerBand::Middle)
    }
}

impl Indicator for Bollinger {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let mean = sma_of_series(&closes, self.period);
        if self.band == BollingerBand::Middle {
            return mean;
        }

        let sign = if self.band == BollingerBand::Upper { 1.0 } else { -1.0 };
        mean.iter()
            .enumerate()
            .map(|(i, &m)| {
                if m.is_nan() {
                    return f64::NAN;
                }
                let window = &closes[(i + 1 - self.period)..=i];
                let variance = window.iter().map(|c| (c - m).powi(2)).sum::<f64>()
                    / self.period as f64;
                m + sign * self.multiplier * variance.sqrt()
            })
            .collect()
    }
}
