//! Average volume over a trailing window.
//!
//! The window includes the current candle. Early in the series the mean is
//! taken over whatever candles exist (a partial window), so the output is
//! defined from index 0.
//! Lookback: 0.

use crate::components::indicator::Indicator;
use crate::domain::Candle;

#[derive(Debug, Clone)]
pub struct AverageVolume {
    window: usize,
    name: String,
}

impl AverageVolume {
    pub fn new(window: usize) -> Self {
        assert!(window >= 1, "volume window must be >= 1");
        Self {
            window,
            name: format!("avg_volume_{window}"),
        }
    }
}

impl Indicator for AverageVolume {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let volumes: Vec<f64> = candles.iter().map(|c| c.volume).collect();
        (0..volumes.len())
            .map(|i| trailing_mean(&volumes[..=i], self.window).unwrap_or(f64::NAN))
            .collect()
    }
}

/// Mean of the last `window` values (all values if fewer). `None` when empty.
pub fn trailing_mean(values: &[f64], window: usize) -> Option<f64> {
    if values.is_empty() || window == 0 {
        return None;
    }
    let tail = &values[values.len().saturating_sub(window)..];
    Some(tail.iter().sum::<f64>() / tail.len() as f64)
}
