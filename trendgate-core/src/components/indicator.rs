//! Indicator trait: the one contract every indicator in the crate follows.
//!
//! Indicators are pure functions: candle history in, numeric series out.
//! Stages only ever read the latest value, through [`latest`].

use crate::domain::Candle;

/// Trait for indicators.
///
/// Indicators take a full candle series and produce a numeric output series
/// of the same length. Values that are not yet defined (warmup, undefined
/// ratios) are `f64::NAN`.
///
/// # Look-ahead contamination guard
/// No indicator value at index t may depend on candles after t. Computing over
/// a truncated series must reproduce the prefix of the full computation.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "ema_20", "rsi_14").
    fn name(&self) -> &str;

    /// Number of candles needed before the indicator produces valid output.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire candle series.
    fn compute(&self, candles: &[Candle]) -> Vec<f64>;

    /// Latest defined value, or `None` during warmup.
    fn latest(&self, candles: &[Candle]) -> Option<f64> {
        latest(&self.compute(candles))
    }
}

/// Last value of a series if it is finite.
pub fn latest(series: &[f64]) -> Option<f64> {
    series.last().copied().filter(|v| v.is_finite())
}
