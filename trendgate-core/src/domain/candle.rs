//! Candle and CandleSeries, the market data units fed to the pipeline.
//!
//! A `CandleSeries` can only be built through its validating constructor, so
//! every stage downstream may assume finite, positive prices, consistent
//! OHLC ordering, non-negative volume and non-decreasing timestamps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One OHLCV candle at a fixed granularity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    pub fn new(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Returns true if any OHLCV field is NaN or infinite.
    pub fn is_void(&self) -> bool {
        !(self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite()
            && self.volume.is_finite())
    }

    /// OHLC sanity: low <= open, close <= high; positive prices; non-negative volume.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.low > 0.0
            && self.volume >= 0.0
    }

    /// high - low.
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// |close - open|.
    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    pub fn upper_wick(&self) -> f64 {
        self.high - self.open.max(self.close)
    }

    pub fn lower_wick(&self) -> f64 {
        self.open.min(self.close) - self.low
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }
}

/// Reasons a candle sequence is rejected at construction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CandleError {
    #[error("candle {index}: non-finite field")]
    NonFinite { index: usize },

    #[error("candle {index}: non-positive price")]
    NonPositivePrice { index: usize },

    #[error("candle {index}: negative volume {volume}")]
    NegativeVolume { index: usize, volume: f64 },

    #[error("candle {index}: inconsistent OHLC (o={open}, h={high}, l={low}, c={close})")]
    InconsistentOhlc {
        index: usize,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
    },

    #[error("candle {index}: timestamp {timestamp} precedes the previous candle")]
    OutOfOrder {
        index: usize,
        timestamp: DateTime<Utc>,
    },
}

/// Validated, time-ordered candles of one granularity.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CandleSeries {
    candles: Vec<Candle>,
}

impl CandleSeries {
    /// Validate every candle and the timestamp ordering.
    ///
    /// Fails on the first offending candle; an empty series is allowed
    /// (stages report insufficient history on their own).
    pub fn new(candles: Vec<Candle>) -> Result<Self, CandleError> {
        for (index, candle) in candles.iter().enumerate() {
            check_candle(index, candle)?;
            if index > 0 && candle.timestamp < candles[index - 1].timestamp {
                return Err(CandleError::OutOfOrder {
                    index,
                    timestamp: candle.timestamp,
                });
            }
        }
        Ok(Self { candles })
    }

    /// Keep only the trailing `max_len` candles.
    pub fn truncated(mut self, max_len: usize) -> Self {
        if self.candles.len() > max_len {
            let excess = self.candles.len() - max_len;
            self.candles.drain(..excess);
        }
        self
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.volume).collect()
    }

    pub fn into_inner(self) -> Vec<Candle> {
        self.candles
    }
}

impl<'de> Deserialize<'de> for CandleSeries {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            candles: Vec<Candle>,
        }
        let raw = Raw::deserialize(deserializer)?;
        CandleSeries::new(raw.candles).map_err(serde::de::Error::custom)
    }
}

fn check_candle(index: usize, c: &Candle) -> Result<(), CandleError> {
    if c.is_void() {
        return Err(CandleError::NonFinite { index });
    }
    if c.open <= 0.0 || c.high <= 0.0 || c.low <= 0.0 || c.close <= 0.0 {
        return Err(CandleError::NonPositivePrice { index });
    }
    if c.volume < 0.0 {
        return Err(CandleError::NegativeVolume {
            index,
            volume: c.volume,
        });
    }
    if !c.is_sane() {
        return Err(CandleError::InconsistentOhlc {
            index,
            open: c.open,
            high: c.high,
            low: c.low,
            close: c.close,
        });
    }
    Ok(())
}
