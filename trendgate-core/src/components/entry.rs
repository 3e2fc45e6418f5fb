//! Lower-timeframe entry detection.
//!
//! Two patterns, checked in priority order on the latest candle:
//!
//! 1. Structure break: close beyond the swing extreme of the previous
//!    `structure_lookback` candles (current candle excluded), directional
//!    body, volume >= `breakout_volume_multiple` x average.
//! 2. EMA pullback: the previous candle touched the EMA (low <= EMA for
//!    calls, high >= EMA for puts), the current candle closes back on the
//!    trend side of the EMA with a directional body, volume >= average.
//!
//! Average volume is the trailing mean over `volume_lookback` candles
//! including the current one. A non-positive average never produces a
//! candidate.

use crate::domain::{Bias, Candle, OptionSide};
use crate::indicators::{ema_of_series, trailing_mean};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntryConfig {
    pub ema_period: usize,
    pub volume_lookback: usize,
    pub structure_lookback: usize,
    pub breakout_volume_multiple: f64,
    pub pullback_volume_multiple: f64,
}

impl Default for EntryConfig {
    fn default() -> Self {
        Self {
            ema_period: 9,
            volume_lookback: 20,
            structure_lookback: 10,
            breakout_volume_multiple: 1.2,
            pullback_volume_multiple: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryPattern {
    EmaPullback,
    StructureBreak,
}

impl fmt::Display for EntryPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryPattern::EmaPullback => f.write_str("EMA pullback"),
            EntryPattern::StructureBreak => f.write_str("structure break"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryCandidate {
    pub pattern: EntryPattern,
    pub side: OptionSide,
    /// Close of the triggering candle.
    pub entry_price: f64,
    /// Swing extreme for a structure break, EMA value for a pullback.
    pub reference_level: f64,
    pub volume_ratio: f64,
}

impl EntryCandidate {
    /// Human-readable description, e.g. "structure break at 22510.00 (swing 22490.00)".
    pub fn describe(&self) -> String {
        let level = match self.pattern {
            EntryPattern::StructureBreak => "swing",
            EntryPattern::EmaPullback => "EMA",
        };
        format!(
            "{} at {:.2} ({level} {:.2})",
            self.pattern, self.entry_price, self.reference_level
        )
    }
}

#[derive(Debug, Clone)]
pub struct EntryDetector {
    config: EntryConfig,
}

impl EntryDetector {
    pub fn new(config: EntryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EntryConfig {
        &self.config
    }

    /// Fewest candles for which either pattern can be evaluated.
    pub fn min_candles(&self) -> usize {
        (self.config.structure_lookback + 1).min(self.config.ema_period + 2)
    }

    /// First valid entry on the latest candle, structure break first.
    pub fn detect(&self, candles: &[Candle], bias: Bias) -> Option<EntryCandidate> {
        let side = bias.side()?;
        let current = candles.last()?;
        let volumes: Vec<f64> = candles.iter().map(|c| c.volume).collect();
        let avg_volume = trailing_mean(&volumes, self.config.volume_lookback)?;
        if avg_volume <= 0.0 {
            debug!("average volume is zero; no entry");
            return None;
        }
        let volume_ratio = current.volume / avg_volume;

        let candidate = self
            .structure_break(candles, side, volume_ratio)
            .or_else(|| self.ema_pullback(candles, side, volume_ratio));

        if let Some(c) = &candidate {
            debug!(pattern = %c.pattern, entry = c.entry_price, volume_ratio, "entry found");
        }
        candidate
    }

    fn structure_break(
        &self,
        candles: &[Candle],
        side: OptionSide,
        volume_ratio: f64,
    ) -> Option<EntryCandidate> {
        let lookback = self.config.structure_lookback;
        let n = candles.len();
        if lookback == 0 || n < lookback + 1 {
            return None;
        }
        let current = &candles[n - 1];
        let prior = &candles[n - 1 - lookback..n - 1];

        let (swing, broke) = match side {
            OptionSide::Call => {
                let swing = prior.iter().map(|c| c.high).fold(f64::MIN, f64::max);
                (swing, current.close > swing && current.is_bullish())
            }
            OptionSide::Put => {
                let swing = prior.iter().map(|c| c.low).fold(f64::MAX, f64::min);
                (swing, current.close < swing && current.is_bearish())
            }
        };

        (broke && volume_ratio >= self.config.breakout_volume_multiple).then(|| EntryCandidate {
            pattern: EntryPattern::StructureBreak,
            side,
            entry_price: current.close,
            reference_level: swing,
            volume_ratio,
        })
    }

    fn ema_pullback(
        &self,
        candles: &[Candle],
        side: OptionSide,
        volume_ratio: f64,
    ) -> Option<EntryCandidate> {
        let n = candles.len();
        if n < self.config.ema_period + 2 {
            return None;
        }
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let ema = ema_of_series(&closes, self.config.ema_period);
        let (prev, current) = (&candles[n - 2], &candles[n - 1]);
        let (prev_ema, ema_now) = (ema[n - 2], ema[n - 1]);

        let valid = match side {
            OptionSide::Call => {
                prev.low <= prev_ema && current.close > ema_now && current.is_bullish()
            }
            OptionSide::Put => {
                prev.high >= prev_ema && current.close < ema_now && current.is_bearish()
            }
        };

        (valid && volume_ratio >= self.config.pullback_volume_multiple).then(|| EntryCandidate {
            pattern: EntryPattern::EmaPullback,
            side,
            entry_price: current.close,
            reference_level: ema_now,
            volume_ratio,
        })
    }
}
