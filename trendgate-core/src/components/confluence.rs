//! Confluence scoring: an additive, capped score over independent factors.
//!
//! A snapshot of indicator values is captured once per timeframe, then each
//! factor inspects the snapshot for the requested side and contributes its
//! configured weight when it agrees. The sum is capped at `max_score`
//! (not renormalized). A factor whose inputs are undefined contributes nothing.
//!
//! | Factor                 | CALL condition (PUT mirrors)                    |
//! |------------------------|-------------------------------------------------|
//! | TrendAgreement         | fast EMA > slow EMA on both HTF and LTF         |
//! | HtfDirectionalStrength | HTF ADX > threshold                             |
//! | VolumeSurge            | LTF volume ratio above the high or low tier     |
//! | RsiMidBand             | LTF RSI inside the side's mid band              |
//! | ReversalPattern        | a bullish reversal pattern on the LTF           |
//! | FastMaProximity        | LTF close within `proximity_pct`% of EMA        |
//! | MomentumAgreement      | LTF MACD histogram > 0                          |
//! | VolatilityMidline      | LTF close above the Bollinger middle band       |

use crate::components::indicator::{latest, Indicator};
use crate::components::quality::RsiBand;
use crate::domain::{Candle, OptionSide};
use crate::indicators::{
    detect_patterns, ema_of_series, rsi_of_series, trailing_mean, Adx, Bollinger, CandlePattern,
    Macd,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfluenceConfig {
    pub min_score: f64,
    pub max_score: f64,

    pub trend_fast_period: usize,
    pub trend_slow_period: usize,
    pub trend_agreement_weight: f64,

    pub adx_period: usize,
    pub adx_threshold: f64,
    pub adx_weight: f64,

    pub volume_lookback: usize,
    pub volume_high_ratio: f64,
    pub volume_high_weight: f64,
    pub volume_low_ratio: f64,
    pub volume_low_weight: f64,

    pub rsi_period: usize,
    pub call_rsi_band: RsiBand,
    pub put_rsi_band: RsiBand,
    pub rsi_weight: f64,

    pub pattern_weight: f64,

    pub proximity_ema_period: usize,
    /// Maximum |close - EMA| / EMA in percent.
    pub proximity_pct: f64,
    pub proximity_weight: f64,

    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub momentum_weight: f64,

    pub bollinger_period: usize,
    pub midline_weight: f64,
}

impl Default for ConfluenceConfig {
    fn default() -> Self {
        Self {
            min_score: 7.0,
            max_score: 10.0,
            trend_fast_period: 20,
            trend_slow_period: 50,
            trend_agreement_weight: 2.0,
            adx_period: 14,
            adx_threshold: 30.0,
            adx_weight: 1.0,
            volume_lookback: 20,
            volume_high_ratio: 1.5,
            volume_high_weight: 1.5,
            volume_low_ratio: 1.2,
            volume_low_weight: 1.0,
            rsi_period: 14,
            call_rsi_band: RsiBand::new(40.0, 55.0),
            put_rsi_band: RsiBand::new(45.0, 60.0),
            rsi_weight: 1.0,
            pattern_weight: 1.5,
            proximity_ema_period: 20,
            proximity_pct: 0.3,
            proximity_weight: 1.0,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            momentum_weight: 1.0,
            bollinger_period: 20,
            midline_weight: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfluenceFactor {
    TrendAgreement,
    HtfDirectionalStrength,
    VolumeSurge,
    RsiMidBand,
    ReversalPattern,
    FastMaProximity,
    MomentumAgreement,
    VolatilityMidline,
}

impl fmt::Display for ConfluenceFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConfluenceFactor::TrendAgreement => "multi-timeframe trend agreement",
            ConfluenceFactor::HtfDirectionalStrength => "strong HTF ADX",
            ConfluenceFactor::VolumeSurge => "volume surge",
            ConfluenceFactor::RsiMidBand => "RSI mid band",
            ConfluenceFactor::ReversalPattern => "reversal pattern",
            ConfluenceFactor::FastMaProximity => "near fast EMA",
            ConfluenceFactor::MomentumAgreement => "MACD agreement",
            ConfluenceFactor::VolatilityMidline => "Bollinger midline",
        };
        f.write_str(s)
    }
}

/// Latest indicator readings on one timeframe. `None` means undefined.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeframeSnapshot {
    pub close: Option<f64>,
    pub ema_fast: Option<f64>,
    pub ema_slow: Option<f64>,
    pub proximity_ema: Option<f64>,
    pub adx: Option<f64>,
    pub rsi: Option<f64>,
    pub volume_ratio: Option<f64>,
    pub macd_histogram: Option<f64>,
    pub bollinger_middle: Option<f64>,
    pub patterns: Vec<CandlePattern>,
}

impl TimeframeSnapshot {
    pub fn capture(candles: &[Candle], config: &ConfluenceConfig) -> Self {
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let volumes: Vec<f64> = candles.iter().map(|c| c.volume).collect();

        let volume_ratio = match (candles.last(), trailing_mean(&volumes, config.volume_lookback)) {
            (Some(last), Some(avg)) if avg > 0.0 => Some(last.volume / avg),
            _ => None,
        };

        Self {
            close: candles.last().map(|c| c.close),
            ema_fast: latest(&ema_of_series(&closes, config.trend_fast_period)),
            ema_slow: latest(&ema_of_series(&closes, config.trend_slow_period)),
            proximity_ema: latest(&ema_of_series(&closes, config.proximity_ema_period)),
            adx: Adx::new(config.adx_period).latest(candles),
            rsi: latest(&rsi_of_series(&closes, config.rsi_period)),
            volume_ratio,
            macd_histogram: Macd::histogram(config.macd_fast, config.macd_slow, config.macd_signal)
                .latest(candles),
            bollinger_middle: Bollinger::middle(config.bollinger_period).latest(candles),
            patterns: detect_patterns(candles),
        }
    }
}

/// Indicator readings across both timeframes, captured once per evaluation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub htf: TimeframeSnapshot,
    pub ltf: TimeframeSnapshot,
}

impl IndicatorSnapshot {
    pub fn capture(htf: &[Candle], ltf: &[Candle], config: &ConfluenceConfig) -> Self {
        Self {
            htf: TimeframeSnapshot::capture(htf, config),
            ltf: TimeframeSnapshot::capture(ltf, config),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorContribution {
    pub factor: ConfluenceFactor,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfluenceScore {
    /// Capped score in [0, max_score].
    pub value: f64,
    /// Uncapped sum of contributions.
    pub raw: f64,
    pub factors: Vec<FactorContribution>,
}

impl ConfluenceScore {
    /// "multi-timeframe trend agreement (+2.0), volume surge (+1.5)".
    pub fn describe(&self) -> String {
        if self.factors.is_empty() {
            return "no confluence factors".to_string();
        }
        self.factors
            .iter()
            .map(|c| format!("{} (+{:.1})", c.factor, c.weight))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone)]
pub struct ConfluenceScorer {
    config: ConfluenceConfig,
}

impl ConfluenceScorer {
    pub fn new(config: ConfluenceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConfluenceConfig {
        &self.config
    }

    pub fn min_score(&self) -> f64 {
        self.config.min_score
    }

    pub fn passes(&self, score: &ConfluenceScore) -> bool {
        score.value >= self.config.min_score
    }

    /// Score a snapshot for one side. Pure: equal snapshots give equal scores.
    pub fn score(&self, snapshot: &IndicatorSnapshot, side: OptionSide) -> ConfluenceScore {
        let cfg = &self.config;
        let (htf, ltf) = (&snapshot.htf, &snapshot.ltf);
        let dir = side.direction();
        let mut factors = Vec::new();
        let mut add = |factor: ConfluenceFactor, weight: f64| {
            if weight > 0.0 {
                factors.push(FactorContribution { factor, weight });
            }
        };

        let agrees = |fast: Option<f64>, slow: Option<f64>| match (fast, slow) {
            (Some(f), Some(s)) => (f - s) * dir > 0.0,
            _ => false,
        };
        if agrees(htf.ema_fast, htf.ema_slow) && agrees(ltf.ema_fast, ltf.ema_slow) {
            add(ConfluenceFactor::TrendAgreement, cfg.trend_agreement_weight);
        }

        if htf.adx.is_some_and(|adx| adx > cfg.adx_threshold) {
            add(ConfluenceFactor::HtfDirectionalStrength, cfg.adx_weight);
        }

        match ltf.volume_ratio {
            Some(r) if r > cfg.volume_high_ratio => {
                add(ConfluenceFactor::VolumeSurge, cfg.volume_high_weight)
            }
            Some(r) if r > cfg.volume_low_ratio => {
                add(ConfluenceFactor::VolumeSurge, cfg.volume_low_weight)
            }
            _ => {}
        }

        let band = match side {
            OptionSide::Call => cfg.call_rsi_band,
            OptionSide::Put => cfg.put_rsi_band,
        };
        if ltf.rsi.is_some_and(|rsi| band.contains(rsi)) {
            add(ConfluenceFactor::RsiMidBand, cfg.rsi_weight);
        }

        if ltf.patterns.iter().any(|p| p.side() == side) {
            add(ConfluenceFactor::ReversalPattern, cfg.pattern_weight);
        }

        if let (Some(close), Some(ema)) = (ltf.close, ltf.proximity_ema) {
            if ema > 0.0 && (close - ema).abs() / ema * 100.0 < cfg.proximity_pct {
                add(ConfluenceFactor::FastMaProximity, cfg.proximity_weight);
            }
        }

        if ltf.macd_histogram.is_some_and(|h| h * dir > 0.0) {
            add(ConfluenceFactor::MomentumAgreement, cfg.momentum_weight);
        }

        if let (Some(close), Some(mid)) = (ltf.close, ltf.bollinger_middle) {
            if (close - mid) * dir > 0.0 {
                add(ConfluenceFactor::VolatilityMidline, cfg.midline_weight);
            }
        }

        let raw: f64 = factors.iter().map(|c| c.weight).sum();
        let value = raw.clamp(0.0, cfg.max_score);
        debug!(side = %side, raw, value, factors = factors.len(), "confluence scored");
        ConfluenceScore {
            value,
            raw,
            factors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_candles;

    /// Every factor agrees with a CALL.
    fn bullish_snapshot() -> IndicatorSnapshot {
        let ltf = TimeframeSnapshot {
            close: Some(22_510.0),
            ema_fast: Some(22_500.0),
            ema_slow: Some(22_400.0),
            proximity_ema: Some(22_500.0),
            adx: Some(18.0),
            rsi: Some(50.0),
            volume_ratio: Some(1.8),
            macd_histogram: Some(2.5),
            bollinger_middle: Some(22_480.0),
            patterns: vec![CandlePattern::BullishEngulfing],
        };
        let htf = TimeframeSnapshot {
            ema_fast: Some(22_450.0),
            ema_slow: Some(22_300.0),
            adx: Some(34.0),
            ..TimeframeSnapshot::default()
        };
        IndicatorSnapshot { htf, ltf }
    }

    fn scorer() -> ConfluenceScorer {
        ConfluenceScorer::new(ConfluenceConfig::default())
    }

    #[test]
    fn all_factors_reach_cap() {
        let score = scorer().score(&bullish_snapshot(), OptionSide::Call);
        assert_eq!(score.factors.len(), 8);
        assert!((score.raw - 10.0).abs() < 1e-12);
        assert!((score.value - 10.0).abs() < 1e-12);
        assert!(scorer().passes(&score));
    }

    #[test]
    fn sum_is_capped_not_renormalized() {
        let config = ConfluenceConfig {
            trend_agreement_weight: 8.0,
            pattern_weight: 6.0,
            ..ConfluenceConfig::default()
        };
        let score = ConfluenceScorer::new(config).score(&bullish_snapshot(), OptionSide::Call);
        assert!(score.raw > 10.0);
        assert_eq!(score.value, 10.0);
    }

    #[test]
    fn put_side_sees_opposite_factors() {
        let score = scorer().score(&bullish_snapshot(), OptionSide::Put);
        // Only side-agnostic factors remain: ADX, volume, RSI (50 in [45,60]) and proximity.
        let names: Vec<_> = score.factors.iter().map(|c| c.factor).collect();
        assert_eq!(
            names,
            vec![
                ConfluenceFactor::HtfDirectionalStrength,
                ConfluenceFactor::VolumeSurge,
                ConfluenceFactor::RsiMidBand,
                ConfluenceFactor::FastMaProximity,
            ]
        );
        assert!((score.value - 4.5).abs() < 1e-12);
        assert!(!scorer().passes(&score));
    }

    #[test]
    fn volume_tiers() {
        let mut snap = bullish_snapshot();
        snap.ltf.volume_ratio = Some(1.3);
        let low = scorer().score(&snap, OptionSide::Call);
        snap.ltf.volume_ratio = Some(1.1);
        let none = scorer().score(&snap, OptionSide::Call);
        assert!((low.value - 9.5).abs() < 1e-12);
        assert!((none.value - 8.5).abs() < 1e-12);
    }

    #[test]
    fn missing_values_contribute_nothing() {
        let score = scorer().score(&IndicatorSnapshot::default(), OptionSide::Call);
        assert_eq!(score.value, 0.0);
        assert!(score.factors.is_empty());
        assert_eq!(score.describe(), "no confluence factors");
    }

    #[test]
    fn scoring_is_deterministic() {
        let snap = bullish_snapshot();
        let a = scorer().score(&snap, OptionSide::Call);
        let b = scorer().score(&snap.clone(), OptionSide::Call);
        assert_eq!(a, b);
    }

    #[test]
    fn capture_reads_latest_values() {
        let closes: Vec<f64> = (0..80).map(|i| 100.0 + i as f64).collect();
        let candles = make_candles(&closes);
        let snap = IndicatorSnapshot::capture(&candles, &candles, &ConfluenceConfig::default());
        assert_eq!(snap.ltf.close, Some(179.0));
        assert!(snap.ltf.ema_fast.unwrap() > snap.ltf.ema_slow.unwrap());
        assert!(snap.ltf.macd_histogram.is_some());
        assert!(snap.ltf.bollinger_middle.is_some());
        // Flat volume: ratio 1.0
        assert_eq!(snap.ltf.volume_ratio, Some(1.0));
        let score = scorer().score(&snap, OptionSide::Call);
        assert_eq!(score.factors[0].factor, ConfluenceFactor::TrendAgreement);
    }

    #[test]
    fn describe_lists_contributions() {
        let score = ConfluenceScore {
            value: 3.5,
            raw: 3.5,
            factors: vec![
                FactorContribution {
                    factor: ConfluenceFactor::TrendAgreement,
                    weight: 2.0,
                },
                FactorContribution {
                    factor: ConfluenceFactor::VolumeSurge,
                    weight: 1.5,
                },
            ],
        };
        assert_eq!(
            score.describe(),
            "multi-timeframe trend agreement (+2.0), volume surge (+1.5)"
        );
    }
}
