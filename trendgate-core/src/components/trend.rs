//! Higher-timeframe trend classification.
//!
//! separation% = (EMA_fast - EMA_slow) / EMA_slow * 100 on the latest candle
//! bias        = CALL_ONLY above +min_separation, PUT_ONLY below -min_separation
//! alignment   = sign(EMA_fast - EMA_slow) constant over the last `alignment_bars`
//! strength    = clamp(0, 100, 0.6 * |separation%| * separation_scale
//!                             + 0.4 * 100 * agreeing fraction of the last `strength_window`)
//!
//! The assessment is tradeable only with enough history, a directional bias,
//! alignment, and strength at or above `min_strength`.

use crate::components::indicator::latest;
use crate::domain::{Bias, Candle};
use crate::indicators::ema_of_series;
use serde::{Deserialize, Serialize};
use tracing::debug;

const SEPARATION_WEIGHT: f64 = 0.6;
const AGREEMENT_WEIGHT: f64 = 0.4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    pub fast_period: usize,
    pub slow_period: usize,
    /// Minimum |separation%| for a directional bias.
    pub min_separation_pct: f64,
    pub alignment_bars: usize,
    pub strength_window: usize,
    /// Multiplier turning separation% into strength points.
    pub separation_scale: f64,
    pub min_strength: f64,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            fast_period: 20,
            slow_period: 50,
            min_separation_pct: 0.2,
            alignment_bars: 3,
            strength_window: 5,
            separation_scale: 10.0,
            min_strength: 30.0,
        }
    }
}

/// Outcome category of a trend assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendStatus {
    Confirmed,
    InsufficientHistory,
    Choppy,
    Whipsaw,
    Weak,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendAssessment {
    pub bias: Bias,
    /// 0..=100
    pub strength: f64,
    pub valid: bool,
    pub status: TrendStatus,
    pub reason: String,
    pub ema_fast: Option<f64>,
    pub ema_slow: Option<f64>,
    pub separation_pct: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct TrendClassifier {
    config: TrendConfig,
}

impl TrendClassifier {
    pub fn new(config: TrendConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrendConfig {
        &self.config
    }

    pub fn classify(&self, candles: &[Candle]) -> TrendAssessment {
        let cfg = &self.config;
        let n = candles.len();
        if n < cfg.slow_period {
            return TrendAssessment {
                bias: Bias::NoTrade,
                strength: 0.0,
                valid: false,
                status: TrendStatus::InsufficientHistory,
                reason: format!("insufficient data: {n} candles, need {}", cfg.slow_period),
                ema_fast: None,
                ema_slow: None,
                separation_pct: None,
            };
        }

        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let fast = ema_of_series(&closes, cfg.fast_period);
        let slow = ema_of_series(&closes, cfg.slow_period);
        let spread: Vec<f64> = fast.iter().zip(&slow).map(|(f, s)| f - s).collect();

        let (Some(ema_fast), Some(ema_slow)) = (latest(&fast), latest(&slow)) else {
            return TrendAssessment {
                bias: Bias::NoTrade,
                strength: 0.0,
                valid: false,
                status: TrendStatus::InsufficientHistory,
                reason: "insufficient data: EMA undefined on latest candle".to_string(),
                ema_fast: None,
                ema_slow: None,
                separation_pct: None,
            };
        };

        let separation = (ema_fast - ema_slow) / ema_slow * 100.0;
        let bias = if separation > cfg.min_separation_pct {
            Bias::CallOnly
        } else if separation < -cfg.min_separation_pct {
            Bias::PutOnly
        } else {
            Bias::NoTrade
        };

        let latest_sign = sign(ema_fast - ema_slow);
        let aligned = latest_sign != 0
            && spread.len() >= cfg.alignment_bars
            && spread[spread.len() - cfg.alignment_bars..]
                .iter()
                .all(|d| sign(*d) == latest_sign);

        let agreement = if latest_sign != 0 && spread.len() >= cfg.strength_window {
            let window = &spread[spread.len() - cfg.strength_window..];
            window.iter().filter(|d| sign(**d) == latest_sign).count() as f64
                / cfg.strength_window as f64
        } else {
            0.0
        };
        let strength = (SEPARATION_WEIGHT * separation.abs() * cfg.separation_scale
            + AGREEMENT_WEIGHT * 100.0 * agreement)
            .clamp(0.0, 100.0);

        let (status, reason) = match bias.side() {
            None => (
                TrendStatus::Choppy,
                "market choppy/flat - no clear trend".to_string(),
            ),
            Some(_) if !aligned => (
                TrendStatus::Whipsaw,
                "trend not aligned - possible whipsaw zone".to_string(),
            ),
            Some(_) if strength < cfg.min_strength => (
                TrendStatus::Weak,
                format!("trend too weak ({strength:.1}/100)"),
            ),
            Some(side) => (
                TrendStatus::Confirmed,
                format!(
                    "strong {side} trend confirmed (EMA{} {:+.2}% vs EMA{}, strength {strength:.1}/100)",
                    cfg.fast_period, separation, cfg.slow_period
                ),
            ),
        };

        debug!(
            bias = %bias,
            separation_pct = separation,
            strength,
            aligned,
            ?status,
            "trend classified"
        );

        TrendAssessment {
            bias,
            strength,
            valid: status == TrendStatus::Confirmed,
            status,
            reason,
            ema_fast: Some(ema_fast),
            ema_slow: Some(ema_slow),
            separation_pct: Some(separation),
        }
    }
}

fn sign(x: f64) -> i8 {
    if x > 0.0 {
        1
    } else if x < 0.0 {
        -1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_candles;

    fn classify(closes: &[f64]) -> TrendAssessment {
        TrendClassifier::new(TrendConfig::default()).classify(&make_candles(closes))
    }

    fn ramp(n: usize, start: f64, step: f64) -> Vec<f64> {
        (0..n).map(|i| start + step * i as f64).collect()
    }

    #[test]
    fn steady_uptrend_is_call_only() {
        let t = classify(&ramp(80, 20_000.0, 15.0));
        assert_eq!(t.bias, Bias::CallOnly);
        assert!(t.valid, "{}", t.reason);
        assert_eq!(t.status, TrendStatus::Confirmed);
        assert!(t.strength >= 30.0);
        assert!(t.reason.starts_with("strong CALL trend confirmed"));
    }

    #[test]
    fn steady_downtrend_is_put_only() {
        let t = classify(&ramp(80, 22_000.0, -15.0));
        assert_eq!(t.bias, Bias::PutOnly);
        assert!(t.valid);
        assert!(t.separation_pct.unwrap() < -0.2);
    }

    #[test]
    fn flat_market_is_no_trade() {
        let t = classify(&[20_000.0; 60]);
        assert_eq!(t.bias, Bias::NoTrade);
        assert!(!t.valid);
        assert_eq!(t.status, TrendStatus::Choppy);
        assert_eq!(t.reason, "market choppy/flat - no clear trend");
    }

    #[test]
    fn short_history_is_insufficient() {
        let t = classify(&ramp(49, 100.0, 1.0));
        assert_eq!(t.status, TrendStatus::InsufficientHistory);
        assert_eq!(t.reason, "insufficient data: 49 candles, need 50");
        assert!(t.ema_fast.is_none());
    }

    #[test]
    fn fresh_cross_is_whipsaw() {
        // Steady decline, then one large jump: the fast EMA crosses above the
        // slow EMA on the last candle only, so separation is past the
        // threshold but the spread sign has not held for three candles.
        let mut closes = ramp(60, 200.0, -1.0);
        closes.push(450.0);
        let t = classify(&closes);
        assert_eq!(t.bias, Bias::CallOnly);
        assert_eq!(t.status, TrendStatus::Whipsaw);
        assert_eq!(t.reason, "trend not aligned - possible whipsaw zone");
        assert!(!t.valid);
    }

    #[test]
    fn weak_trend_below_min_strength() {
        let config = TrendConfig {
            min_strength: 99.0,
            ..TrendConfig::default()
        };
        let t = TrendClassifier::new(config).classify(&make_candles(&ramp(80, 20_000.0, 5.0)));
        assert_eq!(t.bias, Bias::CallOnly);
        assert_eq!(t.status, TrendStatus::Weak);
        assert!(t.reason.starts_with("trend too weak ("));
    }

    #[test]
    fn strength_is_clamped() {
        let t = classify(&ramp(80, 100.0, 10.0));
        assert!(t.strength <= 100.0);
        assert_eq!(t.strength, 100.0);
    }
}
