//! Entry candle shape check.
//!
//! body%      = |close - open| / (high - low)
//! wick ratio = opposing wick / body, where the opposing wick is the lower
//!              wick for CALL entries and the upper wick for PUT entries.

use super::{CheckResult, QualityCheck, QualityInput, QualityRule};
use crate::domain::OptionSide;

#[derive(Debug, Clone)]
pub struct CandleQualityRule {
    min_body_percent: f64,
    max_wick_ratio: f64,
}

impl CandleQualityRule {
    pub fn new(min_body_percent: f64, max_wick_ratio: f64) -> Self {
        Self {
            min_body_percent,
            max_wick_ratio,
        }
    }
}

impl QualityRule for CandleQualityRule {
    fn check(&self) -> QualityCheck {
        QualityCheck::CandleQuality
    }

    fn evaluate(&self, input: &QualityInput<'_>) -> CheckResult {
        let Some(candle) = input.candles.last() else {
            return CheckResult::fail(QualityCheck::CandleQuality, "no candle to inspect");
        };
        let range = candle.range();
        if range <= 0.0 {
            return CheckResult::fail(QualityCheck::CandleQuality, "zero range candle");
        }

        let body = candle.body();
        let body_percent = body / range;
        if body_percent < self.min_body_percent {
            return CheckResult::fail(
                QualityCheck::CandleQuality,
                format!(
                    "weak body {:.0}% of range (min {:.0}%)",
                    body_percent * 100.0,
                    self.min_body_percent * 100.0
                ),
            )
            .with("body_percent", body_percent);
        }

        let opposing = match input.side {
            OptionSide::Call => candle.lower_wick(),
            OptionSide::Put => candle.upper_wick(),
        };
        // body > 0 here since body_percent >= min_body_percent > 0
        let wick_ratio = if body > 0.0 { opposing / body } else { f64::INFINITY };
        let result = if wick_ratio > self.max_wick_ratio {
            CheckResult::fail(
                QualityCheck::CandleQuality,
                format!(
                    "opposing wick {:.2}x body (max {:.2}x)",
                    wick_ratio, self.max_wick_ratio
                ),
            )
        } else {
            CheckResult::pass(
                QualityCheck::CandleQuality,
                format!("body {:.0}% of range, wick {:.2}x body", body_percent * 100.0, wick_ratio),
            )
        };
        result
            .with("body_percent", body_percent)
            .with("wick_ratio", wick_ratio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_ohlc_candles;
    use chrono::NaiveTime;

    fn evaluate(ohlc: (f64, f64, f64, f64), side: OptionSide) -> CheckResult {
        let candles = make_ohlc_candles(&[ohlc]);
        let input = QualityInput {
            candles: &candles,
            side,
            local_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
        };
        CandleQualityRule::new(0.6, 0.3).evaluate(&input)
    }

    #[test]
    fn strong_bullish_candle_passes_call() {
        // range 10, body 8, lower wick 1, upper wick 1
        let r = evaluate((101.0, 110.0, 100.0, 109.0), OptionSide::Call);
        assert!(r.passed, "{}", r.reason);
        assert!((r.measurement("body_percent").unwrap() - 0.8).abs() < 1e-12);
        assert!((r.measurement("wick_ratio").unwrap() - 0.125).abs() < 1e-12);
    }

    #[test]
    fn weak_body_fails() {
        // body 2 of range 10
        let r = evaluate((104.0, 110.0, 100.0, 106.0), OptionSide::Call);
        assert!(!r.passed);
        assert!(r.reason.starts_with("weak body 20%"));
        assert!(r.measurement("wick_ratio").is_none());
    }

    #[test]
    fn opposing_wick_depends_on_side() {
        // body 6.5, lower wick 3 (ratio ~0.46), upper wick 0.5 (ratio ~0.08)
        let ohlc = (103.0, 110.0, 100.0, 109.5);
        let call = evaluate(ohlc, OptionSide::Call);
        let put = evaluate(ohlc, OptionSide::Put);
        assert!(!call.passed);
        assert!(call.reason.starts_with("opposing wick"));
        assert!(put.passed, "{}", put.reason);
    }

    #[test]
    fn zero_range_fails() {
        let r = evaluate((100.0, 100.0, 100.0, 100.0), OptionSide::Put);
        assert!(!r.passed);
        assert_eq!(r.reason, "zero range candle");
    }
}
