//! RSI band check.
//!
//! CALL entries want RSI inside the call band, PUT entries inside the put
//! band. Both bounds are inclusive. An undefined RSI (flat window, zero
//! average loss) fails rather than being read as 100.

use super::{CheckResult, QualityCheck, QualityInput, QualityRule};
use crate::components::indicator::latest;
use crate::domain::OptionSide;
use crate::indicators::rsi_of_series;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Inclusive RSI range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RsiBand {
    pub lower: f64,
    pub upper: f64,
}

impl RsiBand {
    pub fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

impl fmt::Display for RsiBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.lower, self.upper)
    }
}

#[derive(Debug, Clone)]
pub struct RsiRule {
    period: usize,
    call_band: RsiBand,
    put_band: RsiBand,
}

impl RsiRule {
    pub fn new(period: usize, call_band: RsiBand, put_band: RsiBand) -> Self {
        Self {
            period,
            call_band,
            put_band,
        }
    }

    fn band(&self, side: OptionSide) -> RsiBand {
        match side {
            OptionSide::Call => self.call_band,
            OptionSide::Put => self.put_band,
        }
    }
}

impl QualityRule for RsiRule {
    fn check(&self) -> QualityCheck {
        QualityCheck::Rsi
    }

    fn evaluate(&self, input: &QualityInput<'_>) -> CheckResult {
        let n = input.candles.len();
        if n < self.period + 1 {
            return CheckResult::fail(
                QualityCheck::Rsi,
                format!(
                    "insufficient data for RSI({}): {n} candles, need {}",
                    self.period,
                    self.period + 1
                ),
            );
        }

        let closes: Vec<f64> = input.candles.iter().map(|c| c.close).collect();
        let Some(rsi) = latest(&rsi_of_series(&closes, self.period)) else {
            return CheckResult::fail(QualityCheck::Rsi, "RSI undefined (no losses in window)");
        };

        let band = self.band(input.side);
        if band.contains(rsi) {
            CheckResult::pass(
                QualityCheck::Rsi,
                format!("RSI {rsi:.1} in {} band {band}", input.side),
            )
            .with("rsi", rsi)
        } else {
            CheckResult::fail(
                QualityCheck::Rsi,
                format!("RSI {rsi:.1} outside {} band {band}", input.side),
            )
            .with("rsi", rsi)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_candles;
    use chrono::NaiveTime;

    fn rule() -> RsiRule {
        RsiRule::new(14, RsiBand::new(45.0, 60.0), RsiBand::new(40.0, 55.0))
    }

    fn input(candles: &[crate::domain::Candle], side: OptionSide) -> QualityInput<'_> {
        QualityInput {
            candles,
            side,
            local_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
        }
    }

    /// 15 closes whose 14 deltas are `gains` of +1.0 followed by losses of -1.0.
    fn closes_with_gains(gains: usize) -> Vec<f64> {
        let mut closes = vec![100.0];
        for i in 0..14 {
            let last = *closes.last().unwrap();
            closes.push(if i < gains { last + 1.0 } else { last - 1.0 });
        }
        closes
    }

    #[test]
    fn band_is_inclusive() {
        let band = RsiBand::new(45.0, 60.0);
        assert!(band.contains(45.0));
        assert!(band.contains(60.0));
        assert!(!band.contains(60.0001));
        assert_eq!(band.to_string(), "[45, 60]");
    }

    #[test]
    fn rsi_fifty_passes_both_sides() {
        // 7 gains, 7 losses of equal size → RSI exactly 50.
        let candles = make_candles(&closes_with_gains(7));
        let call = rule().evaluate(&input(&candles, OptionSide::Call));
        let put = rule().evaluate(&input(&candles, OptionSide::Put));
        assert!(call.passed, "{}", call.reason);
        assert!(put.passed, "{}", put.reason);
        assert!((call.measurement("rsi").unwrap() - 50.0).abs() < 1e-9);
        assert_eq!(call.reason, "RSI 50.0 in CALL band [45, 60]");
    }

    #[test]
    fn overbought_fails_call() {
        // 12 gains, 2 losses → RSI = 100 - 100/7 ≈ 85.7
        let candles = make_candles(&closes_with_gains(12));
        let r = rule().evaluate(&input(&candles, OptionSide::Call));
        assert!(!r.passed);
        assert!(r.reason.starts_with("RSI 85.7 outside CALL band"));
        assert!(r.measurement("rsi").is_some());
    }

    #[test]
    fn undefined_rsi_fails() {
        let candles = make_candles(&closes_with_gains(14));
        let r = rule().evaluate(&input(&candles, OptionSide::Call));
        assert!(!r.passed);
        assert!(r.reason.starts_with("RSI undefined"));
        assert!(r.measurement("rsi").is_none());
    }

    #[test]
    fn short_history_fails() {
        let candles = make_candles(&[100.0; 10]);
        let r = rule().evaluate(&input(&candles, OptionSide::Put));
        assert!(!r.passed);
        assert_eq!(r.reason, "insufficient data for RSI(14): 10 candles, need 15");
    }
}
