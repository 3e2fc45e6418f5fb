//! Reversal candlestick patterns read off the most recent candles.
//!
//! Single-candle shapes use body/wick proportions of the last candle; the
//! engulfing patterns compare the last two candles; the stars use the last
//! three. All checks are pure geometry with no trend context.

use crate::domain::{Candle, OptionSide};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum body share of the range for hammer-type candles.
const SMALL_BODY_RATIO: f64 = 0.35;
/// Shadow length relative to body for hammer-type candles.
const LONG_SHADOW_MULTIPLE: f64 = 2.0;
/// Maximum opposite shadow share of the range for hammer-type candles.
const TINY_SHADOW_RATIO: f64 = 0.1;
/// Minimum body share of the range for the first candle of a star.
const STAR_LEAD_BODY_RATIO: f64 = 0.5;
/// Maximum star body relative to the lead candle body.
const STAR_BODY_MULTIPLE: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandlePattern {
    Hammer,
    ShootingStar,
    BullishEngulfing,
    BearishEngulfing,
    MorningStar,
    EveningStar,
}

impl CandlePattern {
    /// The option side this reversal pattern supports.
    pub fn side(self) -> OptionSide {
        match self {
            CandlePattern::Hammer | CandlePattern::BullishEngulfing | CandlePattern::MorningStar => {
                OptionSide::Call
            }
            CandlePattern::ShootingStar
            | CandlePattern::BearishEngulfing
            | CandlePattern::EveningStar => OptionSide::Put,
        }
    }
}

impl fmt::Display for CandlePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CandlePattern::Hammer => "hammer",
            CandlePattern::ShootingStar => "shooting_star",
            CandlePattern::BullishEngulfing => "bullish_engulfing",
            CandlePattern::BearishEngulfing => "bearish_engulfing",
            CandlePattern::MorningStar => "morning_star",
            CandlePattern::EveningStar => "evening_star",
        };
        f.write_str(s)
    }
}

/// All patterns completed by the last candle, in a fixed order.
pub fn detect_patterns(candles: &[Candle]) -> Vec<CandlePattern> {
    let mut found = Vec::new();
    let Some(last) = candles.last() else {
        return found;
    };

    if is_hammer(last) {
        found.push(CandlePattern::Hammer);
    }
    if is_shooting_star(last) {
        found.push(CandlePattern::ShootingStar);
    }
    if let [.., prev, curr] = candles {
        if is_bullish_engulfing(prev, curr) {
            found.push(CandlePattern::BullishEngulfing);
        }
        if is_bearish_engulfing(prev, curr) {
            found.push(CandlePattern::BearishEngulfing);
        }
    }
    if let [.., first, star, last] = candles {
        if is_morning_star(first, star, last) {
            found.push(CandlePattern::MorningStar);
        }
        if is_evening_star(first, star, last) {
            found.push(CandlePattern::EveningStar);
        }
    }
    found
}

fn is_hammer(c: &Candle) -> bool {
    let range = c.range();
    range > 0.0
        && c.body() <= SMALL_BODY_RATIO * range
        && c.lower_wick() >= LONG_SHADOW_MULTIPLE * c.body()
        && c.lower_wick() > 0.0
        && c.upper_wick() <= TINY_SHADOW_RATIO * range
}

fn is_shooting_star(c: &Candle) -> bool {
    let range = c.range();
    range > 0.0
        && c.body() <= SMALL_BODY_RATIO * range
        && c.upper_wick() >= LONG_SHADOW_MULTIPLE * c.body()
        && c.upper_wick() > 0.0
        && c.lower_wick() <= TINY_SHADOW_RATIO * range
}

fn is_bullish_engulfing(prev: &Candle, curr: &Candle) -> bool {
    prev.is_bearish()
        && curr.is_bullish()
        && curr.open <= prev.close
        && curr.close >= prev.open
        && curr.body() > prev.body()
}

fn is_bearish_engulfing(prev: &Candle, curr: &Candle) -> bool {
    prev.is_bullish()
        && curr.is_bearish()
        && curr.open >= prev.close
        && curr.close <= prev.open
        && curr.body() > prev.body()
}

fn is_star(lead: &Candle, star: &Candle) -> bool {
    let range = lead.range();
    range > 0.0
        && lead.body() >= STAR_LEAD_BODY_RATIO * range
        && star.body() <= STAR_BODY_MULTIPLE * lead.body()
}

fn is_morning_star(first: &Candle, star: &Candle, last: &Candle) -> bool {
    let midpoint = (first.open + first.close) / 2.0;
    first.is_bearish() && is_star(first, star) && last.is_bullish() && last.close > midpoint
}

fn is_evening_star(first: &Candle, star: &Candle, last: &Candle) -> bool {
    let midpoint = (first.open + first.close) / 2.0;
    first.is_bullish() && is_star(first, star) && last.is_bearish() && last.close < midpoint
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_ohlc_candles;

    #[test]
    fn hammer_long_lower_shadow() {
        // body 1, lower wick 6, upper wick 0.5, range 7.5
        let c = make_ohlc_candles(&[(100.0, 101.5, 94.0, 101.0)]);
        assert_eq!(detect_patterns(&c), vec![CandlePattern::Hammer]);
    }

    #[test]
    fn shooting_star_long_upper_shadow() {
        let c = make_ohlc_candles(&[(100.0, 107.0, 99.5, 99.5)]);
        assert_eq!(detect_patterns(&c), vec![CandlePattern::ShootingStar]);
    }

    #[test]
    fn bullish_engulfing_two_candles() {
        let c = make_ohlc_candles(&[(105.0, 106.0, 101.0, 102.0), (101.5, 107.0, 101.0, 106.5)]);
        assert_eq!(detect_patterns(&c), vec![CandlePattern::BullishEngulfing]);
    }

    #[test]
    fn bearish_engulfing_two_candles() {
        let c = make_ohlc_candles(&[(102.0, 106.0, 101.0, 105.0), (105.5, 106.0, 100.0, 101.0)]);
        assert_eq!(detect_patterns(&c), vec![CandlePattern::BearishEngulfing]);
    }

    #[test]
    fn morning_star_three_candles() {
        let c = make_ohlc_candles(&[
            (110.0, 110.5, 101.5, 102.0), // long bearish
            (101.5, 102.5, 100.5, 101.8), // small star
            (102.0, 108.5, 101.8, 108.0), // bullish, closes above 106
        ]);
        assert!(detect_patterns(&c).contains(&CandlePattern::MorningStar));
    }

    #[test]
    fn evening_star_three_candles() {
        let c = make_ohlc_candles(&[
            (100.0, 108.5, 99.5, 108.0), // long bullish
            (108.2, 109.0, 107.5, 108.4), // small star
            (108.0, 108.2, 101.0, 101.5), // bearish, closes below 104
        ]);
        assert!(detect_patterns(&c).contains(&CandlePattern::EveningStar));
    }

    #[test]
    fn plain_trend_candle_has_no_pattern() {
        let c = make_ohlc_candles(&[(100.0, 103.2, 99.8, 103.0), (103.0, 106.2, 102.8, 106.0)]);
        assert!(detect_patterns(&c).is_empty());
    }

    #[test]
    fn pattern_sides() {
        assert_eq!(CandlePattern::Hammer.side(), OptionSide::Call);
        assert_eq!(CandlePattern::EveningStar.side(), OptionSide::Put);
        assert_eq!(CandlePattern::BullishEngulfing.to_string(), "bullish_engulfing");
    }

    #[test]
    fn empty_input() {
        assert!(detect_patterns(&[]).is_empty());
    }
}
