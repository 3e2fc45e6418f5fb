//! Synthetic candle series for demos, benchmarks and tests.
//!
//! Two kinds of data:
//! - Scripted scenarios (`trend_htf`, `breakout_ltf`) whose indicator values
//!   are known in advance, so a full pipeline run can be predicted.
//! - A seeded random walk (`random_walk`), deterministic per symbol.
//!
//! All builders go through `CandleSeries::new`, so the output is validated
//! like any other input.

use crate::domain::{Candle, CandleError, CandleSeries, OptionSide};
use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Wick added above and below every scripted candle body.
const SCRIPTED_WICK: f64 = 2.0;
/// Up leg of the oscillation in `breakout_ltf`, in the trend direction.
const SWING_WITH: f64 = 9.0;
/// Pullback leg of the oscillation in `breakout_ltf`.
const SWING_AGAINST: f64 = 8.0;
/// Body of the final breakout candle.
const BREAKOUT_BODY: f64 = 11.0;
/// LTF candles in the breakout scenario (even, so the candle before the
/// breakout is a pullback).
const BREAKOUT_LEN: usize = 60;

/// Evenly trending hourly candles ending at `end`.
///
/// Each candle opens at the previous close and moves `step`; wicks extend
/// `SCRIPTED_WICK` beyond the body. A positive step yields a confirmed CALL
/// trend on the default configuration once `n >= 50`.
pub fn trend_htf(
    end: DateTime<Utc>,
    n: usize,
    base: f64,
    step: f64,
) -> Result<CandleSeries, CandleError> {
    let start = end - Duration::hours(n.saturating_sub(1) as i64);
    let candles = (0..n)
        .map(|i| {
            let close = base + step * i as f64;
            let open = if i == 0 { close } else { close - step };
            scripted(start + Duration::hours(i as i64), open, close, 1_000.0)
        })
        .collect();
    CandleSeries::new(candles)
}

/// Five-minute candles ending at `end` with a breakout in the direction of
/// `side` on the last candle.
///
/// The series oscillates `SWING_WITH` / `SWING_AGAINST` with a slight drift
/// toward `side`, then a high-volume candle engulfs the last pullback and
/// closes one point beyond the swing extreme of the previous ten candles.
/// On the default configuration this produces a structure break entry,
/// RSI(14) ≈ 53.7 (CALL) / 46.3 (PUT), a body of 88% of the range and a
/// matching engulfing pattern.
pub fn breakout_ltf(
    end: DateTime<Utc>,
    base: f64,
    side: OptionSide,
) -> Result<CandleSeries, CandleError> {
    let dir = side.direction();
    let start = end - Duration::minutes(5 * (BREAKOUT_LEN as i64 - 1));
    let mut candles = Vec::with_capacity(BREAKOUT_LEN);
    let mut close = base;
    candles.push(scripted(start, base, base, 1_000.0));

    for i in 1..BREAKOUT_LEN - 1 {
        let delta = if i % 2 == 1 { SWING_WITH } else { -SWING_AGAINST };
        let open = close;
        close += delta * dir;
        candles.push(scripted(start + Duration::minutes(5 * i as i64), open, close, 1_000.0));
    }

    let open = close;
    let close = open + BREAKOUT_BODY * dir;
    let (high, low) = match side {
        OptionSide::Call => (close + 0.5, open - 1.0),
        OptionSide::Put => (open + 1.0, close - 0.5),
    };
    candles.push(Candle::new(end, open, high, low, close, 2_000.0));
    CandleSeries::new(candles)
}

/// Seeded random walk of `n` candles spaced `interval_minutes` apart.
///
/// The seed is the BLAKE3 hash of `symbol`, so the same symbol always
/// produces the same series.
pub fn random_walk(
    symbol: &str,
    start: DateTime<Utc>,
    n: usize,
    interval_minutes: i64,
    base: f64,
) -> Result<CandleSeries, CandleError> {
    let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let mut price = base;
    let mut candles = Vec::with_capacity(n);
    for i in 0..n {
        let ret: f64 = rng.gen_range(-0.004..0.004);
        let open = price;
        let close = price * (1.0 + ret);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.002));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.002));
        let volume = rng.gen_range(50_000.0..150_000.0);
        candles.push(Candle::new(
            start + Duration::minutes(interval_minutes * i as i64),
            open,
            high,
            low,
            close,
            volume,
        ));
        price = close;
    }
    CandleSeries::new(candles)
}

fn scripted(timestamp: DateTime<Utc>, open: f64, close: f64, volume: f64) -> Candle {
    Candle::new(
        timestamp,
        open,
        open.max(close) + SCRIPTED_WICK,
        open.min(close) - SCRIPTED_WICK,
        close,
        volume,
    )
}
