//! Property tests for pipeline invariants.
//!
//! Uses proptest to verify:
//! 1. Trend: a steady HTF ramp is a confirmed bias with strength >= 30
//! 2. Trend: separation inside the threshold short-circuits at the trend stage
//! 3. Sizing: premium bounds are exact and per-unit RR equals min_rr
//! 4. Confluence: identical snapshots score identically, within [0, max]
//! 5. Candles: inconsistent OHLC never enters a series

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use proptest::prelude::*;
use trendgate_core::components::{
    ConfluenceConfig, ConfluenceScorer, IndicatorSnapshot, TrendClassifier, TrendConfig,
};
use trendgate_core::config::SignalConfig;
use trendgate_core::domain::{Bias, Candle, CandleError, CandleSeries, OptionSide};
use trendgate_core::engine::{EvaluationRequest, SignalOrchestrator, Stage};
use trendgate_core::premium::StaticQuotes;
use trendgate_core::risk::DailyState;
use trendgate_core::sizers::{
    PremiumRiskSizer, Sizer, SizingConfig, SizingRejection, SizingRequest,
};
use trendgate_core::synthetic::{breakout_ltf, random_walk, trend_htf};

fn end() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 4, 30, 0).unwrap()
}

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_base() -> impl Strategy<Value = f64> {
    1_000.0..50_000.0_f64
}

fn arb_side() -> impl Strategy<Value = OptionSide> {
    prop_oneof![Just(OptionSide::Call), Just(OptionSide::Put)]
}

// ── 1. Ramp trends are confirmed ─────────────────────────────────────

proptest! {
    /// A ramp moving 0.05%..0.5% of price per bar separates the EMAs well
    /// beyond 0.2% and every recent bar agrees.
    #[test]
    fn ramp_is_confirmed(
        base in arb_base(),
        frac in 0.0005..0.005_f64,
        side in arb_side(),
    ) {
        let step = base * frac * side.direction();
        let htf = trend_htf(end(), 80, base, step).unwrap();
        let t = TrendClassifier::new(TrendConfig::default()).classify(htf.candles());
        prop_assert_eq!(t.bias, side.bias());
        prop_assert!(t.valid, "{}", t.reason);
        prop_assert!(t.strength >= 30.0 && t.strength <= 100.0);
    }
}

// ── 2. Near-flat trends stop the pipeline ────────────────────────────

proptest! {
    #[test]
    fn near_flat_htf_short_circuits(
        base in 10_000.0..30_000.0_f64,
        frac in -0.00001..0.00001_f64,
    ) {
        let htf = trend_htf(end(), 80, base, base * frac).unwrap();
        let t = TrendClassifier::new(TrendConfig::default()).classify(htf.candles());
        prop_assert_eq!(t.bias, Bias::NoTrade);

        let ltf = breakout_ltf(end(), 23_100.0, OptionSide::Call).unwrap();
        let orch = SignalOrchestrator::new(SignalConfig::default()).unwrap();
        let mut state = DailyState::new(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        let request = EvaluationRequest {
            instrument: "NIFTY",
            htf: &htf,
            ltf: &ltf,
            spot: None,
            capital: 1_000_000.0,
            now: end(),
        };
        let decision = orch.evaluate(&request, &mut state, &StaticQuotes::new()).unwrap();
        prop_assert_eq!(decision.stage(), Some(Stage::Trend));
        prop_assert_eq!(state.signals_sent, 0);
    }
}

// ── 3. Sizing bounds and ratio ───────────────────────────────────────

fn sizer() -> PremiumRiskSizer {
    PremiumRiskSizer::new(SizingConfig::default())
}

fn request(premium: f64) -> SizingRequest {
    SizingRequest {
        premium,
        lot_size: 50,
        capital: 1_000_000_000.0,
    }
}

#[test]
fn premium_bounds_are_exact() {
    let cfg = SizingConfig::default();
    assert!(matches!(
        sizer().plan(&request(cfg.min_premium - 0.01)),
        Err(SizingRejection::PremiumBelowMinimum { .. })
    ));
    assert!(matches!(
        sizer().plan(&request(cfg.max_premium + 0.01)),
        Err(SizingRejection::PremiumAboveMaximum { .. })
    ));
    assert!(sizer().plan(&request(cfg.min_premium)).is_ok());
    assert!(sizer().plan(&request(cfg.max_premium)).is_ok());
}

proptest! {
    #[test]
    fn accepted_plans_keep_min_rr(
        premium in 10.0..=400.0_f64,
        capital in 50_000.0..50_000_000.0_f64,
        lot_size in 1u32..200,
    ) {
        let cfg = SizingConfig::default();
        match sizer().plan(&SizingRequest { premium, lot_size, capital }) {
            Ok(plan) => {
                prop_assert!(plan.lots >= 1 && plan.lots <= cfg.max_lots);
                prop_assert!((plan.risk_reward - cfg.min_rr).abs() < 1e-9);
                prop_assert!((plan.realized_risk_reward - cfg.min_rr).abs() < 1e-9);
                prop_assert!(plan.stop_loss < plan.entry && plan.entry < plan.target);
                prop_assert!(plan.risk_amount <= capital * cfg.risk_fraction + 1e-3);
            }
            Err(SizingRejection::PositionTooSmall { raw_lots }) => {
                prop_assert!(raw_lots < 1.0);
            }
            Err(other) => prop_assert!(false, "unexpected rejection {other}"),
        }
    }
}

// ── 4. Confluence determinism ────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn confluence_is_deterministic(symbol in "[A-Z]{3,9}", side in arb_side()) {
        let start = end() - Duration::days(10);
        let htf = random_walk(&symbol, start, 120, 60, 20_000.0).unwrap();
        let ltf = random_walk(&format!("{symbol}-5m"), start, 120, 5, 20_000.0).unwrap();
        let cfg = ConfluenceConfig::default();
        let scorer = ConfluenceScorer::new(cfg.clone());

        let a = scorer.score(&IndicatorSnapshot::capture(htf.candles(), ltf.candles(), &cfg), side);
        let b = scorer.score(&IndicatorSnapshot::capture(htf.candles(), ltf.candles(), &cfg), side);
        prop_assert_eq!(&a, &b);
        prop_assert!(a.value >= 0.0 && a.value <= cfg.max_score);
        prop_assert!(a.value <= a.raw + 1e-12);
    }
}

// ── 5. Candle validation ─────────────────────────────────────────────

proptest! {
    #[test]
    fn low_above_body_is_rejected(
        open in 100.0..200.0_f64,
        close in 100.0..200.0_f64,
        excess in 0.01..10.0_f64,
    ) {
        let low = open.min(close) + excess;
        let high = open.max(close) + excess + 1.0;
        let candle = Candle::new(end(), open, high, low, close, 10.0);
        let err = CandleSeries::new(vec![candle]).unwrap_err();
        let is_ohlc = matches!(err, CandleError::InconsistentOhlc { .. });
        prop_assert!(is_ohlc);
    }

    #[test]
    fn consistent_candles_are_accepted(
        open in 100.0..200.0_f64,
        close in 100.0..200.0_f64,
        up in 0.0..5.0_f64,
        down in 0.0..5.0_f64,
        volume in 0.0..1e6_f64,
    ) {
        let candle = Candle::new(
            end(),
            open,
            open.max(close) + up,
            open.min(close) - down,
            close,
            volume,
        );
        prop_assert!(CandleSeries::new(vec![candle]).is_ok());
    }
}
