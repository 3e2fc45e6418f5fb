//! Criterion benchmarks for the signal pipeline.
//!
//! Benchmarks:
//! 1. Indicator stack over LTF-sized series
//! 2. Full evaluation on the breakout scenario (signal path)
//! 3. Full evaluation on random walks (mostly early rejections)
//! 4. Confluence scoring from a captured snapshot

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use trendgate_core::components::{ConfluenceConfig, ConfluenceScorer, Indicator, IndicatorSnapshot};
use trendgate_core::config::SignalConfig;
use trendgate_core::domain::{Instrument, OptionSide};
use trendgate_core::engine::{EvaluationRequest, SignalOrchestrator};
use trendgate_core::indicators::{
    Adx, Atr, Bollinger, BollingerBand, Ema, Macd, MacdLine, Rsi, Sma,
};
use trendgate_core::premium::{Quote, StaticQuotes};
use trendgate_core::risk::DailyState;
use trendgate_core::synthetic::{breakout_ltf, random_walk, trend_htf};

// ── Helpers ──────────────────────────────────────────────────────────

fn end() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 4, 30, 0).unwrap()
}

fn session_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
}

// ── 1. Indicator Stack ───────────────────────────────────────────────

fn bench_indicators(c: &mut Criterion) {
    let mut group = c.benchmark_group("indicators");

    for &count in &[60, 200, 1000] {
        let series = random_walk("BENCH", end() - Duration::days(5), count, 5, 22_000.0).unwrap();
        let stack: Vec<Box<dyn Indicator>> = vec![
            Box::new(Ema::new(9)),
            Box::new(Ema::new(20)),
            Box::new(Ema::new(50)),
            Box::new(Sma::new(20)),
            Box::new(Rsi::new(14)),
            Box::new(Atr::new(14)),
            Box::new(Adx::new(14)),
            Box::new(Macd::new(12, 26, 9, MacdLine::Histogram)),
            Box::new(Bollinger::new(20, 2.0, BollingerBand::Middle)),
        ];
        group.bench_with_input(BenchmarkId::new("full_stack_9", count), &count, |b, _| {
            b.iter(|| {
                stack
                    .iter()
                    .map(|ind| ind.compute(black_box(series.candles())))
                    .collect::<Vec<_>>()
            });
        });
    }

    group.finish();
}

// ── 2. Signal Path ───────────────────────────────────────────────────

fn bench_signal_path(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate");

    let htf = trend_htf(end(), 200, 22_000.0, 15.0).unwrap();
    let ltf = breakout_ltf(end(), 23_100.0, OptionSide::Call).unwrap();
    let strike = Instrument::nifty().atm_strike(ltf.last().unwrap().close);
    let quotes = StaticQuotes::new().with("NIFTY", strike, OptionSide::Call, Quote::premium(120.0));
    let orch = SignalOrchestrator::new(SignalConfig::default()).unwrap();
    let request = EvaluationRequest {
        instrument: "NIFTY",
        htf: &htf,
        ltf: &ltf,
        spot: None,
        capital: 1_000_000.0,
        now: end(),
    };

    group.bench_function("breakout_signal", |b| {
        b.iter(|| {
            let mut state = DailyState::new(session_date());
            orch.evaluate(black_box(&request), &mut state, &quotes)
        });
    });

    // ── 3. Random Walks ──────────────────────────────────────────────

    for symbol in ["NIFTY", "BANKNIFTY"] {
        let htf = random_walk(symbol, end() - Duration::days(10), 200, 60, 22_000.0).unwrap();
        let ltf = random_walk(symbol, end() - Duration::hours(16), 200, 5, 22_000.0).unwrap();
        let request = EvaluationRequest {
            instrument: symbol,
            htf: &htf,
            ltf: &ltf,
            spot: None,
            capital: 1_000_000.0,
            now: end(),
        };
        group.bench_with_input(BenchmarkId::new("random_walk", symbol), &symbol, |b, _| {
            b.iter(|| {
                let mut state = DailyState::new(session_date());
                orch.evaluate(black_box(&request), &mut state, &quotes)
            });
        });
    }

    group.finish();
}

// ── 4. Confluence ────────────────────────────────────────────────────

fn bench_confluence(c: &mut Criterion) {
    let mut group = c.benchmark_group("confluence");

    let htf = trend_htf(end(), 200, 22_000.0, 15.0).unwrap();
    let ltf = breakout_ltf(end(), 23_100.0, OptionSide::Call).unwrap();
    let cfg = ConfluenceConfig::default();
    let scorer = ConfluenceScorer::new(cfg.clone());

    group.bench_function("capture_snapshot", |b| {
        b.iter(|| IndicatorSnapshot::capture(black_box(htf.candles()), black_box(ltf.candles()), &cfg));
    });

    let snapshot = IndicatorSnapshot::capture(htf.candles(), ltf.candles(), &cfg);
    group.bench_function("score", |b| {
        b.iter(|| scorer.score(black_box(&snapshot), OptionSide::Call));
    });

    group.finish();
}

criterion_group!(benches, bench_indicators, bench_signal_path, bench_confluence);
criterion_main!(benches);
