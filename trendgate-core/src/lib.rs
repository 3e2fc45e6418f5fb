//! Trendgate Core: a multi-timeframe options signal pipeline.
//!
//! This crate turns two candle series (a higher timeframe for trend, a lower
//! timeframe for entries) into a single trade decision:
//! - Domain types (candles, bias, instruments, signal identifiers)
//! - Indicators (EMA, SMA, RSI, ATR, ADX, Bollinger, MACD, volume, patterns)
//! - Pipeline stages (trend, entry, quality gate, confluence score)
//! - Premium lookup, liquidity gate and premium-risk position sizing
//! - Daily risk limiter with pause and session reset
//! - The orchestrator and a lock-guarded trading session

pub mod components;
pub mod config;
pub mod data;
pub mod domain;
pub mod engine;
pub mod indicators;
pub mod premium;
pub mod risk;
pub mod session;
pub mod sizers;
pub mod synthetic;

pub use config::{ConfigError, SignalConfig};
pub use engine::{Decision, EvaluationRequest, PipelineError, Signal, SignalOrchestrator};
pub use session::TradingSession;
