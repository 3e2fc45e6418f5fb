//! Quality gate: three independent, all-required checks on the entry candle.
//!
//! Each rule produces a `CheckResult` carrying its verdict, a reason and a
//! snapshot of the measurements it looked at. The gate ANDs them and lists
//! the names of every failed rule, so a rejection is always explainable.

pub mod candle_check;
pub mod rsi_check;
pub mod time_window;

use crate::domain::{Candle, OptionSide};
use chrono::{DateTime, FixedOffset, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

pub use candle_check::CandleQualityRule;
pub use rsi_check::{RsiBand, RsiRule};
pub use time_window::TimeWindowRule;

/// Everything a rule may look at.
#[derive(Debug, Clone, Copy)]
pub struct QualityInput<'a> {
    pub candles: &'a [Candle],
    pub side: OptionSide,
    /// Market-local wall clock.
    pub local_time: NaiveTime,
}

/// A single quality rule.
///
/// Rules look at market data and the clock only; they never see limiter or
/// sizing state.
pub trait QualityRule: Send + Sync {
    fn check(&self) -> QualityCheck;

    fn evaluate(&self, input: &QualityInput<'_>) -> CheckResult;
}

/// Names of the quality rules, as reported in `failed_checks`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum QualityCheck {
    #[serde(rename = "RSI")]
    Rsi,
    #[serde(rename = "Candle Quality")]
    CandleQuality,
    #[serde(rename = "Time Window")]
    TimeWindow,
}

impl fmt::Display for QualityCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            QualityCheck::Rsi => "RSI",
            QualityCheck::CandleQuality => "Candle Quality",
            QualityCheck::TimeWindow => "Time Window",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub check: QualityCheck,
    pub passed: bool,
    pub reason: String,
    /// Measurements at evaluation time (e.g. "rsi", "body_percent").
    pub measurements: BTreeMap<String, f64>,
}

impl CheckResult {
    pub fn pass(check: QualityCheck, reason: impl Into<String>) -> Self {
        Self {
            check,
            passed: true,
            reason: reason.into(),
            measurements: BTreeMap::new(),
        }
    }

    pub fn fail(check: QualityCheck, reason: impl Into<String>) -> Self {
        Self {
            check,
            passed: false,
            reason: reason.into(),
            measurements: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: &str, value: f64) -> Self {
        self.measurements.insert(key.to_string(), value);
        self
    }

    pub fn measurement(&self, key: &str) -> Option<f64> {
        self.measurements.get(key).copied()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    pub rsi_period: usize,
    pub call_rsi_band: RsiBand,
    pub put_rsi_band: RsiBand,
    /// Minimum body / range.
    pub min_body_percent: f64,
    /// Maximum opposing wick / body.
    pub max_wick_ratio: f64,
    pub session_start: NaiveTime,
    pub session_end: NaiveTime,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            call_rsi_band: RsiBand::new(45.0, 60.0),
            put_rsi_band: RsiBand::new(40.0, 55.0),
            min_body_percent: 0.6,
            max_wick_ratio: 0.3,
            session_start: NaiveTime::from_hms_opt(9, 20, 0).unwrap_or_default(),
            session_end: NaiveTime::from_hms_opt(11, 30, 0).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityVerdict {
    pub rsi_value: Option<f64>,
    pub body_percent: Option<f64>,
    pub wick_ratio: Option<f64>,
    pub time_ok: bool,
    pub passed: bool,
    pub failed_checks: Vec<QualityCheck>,
    pub checks: Vec<CheckResult>,
}

impl QualityVerdict {
    /// "RSI: ...; Time Window: ..." for every failed rule.
    pub fn failure_summary(&self) -> String {
        self.checks
            .iter()
            .filter(|c| !c.passed)
            .map(|c| format!("{}: {}", c.check, c.reason))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

pub struct QualityGate {
    rules: Vec<Box<dyn QualityRule>>,
    offset: FixedOffset,
}

impl QualityGate {
    /// Build the standard three-rule gate. `offset` converts UTC to market time.
    pub fn new(config: &QualityConfig, offset: FixedOffset) -> Self {
        let rules: Vec<Box<dyn QualityRule>> = vec![
            Box::new(RsiRule::new(
                config.rsi_period,
                config.call_rsi_band,
                config.put_rsi_band,
            )),
            Box::new(CandleQualityRule::new(
                config.min_body_percent,
                config.max_wick_ratio,
            )),
            Box::new(TimeWindowRule::new(config.session_start, config.session_end)),
        ];
        Self { rules, offset }
    }

    pub fn evaluate(&self, candles: &[Candle], side: OptionSide, now: DateTime<Utc>) -> QualityVerdict {
        let input = QualityInput {
            candles,
            side,
            local_time: now.with_timezone(&self.offset).time(),
        };
        let checks: Vec<CheckResult> = self.rules.iter().map(|r| r.evaluate(&input)).collect();

        let find = |check: QualityCheck| checks.iter().find(|c| c.check == check);
        let failed_checks: Vec<QualityCheck> =
            checks.iter().filter(|c| !c.passed).map(|c| c.check).collect();

        let verdict = QualityVerdict {
            rsi_value: find(QualityCheck::Rsi).and_then(|c| c.measurement("rsi")),
            body_percent: find(QualityCheck::CandleQuality)
                .and_then(|c| c.measurement("body_percent")),
            wick_ratio: find(QualityCheck::CandleQuality).and_then(|c| c.measurement("wick_ratio")),
            time_ok: find(QualityCheck::TimeWindow).is_some_and(|c| c.passed),
            passed: failed_checks.is_empty(),
            failed_checks,
            checks,
        };
        debug!(
            passed = verdict.passed,
            failed = ?verdict.failed_checks,
            rsi = ?verdict.rsi_value,
            "quality gate evaluated"
        );
        verdict
    }
}
