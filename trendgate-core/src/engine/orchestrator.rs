//! Signal orchestrator: one total decision function over the stages.
//!
//! Order of evaluation:
//! 1. Daily limits pre-check
//! 2. HTF trend classification
//! 3. LTF entry detection
//! 4. Quality gate
//! 5. Confluence score threshold
//! 6. Strike selection and premium lookup (plus optional liquidity gate)
//! 7. Position sizing
//! 8. Signal assembly, then the limits are checked again and the signal
//!    counter is bumped
//!
//! The first rejecting stage ends the evaluation with a `NoSignal`. Only
//! malformed caller inputs (capital, spot, unknown instrument) are errors.
//!
//! Stages 2 to 8 are pure (`run_stages`); only `check_limits` and `commit`
//! touch the daily state, so a caller holding that state behind a lock can
//! run the stages outside it.

use super::decision::{Decision, NoSignal, Signal, SignalReasons, Stage};
use crate::components::{
    ConfluenceScorer, EntryDetector, IndicatorSnapshot, QualityGate, TrendClassifier,
};
use crate::config::{ConfigError, SignalConfig};
use crate::domain::{Candle, CandleSeries, ConfigHash, Instrument, SignalId};
use crate::premium::PremiumSource;
use crate::risk::{DailyRiskLimiter, DailySnapshot, DailyState, OutcomeError, TradeOutcome};
use crate::sizers::{PremiumRiskSizer, Sizer, SizingRequest};
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use thiserror::Error;
use tracing::info;

/// Inputs to one evaluation. Candles are supplied by the caller.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationRequest<'a> {
    pub instrument: &'a str,
    pub htf: &'a CandleSeries,
    pub ltf: &'a CandleSeries,
    /// Underlying price for strike selection; the last LTF close when `None`.
    pub spot: Option<f64>,
    pub capital: f64,
    pub now: DateTime<Utc>,
}

/// Hard errors: the caller handed the pipeline something malformed.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("unknown instrument '{0}'")]
    UnknownInstrument(String),

    #[error("capital must be finite and positive, got {0}")]
    InvalidCapital(f64),

    #[error("spot must be finite and positive, got {0}")]
    InvalidSpot(f64),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Outcome(#[from] OutcomeError),
}

pub struct SignalOrchestrator {
    config: SignalConfig,
    config_hash: ConfigHash,
    offset: FixedOffset,
    trend: TrendClassifier,
    entry: EntryDetector,
    quality: QualityGate,
    confluence: ConfluenceScorer,
    sizer: PremiumRiskSizer,
    limiter: DailyRiskLimiter,
}

impl SignalOrchestrator {
    /// Validate the configuration once and build every stage from it.
    pub fn new(config: SignalConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let offset = config.market.offset()?;
        let config_hash = config.config_hash()?;
        info!(config_hash = config_hash.short(), "signal orchestrator ready");
        Ok(Self {
            trend: TrendClassifier::new(config.trend.clone()),
            entry: EntryDetector::new(config.entry.clone()),
            quality: QualityGate::new(&config.quality, offset),
            confluence: ConfluenceScorer::new(config.confluence.clone()),
            sizer: PremiumRiskSizer::new(config.sizing.clone()),
            limiter: DailyRiskLimiter::new(config.limits.clone()),
            config_hash,
            offset,
            config,
        })
    }

    pub fn config(&self) -> &SignalConfig {
        &self.config
    }

    pub fn config_hash(&self) -> &ConfigHash {
        &self.config_hash
    }

    pub fn limiter(&self) -> &DailyRiskLimiter {
        &self.limiter
    }

    /// Market-local date of an instant; the session key.
    pub fn session_date(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.offset).date_naive()
    }

    /// Run the pipeline once. `state` is checked first and, on a signal,
    /// updated before returning.
    pub fn evaluate(
        &self,
        request: &EvaluationRequest<'_>,
        state: &mut DailyState,
        premiums: &dyn PremiumSource,
    ) -> Result<Decision, PipelineError> {
        if let Some(gated) = self.check_limits(request, state)? {
            return Ok(gated);
        }
        let decision = self.run_stages(request, premiums)?;
        Ok(self.commit(decision, state, request.now))
    }

    /// Validate the request and run the limiter pre-check. `Some` is the
    /// daily-limits rejection.
    pub fn check_limits(
        &self,
        request: &EvaluationRequest<'_>,
        state: &mut DailyState,
    ) -> Result<Option<Decision>, PipelineError> {
        let instrument = self.validate(request)?;
        match self.limiter.pre_check(state, request.now) {
            Ok(()) => Ok(None),
            Err(rejection) => Ok(Some(self.no_signal(NoSignal {
                instrument: instrument.symbol.clone(),
                stage: Stage::DailyLimits,
                reason: rejection.to_string(),
                evaluated_at: request.now,
            }))),
        }
    }

    /// Trend through assembly, without reading or writing the daily state.
    /// A signal returned here is not counted until it goes through `commit`.
    pub fn run_stages(
        &self,
        request: &EvaluationRequest<'_>,
        premiums: &dyn PremiumSource,
    ) -> Result<Decision, PipelineError> {
        let instrument = self.validate(request)?;

        let reject = |stage: Stage, reason: String| NoSignal {
            instrument: instrument.symbol.clone(),
            stage,
            reason,
            evaluated_at: request.now,
        };

        let htf = tail(request.htf.candles(), self.config.market.htf_max_candles);
        let ltf = tail(request.ltf.candles(), self.config.market.ltf_max_candles);

        // Trend
        let trend = self.trend.classify(htf);
        let side = match (trend.valid, trend.bias.side()) {
            (true, Some(side)) => side,
            _ => return Ok(self.no_signal(reject(Stage::Trend, trend.reason))),
        };

        // Entry
        let min_ltf = self.entry.min_candles();
        if ltf.len() < min_ltf {
            let reason = format!("insufficient data: {} candles, need {min_ltf}", ltf.len());
            return Ok(self.no_signal(reject(Stage::Entry, reason)));
        }
        let Some(entry) = self.entry.detect(ltf, trend.bias) else {
            let reason = format!("no {side} entry pattern on latest candle");
            return Ok(self.no_signal(reject(Stage::Entry, reason)));
        };

        // Quality
        let quality = self.quality.evaluate(ltf, side, request.now);
        if !quality.passed {
            return Ok(self.no_signal(reject(Stage::Quality, quality.failure_summary())));
        }

        // Confluence
        let snapshot = IndicatorSnapshot::capture(htf, ltf, self.confluence.config());
        let score = self.confluence.score(&snapshot, side);
        if !self.confluence.passes(&score) {
            let reason = format!(
                "confluence score {:.1} below minimum {:.1}",
                score.value,
                self.confluence.min_score()
            );
            return Ok(self.no_signal(reject(Stage::Confluence, reason)));
        }

        // Premium
        let spot = request.spot.unwrap_or(entry.entry_price);
        let strike = instrument.atm_strike(spot);
        let Some(quote) = premiums.quote(&instrument.symbol, strike, side) else {
            let reason = format!("no quote for {} {strike:.0} {side}", instrument.symbol);
            return Ok(self.no_signal(reject(Stage::Premium, reason)));
        };
        if let Err(rejection) = self.config.liquidity.check(&quote) {
            return Ok(self.no_signal(reject(Stage::Premium, rejection.to_string())));
        }

        // Sizing
        let plan = match self.sizer.plan(&SizingRequest {
            premium: quote.premium,
            lot_size: instrument.lot_size,
            capital: request.capital,
        }) {
            Ok(plan) => plan,
            Err(rejection) => {
                return Ok(self.no_signal(reject(Stage::Sizing, rejection.to_string())))
            }
        };

        // Assembly
        let trigger = ltf.last().map(|c| c.timestamp).unwrap_or(request.now);
        let local_now = request.now.with_timezone(&self.offset).naive_local();
        let id = SignalId::derive(
            &self.config_hash,
            &instrument.symbol,
            &trigger.to_rfc3339(),
            &side.to_string(),
            strike,
        );
        let confirmation = format!(
            "RSI {:.1}, body {:.0}% of range, confluence {:.1}/10: {}",
            quality.rsi_value.unwrap_or(f64::NAN),
            quality.body_percent.unwrap_or(f64::NAN) * 100.0,
            score.value,
            score.describe()
        );
        let signal = Signal {
            id,
            instrument: instrument.symbol.clone(),
            timestamp: trigger,
            generated_at: request.now,
            bias: trend.bias,
            side,
            spot,
            strike,
            expiry: instrument.next_expiry(local_now),
            quote,
            trend_strength: trend.strength,
            reasons: SignalReasons {
                trend: trend.reason,
                entry: entry.describe(),
                confirmation,
            },
            entry,
            quality,
            confluence: score,
            plan,
            config_hash: self.config_hash.clone(),
        };

        Ok(Decision::Signal(Box::new(signal)))
    }

    /// Count a signal against the day. The limiter is checked again, so a
    /// signal assessed while other evaluations ran cannot overshoot a limit.
    /// Rejections pass through unchanged.
    pub fn commit(&self, decision: Decision, state: &mut DailyState, now: DateTime<Utc>) -> Decision {
        let Decision::Signal(signal) = decision else {
            return decision;
        };
        if let Err(rejection) = self.limiter.pre_check(state, now) {
            return self.no_signal(NoSignal {
                instrument: signal.instrument.clone(),
                stage: Stage::DailyLimits,
                reason: rejection.to_string(),
                evaluated_at: now,
            });
        }

        self.limiter.record_signal(state);
        info!(
            id = %signal.id,
            instrument = %signal.instrument,
            side = %signal.side,
            strike = signal.strike,
            lots = signal.plan.lots,
            score = signal.confluence.value,
            signals_sent = state.signals_sent,
            "signal generated"
        );
        Decision::Signal(signal)
    }

    pub fn record_outcome(
        &self,
        state: &mut DailyState,
        outcome: TradeOutcome,
        now: DateTime<Utc>,
    ) -> Result<(), PipelineError> {
        self.limiter.record_outcome(state, outcome, now)?;
        Ok(())
    }

    pub fn reset_session(&self, state: &mut DailyState, date: NaiveDate) {
        self.limiter.reset_session(state, date);
    }

    pub fn snapshot(&self, state: &DailyState) -> DailySnapshot {
        self.limiter.snapshot(state)
    }

    fn validate(&self, request: &EvaluationRequest<'_>) -> Result<&Instrument, PipelineError> {
        if !(request.capital.is_finite() && request.capital > 0.0) {
            return Err(PipelineError::InvalidCapital(request.capital));
        }
        if let Some(spot) = request.spot {
            if !(spot.is_finite() && spot > 0.0) {
                return Err(PipelineError::InvalidSpot(spot));
            }
        }
        self.config
            .instrument(request.instrument)
            .ok_or_else(|| PipelineError::UnknownInstrument(request.instrument.to_string()))
    }

    fn no_signal(&self, rejection: NoSignal) -> Decision {
        info!(
            instrument = %rejection.instrument,
            stage = %rejection.stage,
            reason = %rejection.reason,
            "no signal"
        );
        Decision::NoSignal(rejection)
    }
}

/// The trailing `max_len` candles.
fn tail(candles: &[Candle], max_len: usize) -> &[Candle] {
    &candles[candles.len().saturating_sub(max_len)..]
}
