//! Daily risk limiter: a circuit breaker over the day's signals and trades.
//!
//! Pre-check (before every evaluation) rejects when:
//! - paused and the pause has not expired
//! - consecutive losses reached the pause threshold
//! - the day's realized loss reached `max_daily_loss`
//! - signals sent reached the daily signal limit
//! - trades taken reached the daily trade limit
//!
//! A pause expires on the wall clock after `pause_minutes`. Expiry reopens
//! the limiter and clears the loss streak; the day's counters stay, so a
//! daily loss past the cap keeps rejecting until the session is reset. A
//! session reset clears everything, including any pause.

use super::state::{DailySnapshot, DailyState, LimiterStatus, TradeOutcome};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_daily_signals: u32,
    pub max_trades_per_day: u32,
    /// Consecutive losing trades that pause trading.
    pub consecutive_loss_pause: u32,
    pub pause_minutes: u32,
    /// Pause once the day's realized loss reaches this amount.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_daily_loss: Option<f64>,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_daily_signals: 3,
            max_trades_per_day: 2,
            consecutive_loss_pause: 2,
            pause_minutes: 24 * 60,
            max_daily_loss: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LimiterRejection {
    #[error("trading paused: {reason}")]
    Paused { reason: String },

    #[error("consecutive losses limit ({limit})")]
    ConsecutiveLosses { limit: u32 },

    #[error("daily loss limit reached ({limit:.2})")]
    DailyLoss { limit: f64 },

    #[error("daily signal limit reached ({limit})")]
    SignalLimit { limit: u32 },

    #[error("daily trade limit reached ({limit})")]
    TradeLimit { limit: u32 },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum OutcomeError {
    #[error("trade P&L must be finite, got {0}")]
    NonFinitePnl(f64),
}

#[derive(Debug, Clone)]
pub struct DailyRiskLimiter {
    config: LimitsConfig,
}

impl DailyRiskLimiter {
    pub fn new(config: LimitsConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LimitsConfig {
        &self.config
    }

    /// Gate an evaluation. Lifts an expired pause as a side effect.
    pub fn pre_check(&self, state: &mut DailyState, now: DateTime<Utc>) -> Result<(), LimiterRejection> {
        if let LimiterStatus::Paused { reason, until } = &state.status {
            if now < *until {
                return Err(self.pause_cause(state, reason));
            }
            info!(reason = %reason, "trading pause expired");
            state.status = LimiterStatus::Open;
            state.consecutive_losses = 0;
        }

        let cfg = &self.config;
        if state.consecutive_losses >= cfg.consecutive_loss_pause {
            return Err(LimiterRejection::ConsecutiveLosses {
                limit: cfg.consecutive_loss_pause,
            });
        }
        if self.daily_loss_reached(state) {
            return Err(LimiterRejection::DailyLoss {
                limit: cfg.max_daily_loss.unwrap_or_default(),
            });
        }
        if state.signals_sent >= cfg.max_daily_signals {
            return Err(LimiterRejection::SignalLimit {
                limit: cfg.max_daily_signals,
            });
        }
        if state.trades_taken >= cfg.max_trades_per_day {
            return Err(LimiterRejection::TradeLimit {
                limit: cfg.max_trades_per_day,
            });
        }
        Ok(())
    }

    /// Rejection for an active pause, led by the condition that caused it
    /// while that condition still holds.
    fn pause_cause(&self, state: &DailyState, reason: &str) -> LimiterRejection {
        let cfg = &self.config;
        if state.consecutive_losses >= cfg.consecutive_loss_pause {
            LimiterRejection::ConsecutiveLosses {
                limit: cfg.consecutive_loss_pause,
            }
        } else if self.daily_loss_reached(state) {
            LimiterRejection::DailyLoss {
                limit: cfg.max_daily_loss.unwrap_or_default(),
            }
        } else {
            LimiterRejection::Paused {
                reason: reason.to_string(),
            }
        }
    }

    fn daily_loss_reached(&self, state: &DailyState) -> bool {
        self.config
            .max_daily_loss
            .is_some_and(|max_loss| state.daily_pnl <= -max_loss)
    }

    /// Count an emitted signal.
    pub fn record_signal(&self, state: &mut DailyState) {
        state.signals_sent += 1;
    }

    /// Apply a realized trade outcome. A zero P&L counts as a trade but
    /// neither a win nor a loss.
    pub fn record_outcome(
        &self,
        state: &mut DailyState,
        outcome: TradeOutcome,
        now: DateTime<Utc>,
    ) -> Result<(), OutcomeError> {
        if !outcome.pnl.is_finite() {
            return Err(OutcomeError::NonFinitePnl(outcome.pnl));
        }
        state.trades_taken += 1;
        state.daily_pnl += outcome.pnl;

        if outcome.is_win() {
            state.wins += 1;
            state.consecutive_losses = 0;
        } else if outcome.is_loss() {
            state.losses += 1;
            state.consecutive_losses += 1;
            if state.consecutive_losses >= self.config.consecutive_loss_pause {
                let reason = format!(
                    "consecutive losses limit ({})",
                    self.config.consecutive_loss_pause
                );
                self.pause(state, reason, now);
            }
        }

        if self.daily_loss_reached(state) && !state.is_paused() {
            self.pause(state, "daily loss limit".to_string(), now);
        }
        Ok(())
    }

    /// Pause until `now + pause_minutes`.
    pub fn pause(&self, state: &mut DailyState, reason: String, now: DateTime<Utc>) {
        let until = now + Duration::minutes(i64::from(self.config.pause_minutes));
        warn!(reason = %reason, %until, "trading paused");
        state.status = LimiterStatus::Paused { reason, until };
    }

    /// Start a new session: all counters zeroed, any pause cleared.
    pub fn reset_session(&self, state: &mut DailyState, date: NaiveDate) {
        info!(%date, "daily session reset");
        *state = DailyState::new(date);
    }

    pub fn snapshot(&self, state: &DailyState) -> DailySnapshot {
        DailySnapshot {
            session_date: state.session_date,
            trades_taken: state.trades_taken,
            signals_sent: state.signals_sent,
            signals_remaining: self.config.max_daily_signals.saturating_sub(state.signals_sent),
            daily_pnl: state.daily_pnl,
            consecutive_losses: state.consecutive_losses,
            wins: state.wins,
            losses: state.losses,
            win_rate: state.win_rate(),
            is_paused: state.is_paused(),
            pause_reason: state.pause_reason().map(str::to_string),
            paused_until: state.paused_until(),
        }
    }
}
