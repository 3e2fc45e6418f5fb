use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Limiter state machine: open, or paused with a reason until an instant.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LimiterStatus {
    #[default]
    Open,
    Paused {
        reason: String,
        until: DateTime<Utc>,
    },
}

/// Per-session counters. Serializable so callers can persist it between runs.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DailyState {
    pub session_date: Option<NaiveDate>,
    pub trades_taken: u32,
    pub signals_sent: u32,
    pub daily_pnl: f64,
    pub consecutive_losses: u32,
    pub wins: u32,
    pub losses: u32,
    pub status: LimiterStatus,
}

impl DailyState {
    /// Fresh state for a trading session.
    pub fn new(session_date: NaiveDate) -> Self {
        Self {
            session_date: Some(session_date),
            ..Self::default()
        }
    }

    pub fn is_paused(&self) -> bool {
        matches!(self.status, LimiterStatus::Paused { .. })
    }

    pub fn pause_reason(&self) -> Option<&str> {
        match &self.status {
            LimiterStatus::Open => None,
            LimiterStatus::Paused { reason, .. } => Some(reason),
        }
    }

    pub fn paused_until(&self) -> Option<DateTime<Utc>> {
        match &self.status {
            LimiterStatus::Open => None,
            LimiterStatus::Paused { until, .. } => Some(*until),
        }
    }

    /// Fraction of closed trades that were wins; `None` before any win or loss.
    pub fn win_rate(&self) -> Option<f64> {
        let decided = self.wins + self.losses;
        (decided > 0).then(|| f64::from(self.wins) / f64::from(decided))
    }
}

/// Realized result of a trade that came from a signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradeOutcome {
    pub pnl: f64,
}

impl TradeOutcome {
    pub fn new(pnl: f64) -> Self {
        Self { pnl }
    }

    pub fn is_win(&self) -> bool {
        self.pnl > 0.0
    }

    pub fn is_loss(&self) -> bool {
        self.pnl < 0.0
    }
}

/// Read-only view of the day for reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySnapshot {
    pub session_date: Option<NaiveDate>,
    pub trades_taken: u32,
    pub signals_sent: u32,
    pub signals_remaining: u32,
    pub daily_pnl: f64,
    pub consecutive_losses: u32,
    pub wins: u32,
    pub losses: u32,
    pub win_rate: Option<f64>,
    pub is_paused: bool,
    pub pause_reason: Option<String>,
    pub paused_until: Option<DateTime<Utc>>,
}
