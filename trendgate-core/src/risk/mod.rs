//! Account-level daily risk control.
//!
//! `DailyState` is a plain value owned by whoever runs the session; the
//! `DailyRiskLimiter` holds only configuration and mutates the state it is
//! handed. The pair is serialized into one critical section by
//! `crate::session::TradingSession`.

pub mod limiter;
pub mod state;

pub use limiter::{DailyRiskLimiter, LimiterRejection, LimitsConfig, OutcomeError};
pub use state::{DailySnapshot, DailyState, LimiterStatus, TradeOutcome};
