//! Position sizers: turn a premium and a risk budget into a lot count with
//! stop, target and a take-profit ladder.
//!
//! Sizers are pure and signal-agnostic: they never look at candles, the
//! confluence score or the limiter.

pub mod premium_risk;

pub use premium_risk::{
    PositionPlan, PremiumRiskSizer, SizingConfig, SizingRejection, TakeProfitLevel, TakeProfitStep,
};

/// Inputs to one sizing decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizingRequest {
    /// Option premium per unit.
    pub premium: f64,
    /// Units per lot.
    pub lot_size: u32,
    /// Tradable capital.
    pub capital: f64,
}

/// Position sizing logic
///
/// # Responsibilities
/// - Convert premium + capital + lot size → whole lots
/// - Apply risk management (risk fraction of capital per trade)
/// - Respect premium bounds and the lot cap
///
/// # Non-Responsibilities
/// - Sizers do NOT decide whether to trade (the earlier stages do)
/// - Sizers do NOT pick the strike (the orchestrator does)
pub trait Sizer: Send + Sync {
    fn plan(&self, request: &SizingRequest) -> Result<PositionPlan, SizingRejection>;

    /// Sizer name for logging.
    fn name(&self) -> &str;
}
