//! Premium-risk sizer.
//!
//! ```text
//! stop_loss     = premium * (1 - sl_percent)
//! risk_per_unit = premium - stop_loss
//! budget        = capital * risk_fraction
//! raw_lots      = budget / (risk_per_unit * lot_size)
//! lots          = min(floor(raw_lots), max_lots), rejected when < 1
//! target        = premium + risk_per_unit * min_rr
//! ```
//!
//! Per-unit risk:reward is `min_rr` by construction. Flooring changes the size,
//! never the ratio, so realized totals carry the same ratio.
//!
//! # Example
//! - Premium 100, lot size 50, capital 1,000,000, risk 1%, stop 30%, min RR 1.5
//! - Risk per unit 30, budget 10,000, raw lots 6.67 → 6 lots
//! - Stop 70, target 145, risk 9,000, reward 13,500

use super::{Sizer, SizingRequest};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Absorbs float error so exact integer ratios are not floored one lot short.
const LOT_EPSILON: f64 = 1e-9;

/// One rung of the take-profit ladder, in multiples of risk.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TakeProfitStep {
    pub r_multiple: f64,
    /// Share of the position closed at this level.
    pub fraction: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizingConfig {
    pub risk_fraction: f64,
    pub sl_percent: f64,
    pub min_rr: f64,
    pub min_premium: f64,
    pub max_premium: f64,
    pub max_lots: u32,
    pub take_profits: Vec<TakeProfitStep>,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            risk_fraction: 0.01,
            sl_percent: 0.30,
            min_rr: 2.0,
            min_premium: 10.0,
            max_premium: 400.0,
            max_lots: 10,
            take_profits: vec![
                TakeProfitStep {
                    r_multiple: 2.0,
                    fraction: 0.5,
                },
                TakeProfitStep {
                    r_multiple: 3.0,
                    fraction: 0.3,
                },
                TakeProfitStep {
                    r_multiple: 4.0,
                    fraction: 0.2,
                },
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TakeProfitLevel {
    pub r_multiple: f64,
    pub price: f64,
    pub fraction: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionPlan {
    pub lots: u32,
    pub lot_size: u32,
    pub entry: f64,
    pub stop_loss: f64,
    pub target: f64,
    pub risk_per_unit: f64,
    pub risk_amount: f64,
    pub reward_amount: f64,
    /// Per-unit reward / risk.
    pub risk_reward: f64,
    /// reward_amount / risk_amount at the floored lot count.
    pub realized_risk_reward: f64,
    pub total_investment: f64,
    pub take_profits: Vec<TakeProfitLevel>,
}

impl PositionPlan {
    pub fn quantity(&self) -> u64 {
        u64::from(self.lots) * u64::from(self.lot_size)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SizingRejection {
    #[error("invalid premium")]
    InvalidPremium,

    #[error("premium {premium:.2} below minimum {min:.2}")]
    PremiumBelowMinimum { premium: f64, min: f64 },

    #[error("premium {premium:.2} above maximum {max:.2}")]
    PremiumAboveMaximum { premium: f64, max: f64 },

    #[error("non-positive risk per lot")]
    NonPositiveRisk,

    #[error("position size too small")]
    PositionTooSmall { raw_lots: f64 },
}

#[derive(Debug, Clone)]
pub struct PremiumRiskSizer {
    config: SizingConfig,
}

impl PremiumRiskSizer {
    pub fn new(config: SizingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SizingConfig {
        &self.config
    }
}

impl Sizer for PremiumRiskSizer {
    fn plan(&self, request: &SizingRequest) -> Result<PositionPlan, SizingRejection> {
        let cfg = &self.config;
        let premium = request.premium;
        if !premium.is_finite() {
            return Err(SizingRejection::InvalidPremium);
        }
        if premium < cfg.min_premium {
            return Err(SizingRejection::PremiumBelowMinimum {
                premium,
                min: cfg.min_premium,
            });
        }
        if premium > cfg.max_premium {
            return Err(SizingRejection::PremiumAboveMaximum {
                premium,
                max: cfg.max_premium,
            });
        }

        let stop_loss = premium * (1.0 - cfg.sl_percent);
        let risk_per_unit = premium - stop_loss;
        if risk_per_unit <= 0.0 || request.lot_size == 0 {
            return Err(SizingRejection::NonPositiveRisk);
        }

        let lot_size = f64::from(request.lot_size);
        let budget = request.capital * cfg.risk_fraction;
        let raw_lots = budget / (risk_per_unit * lot_size);
        let floored = (raw_lots + LOT_EPSILON).floor();
        if !floored.is_finite() || floored < 1.0 {
            debug!(raw_lots, premium, "position size too small");
            return Err(SizingRejection::PositionTooSmall { raw_lots });
        }
        let lots = if floored >= f64::from(cfg.max_lots) {
            cfg.max_lots
        } else {
            floored as u32
        };

        let target = premium + risk_per_unit * cfg.min_rr;
        let units = lot_size * f64::from(lots);
        let risk_amount = risk_per_unit * units;
        let reward_amount = (target - premium) * units;
        let take_profits = cfg
            .take_profits
            .iter()
            .map(|step| TakeProfitLevel {
                r_multiple: step.r_multiple,
                price: premium + risk_per_unit * step.r_multiple,
                fraction: step.fraction,
            })
            .collect();

        debug!(lots, raw_lots, stop_loss, target, "position sized");
        Ok(PositionPlan {
            lots,
            lot_size: request.lot_size,
            entry: premium,
            stop_loss,
            target,
            risk_per_unit,
            risk_amount,
            reward_amount,
            risk_reward: (target - premium) / risk_per_unit,
            realized_risk_reward: reward_amount / risk_amount,
            total_investment: premium * units,
            take_profits,
        })
    }

    fn name(&self) -> &str {
        "premium_risk"
    }
}
