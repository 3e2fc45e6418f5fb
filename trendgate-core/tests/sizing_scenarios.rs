//! Worked sizing scenarios: premium 100, lot size 50, 1% risk, 30% stop,
//! minimum risk:reward 1.5, at two capital levels.

use trendgate_core::sizers::{
    PremiumRiskSizer, Sizer, SizingConfig, SizingRejection, SizingRequest,
};

fn sizer() -> PremiumRiskSizer {
    PremiumRiskSizer::new(SizingConfig {
        risk_fraction: 0.01,
        sl_percent: 0.30,
        min_rr: 1.5,
        ..SizingConfig::default()
    })
}

#[test]
fn small_account_cannot_afford_one_lot() {
    // budget 1,000 / (30 * 50) = 0.667 lots
    let err = sizer()
        .plan(&SizingRequest {
            premium: 100.0,
            lot_size: 50,
            capital: 100_000.0,
        })
        .unwrap_err();
    match err {
        SizingRejection::PositionTooSmall { raw_lots } => {
            assert!((raw_lots - 2.0 / 3.0).abs() < 1e-9);
        }
        other => panic!("unexpected rejection {other:?}"),
    }
    assert_eq!(err.to_string(), "position size too small");
}

#[test]
fn larger_account_floors_to_six_lots() {
    // budget 10,000 / (30 * 50) = 6.67 lots
    let plan = sizer()
        .plan(&SizingRequest {
            premium: 100.0,
            lot_size: 50,
            capital: 1_000_000.0,
        })
        .unwrap();
    assert_eq!(plan.lots, 6);
    assert_eq!(plan.quantity(), 300);
    assert!((plan.stop_loss - 70.0).abs() < 1e-9);
    assert!((plan.target - 145.0).abs() < 1e-9);
    assert!((plan.risk_amount - 9_000.0).abs() < 1e-6);
    assert!((plan.reward_amount - 13_500.0).abs() < 1e-6);
    assert!((plan.risk_reward - 1.5).abs() < 1e-9);
    assert!((plan.realized_risk_reward - 1.5).abs() < 1e-9);
    assert!((plan.total_investment - 30_000.0).abs() < 1e-6);
}

#[test]
fn sizer_is_named() {
    assert_eq!(sizer().name(), "premium_risk");
}
