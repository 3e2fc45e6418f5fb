//! Session time window check on market-local wall clock. Both ends inclusive.

use super::{CheckResult, QualityCheck, QualityInput, QualityRule};
use chrono::NaiveTime;

#[derive(Debug, Clone)]
pub struct TimeWindowRule {
    start: NaiveTime,
    end: NaiveTime,
}

impl TimeWindowRule {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }
}

impl QualityRule for TimeWindowRule {
    fn check(&self) -> QualityCheck {
        QualityCheck::TimeWindow
    }

    fn evaluate(&self, input: &QualityInput<'_>) -> CheckResult {
        let now = input.local_time;
        let clock = now.format("%H:%M");
        if now < self.start {
            CheckResult::fail(QualityCheck::TimeWindow, format!("too early ({clock})"))
        } else if now > self.end {
            CheckResult::fail(QualityCheck::TimeWindow, format!("too late ({clock})"))
        } else {
            CheckResult::pass(
                QualityCheck::TimeWindow,
                format!(
                    "{clock} within {}-{}",
                    self.start.format("%H:%M"),
                    self.end.format("%H:%M")
                ),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OptionSide;

    fn at(h: u32, m: u32, s: u32) -> CheckResult {
        let rule = TimeWindowRule::new(
            NaiveTime::from_hms_opt(9, 20, 0).unwrap(),
            NaiveTime::from_hms_opt(11, 30, 0).unwrap(),
        );
        rule.evaluate(&QualityInput {
            candles: &[],
            side: OptionSide::Call,
            local_time: NaiveTime::from_hms_opt(h, m, s).unwrap(),
        })
    }

    #[test]
    fn bounds_are_inclusive() {
        assert!(at(9, 20, 0).passed);
        assert!(at(11, 30, 0).passed);
        assert!(at(10, 15, 0).passed);
    }

    #[test]
    fn outside_window() {
        let early = at(9, 19, 59);
        assert!(!early.passed);
        assert_eq!(early.reason, "too early (09:19)");
        let late = at(11, 30, 1);
        assert!(!late.passed);
        assert_eq!(late.reason, "too late (11:30)");
    }
}
