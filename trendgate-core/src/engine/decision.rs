//! Pipeline outcomes: a fully specified `Signal`, or a `NoSignal` naming the
//! first stage that rejected the setup.

use crate::components::{ConfluenceScore, EntryCandidate, QualityVerdict};
use crate::domain::{Bias, ConfigHash, OptionSide, SignalId};
use crate::premium::Quote;
use crate::sizers::PositionPlan;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pipeline stages in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    DailyLimits,
    Trend,
    Entry,
    Quality,
    Confluence,
    Premium,
    Sizing,
}

impl Stage {
    pub const ALL: [Stage; 7] = [
        Stage::DailyLimits,
        Stage::Trend,
        Stage::Entry,
        Stage::Quality,
        Stage::Confluence,
        Stage::Premium,
        Stage::Sizing,
    ];
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::DailyLimits => "daily_limits",
            Stage::Trend => "trend",
            Stage::Entry => "entry",
            Stage::Quality => "quality",
            Stage::Confluence => "confluence",
            Stage::Premium => "premium",
            Stage::Sizing => "sizing",
        };
        f.write_str(s)
    }
}

/// Human-readable explanation attached to every signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalReasons {
    pub trend: String,
    pub entry: String,
    pub confirmation: String,
}

/// A trade recommendation. Immutable once assembled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub id: SignalId,
    pub instrument: String,
    /// Timestamp of the LTF candle that triggered the entry.
    pub timestamp: DateTime<Utc>,
    pub generated_at: DateTime<Utc>,
    pub bias: Bias,
    pub side: OptionSide,
    pub spot: f64,
    pub strike: f64,
    pub expiry: NaiveDate,
    pub quote: Quote,
    pub trend_strength: f64,
    pub entry: EntryCandidate,
    pub quality: QualityVerdict,
    pub confluence: ConfluenceScore,
    pub plan: PositionPlan,
    pub reasons: SignalReasons,
    pub config_hash: ConfigHash,
}

impl Signal {
    /// One-line summary for logs and terminals.
    pub fn headline(&self) -> String {
        format!(
            "{} {} {:.0} {} @ {:.2} x{} lots (SL {:.2}, TGT {:.2}, score {:.1})",
            self.instrument,
            self.side,
            self.strike,
            self.expiry.format("%d%b%y"),
            self.plan.entry,
            self.plan.lots,
            self.plan.stop_loss,
            self.plan.target,
            self.confluence.value
        )
    }
}

/// Why no signal was produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoSignal {
    pub instrument: String,
    pub stage: Stage,
    pub reason: String,
    pub evaluated_at: DateTime<Utc>,
}

impl fmt::Display for NoSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: no signal at {} stage: {}", self.instrument, self.stage, self.reason)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    Signal(Box<Signal>),
    NoSignal(NoSignal),
}

impl Decision {
    pub fn is_signal(&self) -> bool {
        matches!(self, Decision::Signal(_))
    }

    pub fn signal(&self) -> Option<&Signal> {
        match self {
            Decision::Signal(s) => Some(s),
            Decision::NoSignal(_) => None,
        }
    }

    pub fn no_signal(&self) -> Option<&NoSignal> {
        match self {
            Decision::Signal(_) => None,
            Decision::NoSignal(n) => Some(n),
        }
    }

    /// Rejecting stage, if any.
    pub fn stage(&self) -> Option<Stage> {
        self.no_signal().map(|n| n.stage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn stages_are_ordered() {
        let mut sorted = Stage::ALL;
        sorted.sort();
        assert_eq!(sorted, Stage::ALL);
        assert_eq!(Stage::DailyLimits.to_string(), "daily_limits");
    }

    #[test]
    fn no_signal_serializes_with_tag() {
        let d = Decision::NoSignal(NoSignal {
            instrument: "NIFTY".into(),
            stage: Stage::Trend,
            reason: "market choppy/flat - no clear trend".into(),
            evaluated_at: Utc.with_ymd_and_hms(2024, 1, 15, 4, 30, 0).unwrap(),
        });
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["decision"], "NO_SIGNAL");
        assert_eq!(json["stage"], "TREND");
        assert_eq!(d.stage(), Some(Stage::Trend));
        assert!(!d.is_signal());
        let back: Decision = serde_json::from_value(json).unwrap();
        assert_eq!(back, d);
    }
}
