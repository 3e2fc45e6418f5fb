//! Pipeline stages.
//!
//! Each stage is a pure evaluator over candle slices:
//! - Trend classifier: HTF candles → directional bias and strength
//! - Entry detector: LTF candles + bias → entry candidate
//! - Quality gate: all-required rule checks on the entry candle
//! - Confluence scorer: additive score over a multi-timeframe snapshot
//!
//! Plus the indicator trait every indicator implements.

pub mod confluence;
pub mod entry;
pub mod indicator;
pub mod quality;
pub mod trend;

pub use confluence::{
    ConfluenceConfig, ConfluenceFactor, ConfluenceScore, ConfluenceScorer, FactorContribution,
    IndicatorSnapshot, TimeframeSnapshot,
};
pub use entry::{EntryCandidate, EntryConfig, EntryDetector, EntryPattern};
pub use indicator::Indicator;
pub use quality::{
    CheckResult, QualityCheck, QualityConfig, QualityGate, QualityRule, QualityVerdict,
};
pub use trend::{TrendAssessment, TrendClassifier, TrendConfig, TrendStatus};
