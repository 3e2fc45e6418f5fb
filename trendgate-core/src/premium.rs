//! Option premium lookup.
//!
//! The pipeline never prices options. A `PremiumSource` supplies a quote for
//! the chosen strike and side, and an optional liquidity gate screens the
//! quote's volume, open interest and bid/ask spread when present.

use crate::domain::OptionSide;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub premium: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_interest: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bid: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ask: Option<f64>,
}

impl Quote {
    pub fn premium(premium: f64) -> Self {
        Self {
            premium,
            volume: None,
            open_interest: None,
            bid: None,
            ask: None,
        }
    }

    /// Bid/ask spread as a percentage of the mid price.
    pub fn spread_pct(&self) -> Option<f64> {
        match (self.bid, self.ask) {
            (Some(bid), Some(ask)) if bid > 0.0 && ask >= bid => {
                let mid = (bid + ask) / 2.0;
                Some((ask - bid) / mid * 100.0)
            }
            _ => None,
        }
    }
}

/// External quote provider.
pub trait PremiumSource: Send + Sync {
    fn quote(&self, instrument: &str, strike: f64, side: OptionSide) -> Option<Quote>;
}

/// Fixed quotes held in memory, keyed by instrument, strike and side.
#[derive(Debug, Clone, Default)]
pub struct StaticQuotes {
    quotes: HashMap<(String, i64, OptionSide), Quote>,
}

impl StaticQuotes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, instrument: &str, strike: f64, side: OptionSide, quote: Quote) {
        self.quotes
            .insert((instrument.to_string(), strike_key(strike), side), quote);
    }

    pub fn with(mut self, instrument: &str, strike: f64, side: OptionSide, quote: Quote) -> Self {
        self.insert(instrument, strike, side, quote);
        self
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }
}

impl PremiumSource for StaticQuotes {
    fn quote(&self, instrument: &str, strike: f64, side: OptionSide) -> Option<Quote> {
        self.quotes
            .get(&(instrument.to_string(), strike_key(strike), side))
            .copied()
    }
}

/// Strikes are compared in hundredths.
fn strike_key(strike: f64) -> i64 {
    (strike * 100.0).round() as i64
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiquidityConfig {
    pub enabled: bool,
    pub min_volume: f64,
    pub min_open_interest: f64,
    pub max_spread_pct: f64,
}

impl Default for LiquidityConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            min_volume: 1_000.0,
            min_open_interest: 10_000.0,
            max_spread_pct: 5.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LiquidityRejection {
    #[error("volume {volume:.0} below minimum {min:.0}")]
    LowVolume { volume: f64, min: f64 },

    #[error("open interest {open_interest:.0} below minimum {min:.0}")]
    LowOpenInterest { open_interest: f64, min: f64 },

    #[error("bid/ask spread {spread_pct:.2}% above maximum {max:.2}%")]
    WideSpread { spread_pct: f64, max: f64 },
}

impl LiquidityConfig {
    /// Screen a quote. Fields the quote does not carry are not checked.
    pub fn check(&self, quote: &Quote) -> Result<(), LiquidityRejection> {
        if !self.enabled {
            return Ok(());
        }
        if let Some(volume) = quote.volume {
            if volume < self.min_volume {
                return Err(LiquidityRejection::LowVolume {
                    volume,
                    min: self.min_volume,
                });
            }
        }
        if let Some(open_interest) = quote.open_interest {
            if open_interest < self.min_open_interest {
                return Err(LiquidityRejection::LowOpenInterest {
                    open_interest,
                    min: self.min_open_interest,
                });
            }
        }
        if let Some(spread_pct) = quote.spread_pct() {
            if spread_pct > self.max_spread_pct {
                return Err(LiquidityRejection::WideSpread {
                    spread_pct,
                    max: self.max_spread_pct,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_quotes_lookup() {
        let quotes = StaticQuotes::new().with("NIFTY", 22500.0, OptionSide::Call, Quote::premium(120.0));
        assert_eq!(
            quotes.quote("NIFTY", 22500.0, OptionSide::Call).map(|q| q.premium),
            Some(120.0)
        );
        assert!(quotes.quote("NIFTY", 22500.0, OptionSide::Put).is_none());
        assert!(quotes.quote("NIFTY", 22550.0, OptionSide::Call).is_none());
        assert_eq!(quotes.len(), 1);
    }

    #[test]
    fn spread_pct_from_bid_ask() {
        let q = Quote {
            bid: Some(99.0),
            ask: Some(101.0),
            ..Quote::premium(100.0)
        };
        assert!((q.spread_pct().unwrap() - 2.0).abs() < 1e-12);
        assert!(Quote::premium(100.0).spread_pct().is_none());
    }

    #[test]
    fn disabled_gate_passes_everything() {
        let q = Quote {
            volume: Some(1.0),
            ..Quote::premium(100.0)
        };
        assert!(LiquidityConfig::default().check(&q).is_ok());
    }

    #[test]
    fn enabled_gate_screens_fields() {
        let gate = LiquidityConfig {
            enabled: true,
            ..LiquidityConfig::default()
        };
        let thin = Quote {
            volume: Some(500.0),
            ..Quote::premium(100.0)
        };
        assert!(matches!(gate.check(&thin), Err(LiquidityRejection::LowVolume { .. })));

        let wide = Quote {
            bid: Some(90.0),
            ask: Some(110.0),
            ..Quote::premium(100.0)
        };
        let err = gate.check(&wide).unwrap_err();
        assert_eq!(err.to_string(), "bid/ask spread 20.00% above maximum 5.00%");

        assert!(gate.check(&Quote::premium(100.0)).is_ok());
    }
}
