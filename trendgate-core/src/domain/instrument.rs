use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Index option contract metadata: lot size, strike spacing, weekly expiry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Instrument {
    pub symbol: String,
    pub lot_size: u32,
    pub strike_gap: f64,
    #[serde(default = "default_expiry_weekday")]
    pub expiry_weekday: Weekday,
    /// Local time after which the current expiry day rolls to next week.
    #[serde(default = "default_expiry_cutoff")]
    pub expiry_cutoff: NaiveTime,
}

fn default_expiry_weekday() -> Weekday {
    Weekday::Thu
}

fn default_expiry_cutoff() -> NaiveTime {
    NaiveTime::from_hms_opt(15, 0, 0).unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InstrumentError {
    #[error("{symbol}: lot size must be at least 1")]
    ZeroLotSize { symbol: String },

    #[error("{symbol}: strike gap must be positive, got {gap}")]
    InvalidStrikeGap { symbol: String, gap: f64 },

    #[error("instrument symbol must not be empty")]
    EmptySymbol,
}

impl Instrument {
    pub fn new(symbol: impl Into<String>, lot_size: u32, strike_gap: f64) -> Self {
        Self {
            symbol: symbol.into(),
            lot_size,
            strike_gap,
            expiry_weekday: default_expiry_weekday(),
            expiry_cutoff: default_expiry_cutoff(),
        }
    }

    /// NIFTY 50 index options.
    pub fn nifty() -> Self {
        Self::new("NIFTY", 50, 50.0)
    }

    /// NIFTY Bank index options.
    pub fn banknifty() -> Self {
        Self::new("BANKNIFTY", 25, 100.0)
    }

    pub fn validate(&self) -> Result<(), InstrumentError> {
        if self.symbol.trim().is_empty() {
            return Err(InstrumentError::EmptySymbol);
        }
        if self.lot_size == 0 {
            return Err(InstrumentError::ZeroLotSize {
                symbol: self.symbol.clone(),
            });
        }
        if !(self.strike_gap.is_finite() && self.strike_gap > 0.0) {
            return Err(InstrumentError::InvalidStrikeGap {
                symbol: self.symbol.clone(),
                gap: self.strike_gap,
            });
        }
        Ok(())
    }

    /// At-the-money strike: spot rounded to the nearest strike gap.
    pub fn atm_strike(&self, spot: f64) -> f64 {
        (spot / self.strike_gap).round() * self.strike_gap
    }

    /// Next weekly expiry date as seen from local market time.
    ///
    /// On expiry day itself the current contract is used until the cutoff;
    /// from the cutoff onwards the following week's expiry is returned.
    pub fn next_expiry(&self, local_now: NaiveDateTime) -> NaiveDate {
        let today = local_now.date();
        let target = self.expiry_weekday.num_days_from_monday() as i64;
        let current = today.weekday().num_days_from_monday() as i64;
        let mut days_ahead = (target - current).rem_euclid(7);
        if days_ahead == 0 && local_now.time() >= self.expiry_cutoff {
            days_ahead = 7;
        }
        today + Duration::days(days_ahead)
    }
}
