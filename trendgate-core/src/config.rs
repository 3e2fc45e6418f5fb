//! Pipeline configuration.
//!
//! One TOML document with a section per stage. Every field has a default,
//! so an empty file is a valid configuration. `validate()` runs once when the
//! orchestrator is built; nothing re-checks parameters per evaluation.

use crate::components::{ConfluenceConfig, EntryConfig, QualityConfig, TrendConfig};
use crate::components::quality::RsiBand;
use crate::domain::{ConfigHash, Instrument, InstrumentError};
use crate::premium::LiquidityConfig;
use crate::risk::LimitsConfig;
use crate::sizers::SizingConfig;
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("failed to encode config for hashing: {0}")]
    Hash(#[from] serde_json::Error),

    #[error("invalid config: {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("invalid instrument: {0}")]
    Instrument(#[from] InstrumentError),
}

/// Market clock settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    /// Market local time offset from UTC, in minutes (IST = +330).
    pub utc_offset_minutes: i32,
    /// HTF candles kept for evaluation; older candles are dropped.
    pub htf_max_candles: usize,
    /// LTF candles kept for evaluation.
    pub ltf_max_candles: usize,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: 330,
            htf_max_candles: 200,
            ltf_max_candles: 200,
        }
    }
}

impl MarketConfig {
    pub fn offset(&self) -> Result<FixedOffset, ConfigError> {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).ok_or(ConfigError::Invalid {
            field: "market.utc_offset_minutes",
            reason: format!("{} is not a valid UTC offset", self.utc_offset_minutes),
        })
    }
}

/// Complete configuration for the signal pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    pub market: MarketConfig,
    pub trend: TrendConfig,
    pub entry: EntryConfig,
    pub quality: QualityConfig,
    pub confluence: ConfluenceConfig,
    pub sizing: SizingConfig,
    pub limits: LimitsConfig,
    pub liquidity: LiquidityConfig,
    pub instruments: Vec<Instrument>,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            market: MarketConfig::default(),
            trend: TrendConfig::default(),
            entry: EntryConfig::default(),
            quality: QualityConfig::default(),
            confluence: ConfluenceConfig::default(),
            sizing: SizingConfig::default(),
            limits: LimitsConfig::default(),
            liquidity: LiquidityConfig::default(),
            instruments: vec![Instrument::nifty(), Instrument::banknifty()],
        }
    }
}

impl SignalConfig {
    /// Load a configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse a configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Serialize the configuration to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// BLAKE3 of the canonical JSON form. Equal configs hash equally.
    pub fn config_hash(&self) -> Result<ConfigHash, ConfigError> {
        let json = serde_json::to_vec(self)?;
        Ok(ConfigHash::from_bytes(&json))
    }

    pub fn instrument(&self, symbol: &str) -> Option<&Instrument> {
        self.instruments.iter().find(|i| i.symbol == symbol)
    }

    /// Reject contradictory or out-of-range parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.market.offset()?;
        ensure(self.market.htf_max_candles >= 1, "market.htf_max_candles", "must be >= 1")?;
        ensure(self.market.ltf_max_candles >= 1, "market.ltf_max_candles", "must be >= 1")?;

        let t = &self.trend;
        ensure(t.fast_period >= 1, "trend.fast_period", "must be >= 1")?;
        ensure(
            t.slow_period > t.fast_period,
            "trend.slow_period",
            format!("{} must exceed fast period {}", t.slow_period, t.fast_period),
        )?;
        ensure(non_negative(t.min_separation_pct), "trend.min_separation_pct", "must be >= 0")?;
        ensure(t.alignment_bars >= 1, "trend.alignment_bars", "must be >= 1")?;
        ensure(t.strength_window >= 1, "trend.strength_window", "must be >= 1")?;
        ensure(non_negative(t.separation_scale), "trend.separation_scale", "must be >= 0")?;
        ensure(
            (0.0..=100.0).contains(&t.min_strength),
            "trend.min_strength",
            "must be within [0, 100]",
        )?;

        let e = &self.entry;
        ensure(e.ema_period >= 1, "entry.ema_period", "must be >= 1")?;
        ensure(e.volume_lookback >= 1, "entry.volume_lookback", "must be >= 1")?;
        ensure(e.structure_lookback >= 1, "entry.structure_lookback", "must be >= 1")?;
        ensure(
            positive(e.breakout_volume_multiple),
            "entry.breakout_volume_multiple",
            "must be > 0",
        )?;
        ensure(
            positive(e.pullback_volume_multiple),
            "entry.pullback_volume_multiple",
            "must be > 0",
        )?;

        let q = &self.quality;
        ensure(q.rsi_period >= 1, "quality.rsi_period", "must be >= 1")?;
        check_band(q.call_rsi_band, "quality.call_rsi_band")?;
        check_band(q.put_rsi_band, "quality.put_rsi_band")?;
        ensure(
            q.min_body_percent > 0.0 && q.min_body_percent <= 1.0,
            "quality.min_body_percent",
            "must be within (0, 1]",
        )?;
        ensure(non_negative(q.max_wick_ratio), "quality.max_wick_ratio", "must be >= 0")?;
        ensure(
            q.session_start < q.session_end,
            "quality.session_start",
            format!("{} must be before session end {}", q.session_start, q.session_end),
        )?;

        let c = &self.confluence;
        ensure(positive(c.max_score), "confluence.max_score", "must be > 0")?;
        ensure(
            non_negative(c.min_score) && c.min_score <= c.max_score,
            "confluence.min_score",
            format!("{} must be within [0, {}]", c.min_score, c.max_score),
        )?;
        ensure(c.trend_fast_period >= 1, "confluence.trend_fast_period", "must be >= 1")?;
        ensure(
            c.trend_slow_period > c.trend_fast_period,
            "confluence.trend_slow_period",
            "must exceed trend_fast_period",
        )?;
        ensure(c.adx_period >= 1, "confluence.adx_period", "must be >= 1")?;
        ensure(c.volume_lookback >= 1, "confluence.volume_lookback", "must be >= 1")?;
        ensure(
            c.volume_high_ratio >= c.volume_low_ratio,
            "confluence.volume_high_ratio",
            "must be >= volume_low_ratio",
        )?;
        ensure(c.rsi_period >= 1, "confluence.rsi_period", "must be >= 1")?;
        check_band(c.call_rsi_band, "confluence.call_rsi_band")?;
        check_band(c.put_rsi_band, "confluence.put_rsi_band")?;
        ensure(c.proximity_ema_period >= 1, "confluence.proximity_ema_period", "must be >= 1")?;
        ensure(c.macd_fast >= 1, "confluence.macd_fast", "must be >= 1")?;
        ensure(c.macd_signal >= 1, "confluence.macd_signal", "must be >= 1")?;
        ensure(
            c.macd_slow > c.macd_fast,
            "confluence.macd_slow",
            "must exceed macd_fast",
        )?;
        ensure(c.bollinger_period >= 1, "confluence.bollinger_period", "must be >= 1")?;
        let weights = [
            c.trend_agreement_weight,
            c.adx_weight,
            c.volume_high_weight,
            c.volume_low_weight,
            c.rsi_weight,
            c.pattern_weight,
            c.proximity_weight,
            c.momentum_weight,
            c.midline_weight,
        ];
        ensure(
            weights.iter().all(|w| non_negative(*w)),
            "confluence weights",
            "must be finite and >= 0",
        )?;

        let s = &self.sizing;
        ensure(
            s.risk_fraction > 0.0 && s.risk_fraction <= 1.0,
            "sizing.risk_fraction",
            format!("{} must be within (0, 1]", s.risk_fraction),
        )?;
        ensure(
            s.sl_percent > 0.0 && s.sl_percent < 1.0,
            "sizing.sl_percent",
            format!("{} must be within (0, 1)", s.sl_percent),
        )?;
        ensure(positive(s.min_rr), "sizing.min_rr", "must be > 0")?;
        ensure(positive(s.min_premium), "sizing.min_premium", "must be > 0")?;
        ensure(
            s.min_premium <= s.max_premium,
            "sizing.min_premium",
            format!("{} exceeds max_premium {}", s.min_premium, s.max_premium),
        )?;
        ensure(s.max_lots >= 1, "sizing.max_lots", "must be >= 1")?;
        ensure(
            s.take_profits
                .iter()
                .all(|tp| positive(tp.r_multiple) && tp.fraction > 0.0 && tp.fraction <= 1.0),
            "sizing.take_profits",
            "r_multiple must be > 0 and fraction within (0, 1]",
        )?;
        let total_fraction: f64 = s.take_profits.iter().map(|tp| tp.fraction).sum();
        ensure(
            total_fraction <= 1.0 + 1e-9,
            "sizing.take_profits",
            format!("fractions sum to {total_fraction}, more than the whole position"),
        )?;

        let l = &self.limits;
        ensure(l.max_daily_signals >= 1, "limits.max_daily_signals", "must be >= 1")?;
        ensure(l.max_trades_per_day >= 1, "limits.max_trades_per_day", "must be >= 1")?;
        ensure(
            l.consecutive_loss_pause >= 1,
            "limits.consecutive_loss_pause",
            "must be >= 1",
        )?;
        if let Some(max_loss) = l.max_daily_loss {
            ensure(positive(max_loss), "limits.max_daily_loss", "must be > 0")?;
        }

        let q = &self.liquidity;
        ensure(
            non_negative(q.min_volume) && non_negative(q.min_open_interest),
            "liquidity",
            "minimums must be >= 0",
        )?;
        ensure(non_negative(q.max_spread_pct), "liquidity.max_spread_pct", "must be >= 0")?;

        ensure(!self.instruments.is_empty(), "instruments", "at least one instrument is required")?;
        let mut seen = HashSet::new();
        for instrument in &self.instruments {
            instrument.validate()?;
            ensure(
                seen.insert(instrument.symbol.as_str()),
                "instruments",
                format!("duplicate symbol {}", instrument.symbol),
            )?;
        }
        Ok(())
    }
}

fn ensure(cond: bool, field: &'static str, reason: impl Into<String>) -> Result<(), ConfigError> {
    if cond {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: reason.into(),
        })
    }
}

fn positive(x: f64) -> bool {
    x.is_finite() && x > 0.0
}

fn non_negative(x: f64) -> bool {
    x.is_finite() && x >= 0.0
}

fn check_band(band: RsiBand, field: &'static str) -> Result<(), ConfigError> {
    ensure(
        band.lower >= 0.0 && band.upper <= 100.0 && band.lower <= band.upper,
        field,
        format!("{band} must satisfy 0 <= lower <= upper <= 100"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invalid_field(config: &SignalConfig) -> &'static str {
        match config.validate() {
            Err(ConfigError::Invalid { field, .. }) => field,
            other => panic!("expected invalid config, got {other:?}"),
        }
    }

    #[test]
    fn default_is_valid() {
        SignalConfig::default().validate().unwrap();
    }

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(SignalConfig::from_toml("").unwrap(), SignalConfig::default());
    }

    #[test]
    fn toml_roundtrip() {
        let config = SignalConfig::default();
        let text = config.to_toml().unwrap();
        assert!(text.contains("[confluence]"));
        assert_eq!(SignalConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config = SignalConfig::from_toml(
            "[confluence]\nmin_score = 6.5\n\n[sizing]\nmax_lots = 4\n",
        )
        .unwrap();
        assert_eq!(config.confluence.min_score, 6.5);
        assert_eq!(config.confluence.trend_agreement_weight, 2.0);
        assert_eq!(config.sizing.max_lots, 4);
        assert_eq!(config.sizing.sl_percent, 0.30);
    }

    #[test]
    fn premium_bounds_contradiction() {
        let mut config = SignalConfig::default();
        config.sizing.min_premium = 500.0;
        assert_eq!(invalid_field(&config), "sizing.min_premium");
    }

    #[test]
    fn non_positive_risk_fraction() {
        let mut config = SignalConfig::default();
        config.sizing.risk_fraction = 0.0;
        assert_eq!(invalid_field(&config), "sizing.risk_fraction");
    }

    #[test]
    fn inverted_session_window() {
        let mut config = SignalConfig::default();
        std::mem::swap(&mut config.quality.session_start, &mut config.quality.session_end);
        assert_eq!(invalid_field(&config), "quality.session_start");
    }

    #[test]
    fn trend_periods_must_be_ordered() {
        let mut config = SignalConfig::default();
        config.trend.slow_period = 10;
        assert_eq!(invalid_field(&config), "trend.slow_period");
    }

    #[test]
    fn duplicate_instruments_rejected() {
        let mut config = SignalConfig::default();
        config.instruments.push(Instrument::nifty());
        assert_eq!(invalid_field(&config), "instruments");
    }

    #[test]
    fn bad_instrument_rejected() {
        let mut config = SignalConfig::default();
        config.instruments[0].lot_size = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Instrument(_))));
    }

    #[test]
    fn hash_tracks_content() {
        let a = SignalConfig::default();
        let mut b = SignalConfig::default();
        assert_eq!(a.config_hash().unwrap(), b.config_hash().unwrap());
        b.confluence.min_score = 6.0;
        assert_ne!(a.config_hash().unwrap(), b.config_hash().unwrap());
    }

    #[test]
    fn hash_is_never_the_empty_encoding() {
        let hash = SignalConfig::default().config_hash().unwrap();
        assert_ne!(hash, ConfigHash::from_bytes(b""));
    }

    #[test]
    fn market_offset() {
        let offset = MarketConfig::default().offset().unwrap();
        assert_eq!(offset.local_minus_utc(), 330 * 60);
        let bad = MarketConfig {
            utc_offset_minutes: 24 * 60,
            ..MarketConfig::default()
        };
        assert!(bad.offset().is_err());
    }

    #[test]
    fn from_file_reports_path() {
        let err = SignalConfig::from_file(Path::new("/nonexistent/trendgate.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/trendgate.toml"));
    }
}
