//! File-backed inputs for the CLI: session state, batch manifests and the
//! per-side quotes supplied on the command line.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;
use trendgate_core::domain::OptionSide;
use trendgate_core::premium::{PremiumSource, Quote};
use trendgate_core::risk::DailyState;

/// Quotes for one instrument, one per side, valid for whichever strike the
/// pipeline selects.
#[derive(Debug, Clone, Default)]
pub struct AtmQuotes {
    pub instrument: String,
    pub call: Option<Quote>,
    pub put: Option<Quote>,
}

impl PremiumSource for AtmQuotes {
    fn quote(&self, instrument: &str, _strike: f64, side: OptionSide) -> Option<Quote> {
        if instrument != self.instrument {
            return None;
        }
        match side {
            OptionSide::Call => self.call,
            OptionSide::Put => self.put,
        }
    }
}

/// A `batch` manifest.
///
/// ```toml
/// capital = 1000000.0
/// now = "2024-01-15T04:30:00Z"
///
/// [[entries]]
/// instrument = "NIFTY"
/// htf = "nifty_1h.csv"
/// ltf = "nifty_5m.csv"
/// call = { premium = 120.0, volume = 54000.0 }
/// put = { premium = 95.0 }
/// ```
///
/// Relative candle paths are resolved against the manifest's directory.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchManifest {
    pub capital: f64,
    /// RFC 3339 evaluation time; the current time when absent.
    #[serde(default)]
    pub now: Option<String>,
    pub entries: Vec<BatchEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatchEntry {
    pub instrument: String,
    pub htf: PathBuf,
    pub ltf: PathBuf,
    #[serde(default)]
    pub spot: Option<f64>,
    #[serde(default)]
    pub call: Option<Quote>,
    #[serde(default)]
    pub put: Option<Quote>,
}

impl BatchEntry {
    pub fn quotes(&self) -> AtmQuotes {
        AtmQuotes {
            instrument: self.instrument.clone(),
            call: self.call,
            put: self.put,
        }
    }
}

impl BatchManifest {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest {}", path.display()))?;
        let mut manifest: BatchManifest = toml::from_str(&content)
            .with_context(|| format!("invalid manifest {}", path.display()))?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        for entry in &mut manifest.entries {
            entry.htf = resolve(base, &entry.htf);
            entry.ltf = resolve(base, &entry.ltf);
        }
        Ok(manifest)
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Parse an RFC 3339 instant, or take the current time.
pub fn parse_now(now: Option<&str>) -> Result<DateTime<Utc>> {
    match now {
        Some(s) => Ok(DateTime::parse_from_rfc3339(s)
            .with_context(|| format!("invalid timestamp '{s}' (expected RFC 3339)"))?
            .with_timezone(&Utc)),
        None => Ok(Utc::now()),
    }
}

/// Load the persisted session, or start a fresh one for `today`.
pub fn load_state(path: &Path, today: NaiveDate) -> Result<DailyState> {
    if !path.exists() {
        info!(path = %path.display(), %today, "no session state, starting fresh");
        return Ok(DailyState::new(today));
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read session state {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("corrupt session state {}", path.display()))
}

pub fn save_state(path: &Path, state: &DailyState) -> Result<()> {
    let json = serde_json::to_string_pretty(state)?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write session state {}", path.display()))?;
    Ok(())
}
