//! Candle CSV reading and writing.
//!
//! Format: a header row `timestamp,open,high,low,close,volume`, RFC 3339
//! timestamps, one candle per row in ascending time order. Every row is
//! validated through `CandleSeries::new`.

use crate::domain::{Candle, CandleError, CandleSeries};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed candle CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid candle data: {0}")]
    Candle(#[from] CandleError),
}

/// Parse candles from any reader.
pub fn read_candles<R: Read>(reader: R) -> Result<CandleSeries, DataError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let candles = rdr
        .deserialize::<Candle>()
        .collect::<Result<Vec<_>, _>>()?;
    Ok(CandleSeries::new(candles)?)
}

/// Load a candle CSV file.
pub fn load_candles(path: &Path) -> Result<CandleSeries, DataError> {
    let file = std::fs::File::open(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let series = read_candles(file)?;
    debug!(path = %path.display(), candles = series.len(), "candles loaded");
    Ok(series)
}

/// Write candles with a header row.
pub fn write_candles<W: Write>(writer: W, series: &CandleSeries) -> Result<(), DataError> {
    let mut wtr = csv::Writer::from_writer(writer);
    for candle in series.candles() {
        wtr.serialize(candle)?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Write a candle CSV file, replacing any existing file.
pub fn save_candles(path: &Path, series: &CandleSeries) -> Result<(), DataError> {
    let file = std::fs::File::create(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    write_candles(file, series)
}
