//! Market data loading.

pub mod loader;

pub use loader::{load_candles, read_candles, save_candles, write_candles, DataError};
