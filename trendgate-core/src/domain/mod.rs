//! Domain types: candles, directional bias, instruments and identifiers.

pub mod bias;
pub mod candle;
pub mod ids;
pub mod instrument;

pub use bias::{Bias, OptionSide};
pub use candle::{Candle, CandleError, CandleSeries};
pub use ids::{ConfigHash, SignalId};
pub use instrument::{Instrument, InstrumentError};
