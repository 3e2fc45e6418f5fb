//! Directional bias and option side.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Directional permission derived from the higher timeframe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Bias {
    CallOnly,
    PutOnly,
    NoTrade,
}

impl Bias {
    /// The option side this bias allows, if any.
    pub fn side(self) -> Option<OptionSide> {
        match self {
            Bias::CallOnly => Some(OptionSide::Call),
            Bias::PutOnly => Some(OptionSide::Put),
            Bias::NoTrade => None,
        }
    }

    pub fn is_tradeable(self) -> bool {
        self != Bias::NoTrade
    }
}

impl fmt::Display for Bias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Bias::CallOnly => "CALL_ONLY",
            Bias::PutOnly => "PUT_ONLY",
            Bias::NoTrade => "NO_TRADE",
        };
        f.write_str(s)
    }
}

/// Option type bought on a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OptionSide {
    Call,
    Put,
}

impl OptionSide {
    /// +1 for calls, -1 for puts. Multiplies a signed price difference so
    /// "favourable" is always positive.
    pub fn direction(self) -> f64 {
        match self {
            OptionSide::Call => 1.0,
            OptionSide::Put => -1.0,
        }
    }

    pub fn bias(self) -> Bias {
        match self {
            OptionSide::Call => Bias::CallOnly,
            OptionSide::Put => Bias::PutOnly,
        }
    }
}

impl fmt::Display for OptionSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionSide::Call => f.write_str("CALL"),
            OptionSide::Put => f.write_str("PUT"),
        }
    }
}
