use serde::{Deserialize, Serialize};
use std::fmt;

/// Deterministic configuration hash (BLAKE3 of the canonical config JSON).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfigHash(pub String);

impl ConfigHash {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(blake3::hash(bytes).to_hex().to_string())
    }

    /// First 12 hex characters, for log lines.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for ConfigHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Deterministic signal identity: same config, instrument, bar, side and
/// strike always produce the same id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignalId(pub String);

impl SignalId {
    pub fn derive(
        config: &ConfigHash,
        instrument: &str,
        timestamp: &str,
        side: &str,
        strike: f64,
    ) -> Self {
        let canonical = serde_json::json!({
            "config": config.0,
            "instrument": instrument,
            "timestamp": timestamp,
            "side": side,
            "strike": strike,
        });
        let hash = blake3::hash(canonical.to_string().as_bytes());
        Self(hash.to_hex()[..16].to_string())
    }
}

impl fmt::Display for SignalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_hash_is_deterministic() {
        let a = ConfigHash::from_bytes(b"min_score=7");
        let b = ConfigHash::from_bytes(b"min_score=7");
        let c = ConfigHash::from_bytes(b"min_score=6");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.0.len(), 64);
        assert_eq!(a.short().len(), 12);
    }

    #[test]
    fn signal_id_depends_on_every_input() {
        let cfg = ConfigHash::from_bytes(b"cfg");
        let base = SignalId::derive(&cfg, "NIFTY", "2024-01-15T04:30:00Z", "CALL", 22500.0);
        assert_eq!(
            base,
            SignalId::derive(&cfg, "NIFTY", "2024-01-15T04:30:00Z", "CALL", 22500.0)
        );
        assert_ne!(
            base,
            SignalId::derive(&cfg, "NIFTY", "2024-01-15T04:30:00Z", "PUT", 22500.0)
        );
        assert_ne!(
            base,
            SignalId::derive(&cfg, "BANKNIFTY", "2024-01-15T04:30:00Z", "CALL", 22500.0)
        );
        assert_eq!(base.0.len(), 16);
    }
}
