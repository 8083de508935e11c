//! Market data types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Trading symbol
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol(pub String);

impl Symbol {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-instrument risk profile used by portfolio metrics aggregation.
///
/// Instruments the price source knows nothing about fall back to the
/// default profile: market beta, no volatility estimate, generic sector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InstrumentProfile {
    pub beta: f64,
    pub volatility: f64,
    pub sector: String,
}

impl Default for InstrumentProfile {
    fn default() -> Self {
        Self {
            beta: 1.0,
            volatility: 0.0,
            sector: "Other".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_display_round_trip() {
        let symbol = Symbol::new("AAPL");
        assert_eq!(symbol.as_str(), "AAPL");
        assert_eq!(symbol.to_string(), "AAPL");
    }

    #[test]
    fn default_profile_is_market_neutral() {
        let profile = InstrumentProfile::default();
        assert_eq!(profile.beta, 1.0);
        assert_eq!(profile.volatility, 0.0);
        assert_eq!(profile.sector, "Other");
    }
}
