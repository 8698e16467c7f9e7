//! Knowledge categories shared by tasks and store entries

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of a piece of research output
///
/// Every task descriptor declares the category its output is stored under,
/// and the knowledge store keys its retention windows on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Prices, quotes, and other fast-moving market observations
    MarketData,
    /// Company or asset fundamentals (financials, valuation, holdings)
    Fundamental,
    /// Risk profiles and mitigation analysis
    Risk,
    /// Investment strategy and allocation recommendations
    Strategy,
    /// Synthesized reports and theses
    Report,
}

impl Category {
    /// All categories, in declaration order
    pub const ALL: [Self; 5] = [
        Self::MarketData,
        Self::Fundamental,
        Self::Risk,
        Self::Strategy,
        Self::Report,
    ];

    /// Stable snake_case name, matching the serde representation
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MarketData => "market_data",
            Self::Fundamental => "fundamental",
            Self::Risk => "risk",
            Self::Strategy => "strategy",
            Self::Report => "report",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_str_matches_serde() {
        for category in Category::ALL {
            let json = serde_json::to_string(&category).unwrap();
            assert_eq!(json, format!("\"{}\"", category.as_str()));
        }
    }

    #[test]
    fn test_deserialize_snake_case() {
        let category: Category = serde_json::from_str("\"market_data\"").unwrap();
        assert_eq!(category, Category::MarketData);
    }
}
