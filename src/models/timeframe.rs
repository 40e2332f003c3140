use serde::{Deserialize, Serialize};
use std::fmt;

/// History span requested by a client, in days
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    /// Last 24 hours
    Day1,
    /// Last 7 days
    Day7,
    /// Last 30 days
    Day30,
    /// Last 90 days
    Day90,
}

impl Timeframe {
    /// Canonical string form, as used in cache keys and upstream requests
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::Day1 => "1",
            Timeframe::Day7 => "7",
            Timeframe::Day30 => "30",
            Timeframe::Day90 => "90",
        }
    }

    /// Span length in days
    pub fn days(&self) -> u32 {
        match self {
            Timeframe::Day1 => 1,
            Timeframe::Day7 => 7,
            Timeframe::Day30 => 30,
            Timeframe::Day90 => 90,
        }
    }

    /// Span length in milliseconds
    pub fn span_ms(&self) -> i64 {
        self.days() as i64 * 24 * 60 * 60 * 1000
    }

    /// Mock-data volatility associated with this span. Longer spans get wider
    /// noise so the synthetic chart looks proportionally rougher.
    pub fn volatility(&self) -> f64 {
        match self {
            Timeframe::Day1 => 0.1,
            Timeframe::Day7 => 0.2,
            Timeframe::Day30 => 0.3,
            Timeframe::Day90 => 0.4,
        }
    }

    /// Parse a client-supplied days string. Anything outside the fixed set is
    /// rejected.
    pub fn parse(value: &str) -> Option<Timeframe> {
        match value.trim() {
            "1" => Some(Timeframe::Day1),
            "7" => Some(Timeframe::Day7),
            "30" => Some(Timeframe::Day30),
            "90" => Some(Timeframe::Day90),
            _ => None,
        }
    }

    /// All supported timeframes
    pub fn all() -> [Timeframe; 4] {
        [
            Timeframe::Day1,
            Timeframe::Day7,
            Timeframe::Day30,
            Timeframe::Day90,
        ]
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Default for Timeframe {
    fn default() -> Self {
        Timeframe::Day1
    }
}
