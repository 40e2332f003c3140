use serde::{Deserialize, Serialize};

/// A single point in a price history series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Milliseconds since the Unix epoch
    pub time: i64,

    /// Price in USD
    pub price: f64,
}

impl PricePoint {
    pub fn new(time: i64, price: f64) -> Self {
        Self { time, price }
    }
}
