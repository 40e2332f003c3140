mod price_point;
mod timeframe;

pub use price_point::PricePoint;
pub use timeframe::Timeframe;

/// Price history series for a single coin
pub type PriceSeries = Vec<PricePoint>;
