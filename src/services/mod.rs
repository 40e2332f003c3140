pub mod coingecko;
pub mod coinpaprika;
pub mod mock_data;
pub mod price_feed;
pub mod rate_limiter;

pub use coingecko::CoinGeckoClient;
pub use coinpaprika::CoinPaprikaClient;
pub use price_feed::{CacheStats, HistorySource, PriceFeed, SharedPriceFeed};
pub use rate_limiter::{Provider, RateLimiter};
