pub mod types;
pub use types::*;
pub mod memory;
pub mod postgres;
pub mod sled_cache;

use async_trait::async_trait;

use crate::market::types::{Market, NewMarket};

/// Read side of market persistence: bulk fetch of the rows eligible for the registry.
#[async_trait]
pub trait MarketSource: Send + Sync {
    async fn visible_markets(&self) -> PersistResult<Vec<Market>>;
}

/// Write side used by the administrative creation path.
#[async_trait]
pub trait MarketWriter: Send + Sync {
    /// Persists a new market and returns it with its assigned id.
    async fn insert_market(&self, new: &NewMarket) -> PersistResult<Market>;
}

/// Key-value cache shared with the market-data services.
///
/// Hash operations address a field inside a named collection, plain
/// operations address a single string key.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn hset(&self, key: &str, field: &str, value: &str) -> PersistResult<()>;
    async fn hget(&self, key: &str, field: &str) -> PersistResult<Option<String>>;
    async fn get(&self, key: &str) -> PersistResult<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> PersistResult<()>;
}
