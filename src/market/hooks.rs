// Side effects attached to market creation
use tracing::{debug, instrument, warn};

use crate::market::error::{RegistryError, RegistryResult};
use crate::market::keys::TICKERS_KEY;
use crate::market::types::{Market, NewMarket, Ticker};
use crate::persist::{CacheStore, MarketWriter};

/// Persists a new market, then seeds its placeholder ticker.
///
/// The registry is not reloaded; the market becomes routable on the next load.
#[instrument(skip_all, fields(code = %new.code))]
pub async fn create_market(
    writer: &dyn MarketWriter,
    cache: &dyn CacheStore,
    new: NewMarket,
) -> RegistryResult<Market> {
    let market = writer.insert_market(&new).await.map_err(RegistryError::Create)?;
    debug!(id = market.id, "Market persisted");
    seed_ticker(cache, &market).await;
    Ok(market)
}

/// Best-effort write of an empty ticker under the market's id in the tickers hash.
/// Failures are logged and dropped.
#[instrument(skip_all, fields(id = market.id))]
pub async fn seed_ticker(cache: &dyn CacheStore, market: &Market) {
    let payload = match serde_json::to_string(&Ticker::placeholder(market)) {
        Ok(json) => json,
        Err(e) => {
            warn!(error = %e, "Failed to encode ticker placeholder");
            metrics::counter!("marketx_ticker_seed_failures_total").increment(1);
            return;
        }
    };

    if let Err(e) = cache.hset(TICKERS_KEY, &market.id.to_string(), &payload).await {
        warn!(error = %e, "Failed to seed ticker placeholder");
        metrics::counter!("marketx_ticker_seed_failures_total").increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::memory::{MemoryCache, MemoryMarketStore};
    use crate::persist::PersistError;

    fn new_market(code: &str) -> NewMarket {
        NewMarket { name: code.to_uppercase(), code: code.into(), visible: true, ..NewMarket::default() }
    }

    #[tokio::test]
    async fn test_create_seeds_ticker() {
        let store = MemoryMarketStore::default();
        let cache = MemoryCache::default();

        let market = create_market(&store, &cache, new_market("btcusd")).await.unwrap();

        let raw = cache.hget(TICKERS_KEY, &market.id.to_string()).await.unwrap().unwrap();
        let ticker: Ticker = serde_json::from_str(&raw).unwrap();
        assert_eq!(ticker, Ticker::placeholder(&market));
    }

    #[tokio::test]
    async fn test_cache_failure_does_not_fail_create() {
        let store = MemoryMarketStore::default();
        let cache = MemoryCache::default();
        cache.set_failing(true);

        let market = create_market(&store, &cache, new_market("btcusd")).await.unwrap();

        assert_eq!(market.code, "btcusd");
        assert_eq!(cache.write_attempts(), 1);
        assert_eq!(store.rows().len(), 1);
    }

    #[tokio::test]
    async fn test_persist_failure_skips_seed() {
        let store = MemoryMarketStore::default();
        let cache = MemoryCache::default();
        create_market(&store, &cache, new_market("btcusd")).await.unwrap();

        let err = create_market(&store, &cache, new_market("btcusd")).await.unwrap_err();

        assert!(matches!(err, RegistryError::Create(PersistError::DuplicateCode(_))));
        assert!(err.to_string().starts_with("Market create failed"), "{}", err);
        assert_eq!(cache.write_attempts(), 1);
    }
}
