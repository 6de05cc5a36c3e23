//! In-process market store and cache.
//!
//! Both can be switched into a failing mode to exercise error paths, and they
//! back the binary's `--memory` mode.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::market::types::{Market, MarketId, NewMarket};
use crate::persist::types::{PersistError, PersistResult};
use crate::persist::{CacheStore, MarketSource, MarketWriter};

#[derive(Debug)]
pub struct MemoryMarketStore {
    rows: Mutex<Vec<Market>>,
    next_id: AtomicI64,
    failing: AtomicBool,
}

impl Default for MemoryMarketStore {
    fn default() -> Self {
        Self::with_markets(Vec::new())
    }
}

impl MemoryMarketStore {
    pub fn with_markets(rows: Vec<Market>) -> Self {
        let next_id = rows.iter().map(|m| m.id).max().unwrap_or(0) + 1;
        Self {
            rows: Mutex::new(rows),
            next_id: AtomicI64::new(next_id),
            failing: AtomicBool::new(false),
        }
    }

    /// Id handed to the next inserted market.
    pub fn with_next_id(self, id: MarketId) -> Self {
        self.next_id.store(id, Ordering::SeqCst);
        self
    }

    /// Adds a row as-is, bypassing the creation checks.
    pub fn insert_row(&self, market: Market) {
        self.rows.lock().push(market);
    }

    pub fn rows(&self) -> Vec<Market> {
        self.rows.lock().clone()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check_available(&self) -> PersistResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PersistError::Unavailable("memory store offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl MarketSource for MemoryMarketStore {
    async fn visible_markets(&self) -> PersistResult<Vec<Market>> {
        self.check_available()?;
        Ok(self.rows.lock().iter().filter(|m| m.visible).cloned().collect())
    }
}

#[async_trait]
impl MarketWriter for MemoryMarketStore {
    async fn insert_market(&self, new: &NewMarket) -> PersistResult<Market> {
        self.check_available()?;
        let mut rows = self.rows.lock();
        if rows.iter().any(|m| m.code == new.code) {
            return Err(PersistError::DuplicateCode(new.code.clone()));
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let market = new.clone().into_market(id);
        rows.push(market.clone());
        Ok(market)
    }
}

#[derive(Debug, Default)]
pub struct MemoryCache {
    hashes: Mutex<HashMap<String, HashMap<String, String>>>,
    strings: Mutex<HashMap<String, String>>,
    failing: AtomicBool,
    write_attempts: AtomicUsize,
    hset_attempts: Mutex<Vec<(String, String)>>,
}

impl MemoryCache {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Writes tried so far, failed ones included.
    pub fn write_attempts(&self) -> usize {
        self.write_attempts.load(Ordering::SeqCst)
    }

    /// `(key, field)` of every `hset` tried so far, in call order, failed ones included.
    pub fn hset_attempts(&self) -> Vec<(String, String)> {
        self.hset_attempts.lock().clone()
    }

    fn check_available(&self) -> PersistResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PersistError::Unavailable("memory cache offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn hset(&self, key: &str, field: &str, value: &str) -> PersistResult<()> {
        self.write_attempts.fetch_add(1, Ordering::SeqCst);
        self.hset_attempts.lock().push((key.to_string(), field.to_string()));
        self.check_available()?;
        self.hashes
            .lock()
            .entry(key.to_string())
            .or_default()
            .insert(field.to_string(), value.to_string());
        Ok(())
    }

    async fn hget(&self, key: &str, field: &str) -> PersistResult<Option<String>> {
        self.check_available()?;
        Ok(self.hashes.lock().get(key).and_then(|h| h.get(field)).cloned())
    }

    async fn get(&self, key: &str) -> PersistResult<Option<String>> {
        self.check_available()?;
        Ok(self.strings.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> PersistResult<()> {
        self.write_attempts.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        self.strings.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_source_filters_hidden() {
        let store = MemoryMarketStore::with_markets(vec![
            Market { id: 1, code: "btcusd".into(), visible: true, ..Market::default() },
            Market { id: 2, code: "ethusd".into(), visible: false, ..Market::default() },
        ]);
        let rows = store.visible_markets().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, 1);
    }

    #[tokio::test]
    async fn test_insert_assigns_ids() {
        let store = MemoryMarketStore::default().with_next_id(9);
        let a = store.insert_market(&NewMarket { code: "btcusd".into(), ..NewMarket::default() }).await.unwrap();
        let b = store.insert_market(&NewMarket { code: "ethusd".into(), ..NewMarket::default() }).await.unwrap();
        assert_eq!((a.id, b.id), (9, 10));
    }

    #[tokio::test]
    async fn test_cache_hash_and_strings_are_separate() {
        let cache = MemoryCache::default();
        cache.hset("goDCE:tickers", "1", "{}").await.unwrap();
        cache.set("goDCE:ticker:btcusd", "{\"last\":\"1\"}").await.unwrap();

        assert_eq!(cache.hget("goDCE:tickers", "1").await.unwrap().as_deref(), Some("{}"));
        assert_eq!(cache.get("goDCE:tickers").await.unwrap(), None);
        assert_eq!(cache.get("goDCE:ticker:btcusd").await.unwrap().as_deref(), Some("{\"last\":\"1\"}"));
        assert_eq!(cache.write_attempts(), 2);
    }

    #[tokio::test]
    async fn test_failing_cache_counts_attempts() {
        let cache = MemoryCache::default();
        cache.set_failing(true);
        assert!(cache.hset("k", "f", "v").await.is_err());
        assert_eq!(cache.write_attempts(), 1);
        assert_eq!(cache.hset_attempts(), vec![("k".to_string(), "f".to_string())]);
        assert_eq!(cache.hget("k", "f").await.ok().flatten(), None);
    }
}
