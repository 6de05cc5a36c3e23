use std::path::Path;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::persist::types::{PersistError, PersistResult};
use crate::persist::CacheStore;

/// Cache backed by an embedded sled database.
///
/// A hash collection maps to a sled tree named after the collection key;
/// plain string keys live in the default tree.
pub struct SledCache {
    db: sled::Db,
}

impl SledCache {
    pub fn open(path: impl AsRef<Path>) -> PersistResult<Self> {
        let db = sled::open(path.as_ref())?;
        info!(path = %path.as_ref().display(), "Opened sled cache");
        Ok(Self { db })
    }

    /// Throwaway cache removed when dropped.
    pub fn temporary() -> PersistResult<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self { db })
    }

    fn decode(value: Option<sled::IVec>) -> PersistResult<Option<String>> {
        match value {
            Some(bytes) => Ok(Some(String::from_utf8(bytes.to_vec())?)),
            None => Ok(None),
        }
    }
}

/// Runs a sled call on the blocking pool; inserts and flushes hit the disk.
async fn blocking<T, F>(db: &sled::Db, op: F) -> PersistResult<T>
where
    T: Send + 'static,
    F: FnOnce(sled::Db) -> PersistResult<T> + Send + 'static,
{
    let db = db.clone();
    tokio::task::spawn_blocking(move || op(db))
        .await
        .map_err(|e| PersistError::Other(format!("sled task failed: {}", e)))?
}

#[async_trait]
impl CacheStore for SledCache {
    async fn hset(&self, key: &str, field: &str, value: &str) -> PersistResult<()> {
        let (tree_name, field_name, value) = (key.to_string(), field.to_string(), value.to_string());
        blocking(&self.db, move |db| {
            let tree = db.open_tree(&tree_name)?;
            tree.insert(field_name.as_bytes(), value.as_bytes())?;
            tree.flush()?;
            Ok(())
        })
        .await?;
        debug!(key = key, field = field, "hset");
        Ok(())
    }

    async fn hget(&self, key: &str, field: &str) -> PersistResult<Option<String>> {
        let (tree_name, field_name) = (key.to_string(), field.to_string());
        let raw = blocking(&self.db, move |db| Ok(db.open_tree(&tree_name)?.get(field_name.as_bytes())?)).await?;
        Self::decode(raw)
    }

    async fn get(&self, key: &str) -> PersistResult<Option<String>> {
        let key_name = key.to_string();
        let raw = blocking(&self.db, move |db| Ok(db.get(key_name.as_bytes())?)).await?;
        Self::decode(raw)
    }

    async fn set(&self, key: &str, value: &str) -> PersistResult<()> {
        let (key_name, value) = (key.to_string(), value.to_string());
        blocking(&self.db, move |db| {
            db.insert(key_name.as_bytes(), value.as_bytes())?;
            db.flush()?;
            Ok(())
        })
        .await?;
        debug!(key = key, "set");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::keys::TICKERS_KEY;

    #[tokio::test]
    async fn test_hash_fields() {
        let cache = SledCache::temporary().unwrap();
        cache.hset(TICKERS_KEY, "1", "one").await.unwrap();
        cache.hset(TICKERS_KEY, "2", "two").await.unwrap();
        cache.hset(TICKERS_KEY, "1", "uno").await.unwrap();

        assert_eq!(cache.hget(TICKERS_KEY, "1").await.unwrap().as_deref(), Some("uno"));
        assert_eq!(cache.hget(TICKERS_KEY, "2").await.unwrap().as_deref(), Some("two"));
        assert_eq!(cache.hget(TICKERS_KEY, "3").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_strings_separate_from_hashes() {
        let cache = SledCache::temporary().unwrap();
        cache.hset(TICKERS_KEY, "1", "one").await.unwrap();
        cache.set("goDCE:ticker:btcusd", "snapshot").await.unwrap();

        assert_eq!(cache.get(TICKERS_KEY).await.unwrap(), None);
        assert_eq!(cache.get("goDCE:ticker:btcusd").await.unwrap().as_deref(), Some("snapshot"));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_writes_leave_runtime_free() {
        let cache = std::sync::Arc::new(SledCache::temporary().unwrap());
        let ticks = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));

        let ticker = {
            let ticks = std::sync::Arc::clone(&ticks);
            tokio::spawn(async move {
                loop {
                    ticks.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                    tokio::task::yield_now().await;
                }
            })
        };

        for i in 0..20 {
            cache.hset(TICKERS_KEY, &i.to_string(), "{}").await.unwrap();
            cache.set(&format!("goDCE:ticker:m{}", i), "{}").await.unwrap();
        }
        ticker.abort();

        // Each write awaits the blocking pool, so the other task gets scheduled in between
        assert!(ticks.load(std::sync::atomic::Ordering::SeqCst) > 0);
        assert_eq!(cache.hget(TICKERS_KEY, "19").await.unwrap().as_deref(), Some("{}"));
        assert_eq!(cache.get("goDCE:ticker:m0").await.unwrap().as_deref(), Some("{}"));
    }
}
