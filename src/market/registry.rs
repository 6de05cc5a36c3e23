//! Process-wide set of visible markets.
//!
//! The registry owns an immutable [`Snapshot`] behind an `Arc`. Readers clone
//! the `Arc` and work on that copy; a reload builds a complete new snapshot and
//! swaps the pointer, so nobody ever sees a half-built set.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{info, instrument, warn};

use crate::market::error::{RegistryError, RegistryResult};
use crate::market::loader;
use crate::market::types::{Market, MarketId};
use crate::persist::MarketSource;

/// Immutable set of markets plus id/code indexes built alongside it.
#[derive(Debug, Default)]
pub struct Snapshot {
    generation: u64,
    markets: Vec<Arc<Market>>,
    by_id: HashMap<MarketId, usize>,
    by_code: HashMap<String, usize>,
}

impl Snapshot {
    /// Indexes `markets`. Ids and codes must be unique.
    pub fn build(markets: Vec<Market>) -> RegistryResult<Self> {
        let mut by_id = HashMap::with_capacity(markets.len());
        let mut by_code = HashMap::with_capacity(markets.len());

        for (idx, market) in markets.iter().enumerate() {
            if by_id.insert(market.id, idx).is_some() {
                return Err(RegistryError::DuplicateMarket { field: "id", value: market.id.to_string() });
            }
            if by_code.insert(market.code.clone(), idx).is_some() {
                return Err(RegistryError::DuplicateMarket { field: "code", value: market.code.clone() });
            }
        }

        Ok(Self {
            generation: 0,
            markets: markets.into_iter().map(Arc::new).collect(),
            by_id,
            by_code,
        })
    }

    /// Number of publishes that happened up to and including this snapshot; 0 means never loaded.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn markets(&self) -> &[Arc<Market>] {
        &self.markets
    }

    pub fn len(&self) -> usize {
        self.markets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markets.is_empty()
    }

    pub fn find_by_id(&self, id: MarketId) -> Option<&Arc<Market>> {
        self.by_id.get(&id).map(|&idx| &self.markets[idx])
    }

    pub fn find_by_code(&self, code: &str) -> Option<&Arc<Market>> {
        self.by_code.get(code).map(|&idx| &self.markets[idx])
    }
}

#[derive(Debug, Default)]
pub struct MarketRegistry {
    current: RwLock<Arc<Snapshot>>,
}

impl MarketRegistry {
    /// Empty registry. Nothing routes until the first successful [`load`](Self::load).
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry and loads it once. Callers treat an error here as fatal.
    pub async fn bootstrap(source: &dyn MarketSource) -> RegistryResult<Self> {
        let registry = Self::new();
        registry.load(source).await?;
        Ok(registry)
    }

    /// Replaces the snapshot with a fresh load from `source`.
    ///
    /// On failure the current snapshot stays in place and the error is returned.
    #[instrument(skip_all)]
    pub async fn load(&self, source: &dyn MarketSource) -> RegistryResult<usize> {
        match loader::load_snapshot(source).await {
            Ok(snapshot) => {
                let count = snapshot.len();
                let generation = self.publish(snapshot);
                metrics::counter!("marketx_registry_reloads_total", "outcome" => "ok").increment(1);
                info!(markets = count, generation = generation, "Market registry loaded");
                Ok(count)
            }
            Err(e) => {
                metrics::counter!("marketx_registry_reloads_total", "outcome" => "failed").increment(1);
                warn!(error = %e, generation = self.generation(), "Market load failed, keeping previous snapshot");
                Err(e)
            }
        }
    }

    /// Swaps in `snapshot` and returns its generation.
    pub fn publish(&self, mut snapshot: Snapshot) -> u64 {
        let mut current = self.current.write();
        snapshot.generation = current.generation + 1;
        let generation = snapshot.generation;
        metrics::gauge!("marketx_registry_markets").set(snapshot.len() as f64);
        *current = Arc::new(snapshot);
        generation
    }

    /// The snapshot as of this call. Later reloads do not affect it.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.current.read().clone()
    }

    pub fn generation(&self) -> u64 {
        self.current.read().generation
    }

    pub fn find_all(&self) -> Vec<Arc<Market>> {
        self.snapshot().markets().to_vec()
    }

    pub fn find_by_id(&self, id: MarketId) -> RegistryResult<Arc<Market>> {
        self.snapshot()
            .find_by_id(id)
            .cloned()
            .ok_or(RegistryError::NotFoundById(id))
    }

    pub fn find_by_code(&self, code: &str) -> RegistryResult<Arc<Market>> {
        self.snapshot()
            .find_by_code(code)
            .cloned()
            .ok_or_else(|| RegistryError::NotFoundByCode(code.to_string()))
    }
}
