// Bulk load of visible markets into a snapshot
use tracing::{debug, instrument};

use crate::market::error::RegistryResult;
use crate::market::registry::Snapshot;
use crate::market::types::Market;
use crate::persist::MarketSource;

/// Fetches visible rows from `source` and builds an unpublished snapshot.
///
/// Each record gets fresh working state, and any hidden row the source lets
/// through is dropped here.
#[instrument(skip_all)]
pub async fn load_snapshot(source: &dyn MarketSource) -> RegistryResult<Snapshot> {
    let rows = source.visible_markets().await?;
    let fetched = rows.len();

    let markets: Vec<Market> = rows
        .into_iter()
        .filter(|m| m.visible)
        .map(|mut m| {
            m.after_load();
            m
        })
        .collect();

    if markets.len() != fetched {
        debug!(dropped = fetched - markets.len(), "Dropped hidden market rows");
    }

    Snapshot::build(markets)
}
