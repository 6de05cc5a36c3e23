// Market registry entrypoint
pub mod types;      // Market record and market-data value types
pub mod error;      // registry error type
pub mod registry;   // atomically swapped snapshot of visible markets
pub mod loader;     // bulk load from persistence into a snapshot
pub mod routing;    // per-stage exchange / queue / node
pub mod keys;       // cache keys and notification channels
pub mod hooks;      // creation workflow side effects

pub use error::{RegistryError, RegistryResult};
pub use registry::{MarketRegistry, Snapshot};
pub use routing::Stage;
pub use types::{KLine, Market, MarketId, NewMarket, OrderCurrency, Period, Ticker, TickerAspect};
