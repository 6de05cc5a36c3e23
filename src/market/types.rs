use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub type MarketId = i64;
pub type CurrencyId = i64;
/// Width of a k-line bucket, in minutes.
pub type Period = i64;

/// Node identifier a stage falls back to until a deployment assigns one.
pub const DEFAULT_NODE: &str = "a";

/// A configured tradable pair.
///
/// Serializing a `Market` yields its public representation: routing and node
/// fields are skipped, and so is the k-line working set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Market {
    pub id: MarketId,
    pub name: String,
    pub code: String,
    pub price_group_fixed: i32,
    pub sort_order: i32,
    pub ask_currency_id: CurrencyId,
    pub bid_currency_id: CurrencyId,
    pub ask_fee: Decimal,
    pub bid_fee: Decimal,
    pub ask_fixed: i32,
    pub bid_fixed: i32,
    pub visible: bool,
    pub tradable: bool,

    // Working state, never persisted
    pub ticker: TickerAspect,
    #[serde(skip)]
    pub latest_klines: HashMap<Period, KLine>,

    // Pipeline routing
    #[serde(skip)]
    pub ack: bool,
    #[serde(skip)]
    pub durable: bool,
    #[serde(skip)]
    pub matching_able: bool,
    #[serde(skip)]
    pub matching_node: String,
    #[serde(skip)]
    pub trade_treat_node: String,
    #[serde(skip)]
    pub order_cancel_node: String,
    #[serde(skip)]
    pub matching: String,
    #[serde(skip)]
    pub trade_treat: String,
    #[serde(skip)]
    pub order_cancel: String,
}

impl Default for Market {
    fn default() -> Self {
        Self {
            id: 0,
            name: String::new(),
            code: String::new(),
            price_group_fixed: 0,
            sort_order: 0,
            ask_currency_id: 0,
            bid_currency_id: 0,
            ask_fee: Decimal::ZERO,
            bid_fee: Decimal::ZERO,
            ask_fixed: 0,
            bid_fixed: 0,
            visible: false,
            tradable: false,
            ticker: TickerAspect::default(),
            latest_klines: HashMap::new(),
            ack: false,
            durable: false,
            matching_able: false,
            matching_node: DEFAULT_NODE.to_string(),
            trade_treat_node: DEFAULT_NODE.to_string(),
            order_cancel_node: DEFAULT_NODE.to_string(),
            matching: String::new(),
            trade_treat: String::new(),
            order_cancel: String::new(),
        }
    }
}

impl Market {
    /// Resets the working state. Run on every record read from persistence.
    pub fn after_load(&mut self) {
        self.ticker = TickerAspect::default();
        self.latest_klines = HashMap::new();
    }

    pub fn ask_currency(&self) -> OrderCurrency {
        OrderCurrency {
            currency_id: self.ask_currency_id,
            fee: self.ask_fee,
            fixed: self.ask_fixed,
        }
    }

    pub fn bid_currency(&self) -> OrderCurrency {
        OrderCurrency {
            currency_id: self.bid_currency_id,
            fee: self.bid_fee,
            fixed: self.bid_fixed,
        }
    }
}

/// One side of a market as seen by order placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCurrency {
    pub currency_id: CurrencyId,
    pub fee: Decimal,
    pub fixed: i32,
}

/// Fields supplied by the administrative path when creating a market.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NewMarket {
    pub name: String,
    pub code: String,
    pub price_group_fixed: i32,
    pub sort_order: i32,
    pub ask_currency_id: CurrencyId,
    pub bid_currency_id: CurrencyId,
    pub ask_fee: Decimal,
    pub bid_fee: Decimal,
    pub ask_fixed: i32,
    pub bid_fixed: i32,
    pub visible: bool,
    pub tradable: bool,
    pub ack: bool,
    pub durable: bool,
    pub matching_able: bool,
    pub matching: String,
    pub trade_treat: String,
    pub order_cancel: String,
}

impl NewMarket {
    /// Materializes the record once persistence has assigned an id.
    pub fn into_market(self, id: MarketId) -> Market {
        Market {
            id,
            name: self.name,
            code: self.code,
            price_group_fixed: self.price_group_fixed,
            sort_order: self.sort_order,
            ask_currency_id: self.ask_currency_id,
            bid_currency_id: self.bid_currency_id,
            ask_fee: self.ask_fee,
            bid_fee: self.bid_fee,
            ask_fixed: self.ask_fixed,
            bid_fixed: self.bid_fixed,
            visible: self.visible,
            tradable: self.tradable,
            ack: self.ack,
            durable: self.durable,
            matching_able: self.matching_able,
            matching: self.matching,
            trade_treat: self.trade_treat,
            order_cancel: self.order_cancel,
            ..Market::default()
        }
    }
}

/// Rolling 24h statistics shown alongside a market.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickerAspect {
    pub buy: Decimal,
    pub sell: Decimal,
    pub low: Decimal,
    pub high: Decimal,
    pub last: Decimal,
    pub open: Decimal,
    pub vol: Decimal,
}

/// Ticker record stored per market in the shared tickers hash.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ticker {
    pub market_id: MarketId,
    pub name: String,
    pub at: i64,
    pub ticker: TickerAspect,
}

impl Ticker {
    /// Empty ticker published when a market is first created.
    pub fn placeholder(market: &Market) -> Self {
        Self {
            market_id: market.id,
            name: market.name.clone(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KLine {
    pub market_id: MarketId,
    pub period: Period,
    pub timestamp: i64,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}
