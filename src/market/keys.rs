//! Cache keys and pub/sub channel names for market-data artifacts.
//!
//! Every cache key sits under [`KEY_PREFIX`] so it cannot clash with unrelated
//! data sharing the same store.

use crate::market::types::{Market, MarketId, Period};

pub const KEY_PREFIX: &str = "goDCE";

/// Hash collection holding one ticker per market, keyed by market id.
pub const TICKERS_KEY: &str = "goDCE:tickers";

/// Single channel used for every k-line update, whatever the market or period.
pub const KLINE_NOTIFY_CHANNEL: &str = "market:kLine:notify";

pub fn ticker_key(code: &str) -> String {
    format!("{}:ticker:{}", KEY_PREFIX, code)
}

pub fn latest_trades_key(code: &str) -> String {
    format!("{}:latestTrades:{}", KEY_PREFIX, code)
}

pub fn ask_key(id: MarketId) -> String {
    format!("{}:depth:{}:ask", KEY_PREFIX, id)
}

pub fn bid_key(id: MarketId) -> String {
    format!("{}:depth:{}:bid", KEY_PREFIX, id)
}

pub fn kline_key(id: MarketId, period: Period) -> String {
    format!("{}:k:{}:{}", KEY_PREFIX, id, period)
}

pub fn ticker_channel(id: MarketId) -> String {
    format!("market:ticker:notify:{}", id)
}

impl Market {
    pub fn ticker_key(&self) -> String {
        ticker_key(&self.code)
    }

    pub fn latest_trades_key(&self) -> String {
        latest_trades_key(&self.code)
    }

    pub fn ask_key(&self) -> String {
        ask_key(self.id)
    }

    pub fn bid_key(&self) -> String {
        bid_key(self.id)
    }

    pub fn kline_key(&self, period: Period) -> String {
        kline_key(self.id, period)
    }

    pub fn ticker_notify(&self) -> String {
        ticker_channel(self.id)
    }

    pub fn kline_notify(&self, _period: Period) -> &'static str {
        KLINE_NOTIFY_CHANNEL
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn market(id: MarketId, code: &str) -> Market {
        Market { id, code: code.into(), visible: true, ..Market::default() }
    }

    #[test]
    fn test_key_formats() {
        let m = market(3, "btcusd");
        assert_eq!(m.ticker_key(), "goDCE:ticker:btcusd");
        assert_eq!(m.latest_trades_key(), "goDCE:latestTrades:btcusd");
        assert_eq!(m.ask_key(), "goDCE:depth:3:ask");
        assert_eq!(m.bid_key(), "goDCE:depth:3:bid");
        assert_eq!(m.kline_key(15), "goDCE:k:3:15");
    }

    #[test]
    fn test_channels() {
        let m = market(3, "btcusd");
        assert_eq!(m.ticker_notify(), "market:ticker:notify:3");
        assert_eq!(m.kline_notify(1), "market:kLine:notify");
        assert_eq!(m.kline_notify(60), m.kline_notify(1));
        assert_eq!(market(4, "ethusd").kline_notify(5), KLINE_NOTIFY_CHANNEL);
    }

    #[test]
    fn test_sides_differ() {
        let m = market(3, "btcusd");
        assert_ne!(m.ask_key(), m.bid_key());
    }

    #[test]
    fn test_all_keys_prefixed() {
        let m = market(11, "ltcusd");
        for key in [m.ticker_key(), m.latest_trades_key(), m.ask_key(), m.bid_key(), m.kline_key(30)] {
            assert!(key.starts_with("goDCE:"), "{}", key);
        }
    }

    proptest! {
        #[test]
        fn prop_distinct_markets_distinct_keys(
            id1 in 1i64..100_000,
            id2 in 1i64..100_000,
            code1 in "[a-z]{3,8}",
            code2 in "[a-z]{3,8}",
            period in prop::sample::select(vec![1i64, 5, 15, 30, 60, 1440]),
        ) {
            prop_assume!(id1 != id2 && code1 != code2);
            let (a, b) = (market(id1, &code1), market(id2, &code2));
            prop_assert_ne!(a.ticker_key(), b.ticker_key());
            prop_assert_ne!(a.latest_trades_key(), b.latest_trades_key());
            prop_assert_ne!(a.ask_key(), b.ask_key());
            prop_assert_ne!(a.bid_key(), b.bid_key());
            prop_assert_ne!(a.kline_key(period), b.kline_key(period));
            prop_assert_ne!(a.ticker_notify(), b.ticker_notify());
        }

        #[test]
        fn prop_distinct_periods_distinct_kline_keys(
            id in 1i64..100_000,
            p1 in 1i64..100_000,
            p2 in 1i64..100_000,
        ) {
            prop_assume!(p1 != p2);
            let m = market(id, "btcusd");
            prop_assert_ne!(m.kline_key(p1), m.kline_key(p2));
        }

        #[test]
        fn prop_kline_keys_injective_across_markets(
            id1 in 1i64..1_000, p1 in 1i64..1_000,
            id2 in 1i64..1_000, p2 in 1i64..1_000,
        ) {
            prop_assume!((id1, p1) != (id2, p2));
            prop_assert_ne!(kline_key(id1, p1), kline_key(id2, p2));
        }
    }
}
