// Per-stage exchange, queue and node resolution
use std::fmt;

use crate::market::types::Market;

/// Pipeline phases a market's orders flow through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Matching,
    TradeTreat,
    OrderCancel,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::Matching, Stage::TradeTreat, Stage::OrderCancel];
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Matching => write!(f, "matching"),
            Stage::TradeTreat => write!(f, "trade_treat"),
            Stage::OrderCancel => write!(f, "order_cancel"),
        }
    }
}

impl Market {
    /// Exchange (queue namespace) configured for `stage`.
    pub fn exchange(&self, stage: Stage) -> &str {
        match stage {
            Stage::Matching => &self.matching,
            Stage::TradeTreat => &self.trade_treat,
            Stage::OrderCancel => &self.order_cancel,
        }
    }

    /// Queue name for `stage`: `<exchange>.<code>`.
    ///
    /// An empty exchange still yields `.<code>`.
    pub fn queue(&self, stage: Stage) -> String {
        format!("{}.{}", self.exchange(stage), self.code)
    }

    /// Node currently owning `stage` for this market. Selection is left to the deployment.
    pub fn node(&self, stage: Stage) -> &str {
        match stage {
            Stage::Matching => &self.matching_node,
            Stage::TradeTreat => &self.trade_treat_node,
            Stage::OrderCancel => &self.order_cancel_node,
        }
    }

    pub fn matching_exchange(&self) -> &str {
        self.exchange(Stage::Matching)
    }

    pub fn trade_treat_exchange(&self) -> &str {
        self.exchange(Stage::TradeTreat)
    }

    pub fn order_cancel_exchange(&self) -> &str {
        self.exchange(Stage::OrderCancel)
    }

    pub fn matching_queue(&self) -> String {
        self.queue(Stage::Matching)
    }

    pub fn trade_treat_queue(&self) -> String {
        self.queue(Stage::TradeTreat)
    }

    pub fn order_cancel_queue(&self) -> String {
        self.queue(Stage::OrderCancel)
    }
}
