use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::{debug, info, instrument};

use crate::market::types::{Market, NewMarket};
use crate::persist::types::{PersistError, PersistResult};
use crate::persist::{MarketSource, MarketWriter};

pub const MARKETS_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS markets (
    id                BIGSERIAL PRIMARY KEY,
    name              VARCHAR(16) NOT NULL DEFAULT '',
    code              VARCHAR(16) NOT NULL UNIQUE,
    price_group_fixed INTEGER NOT NULL DEFAULT 0,
    sort_order        INTEGER NOT NULL DEFAULT 0,
    ask_currency_id   BIGINT NOT NULL,
    bid_currency_id   BIGINT NOT NULL,
    ask_fee           NUMERIC(32,16),
    bid_fee           NUMERIC(32,16),
    ask_fixed         INTEGER NOT NULL DEFAULT 0,
    bid_fixed         INTEGER NOT NULL DEFAULT 0,
    visible           BOOLEAN NOT NULL DEFAULT FALSE,
    tradable          BOOLEAN NOT NULL DEFAULT FALSE,
    ack               BOOLEAN NOT NULL DEFAULT FALSE,
    durable           BOOLEAN NOT NULL DEFAULT FALSE,
    matching_able     BOOLEAN NOT NULL DEFAULT FALSE,
    matching_node     VARCHAR(11) NOT NULL DEFAULT 'a',
    trade_treat_node  VARCHAR(11) NOT NULL DEFAULT 'a',
    order_cancel_node VARCHAR(11) NOT NULL DEFAULT 'a',
    matching          VARCHAR(64) NOT NULL DEFAULT '',
    trade_treat       VARCHAR(64) NOT NULL DEFAULT '',
    order_cancel      VARCHAR(64) NOT NULL DEFAULT '',
    created_at        TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at        TIMESTAMPTZ NOT NULL DEFAULT now()
)
"#;

const MARKET_COLUMNS: &str = "id, name, code, price_group_fixed, sort_order, \
    ask_currency_id, bid_currency_id, ask_fee, bid_fee, ask_fixed, bid_fixed, \
    visible, tradable, ack, durable, matching_able, \
    matching_node, trade_treat_node, order_cancel_node, \
    matching, trade_treat, order_cancel";

pub struct PostgresMarketStore {
    connection_pool: sqlx::PgPool,
}

impl PostgresMarketStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> PersistResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        info!(max_connections = max_connections, "Connected to market database");
        Ok(Self { connection_pool: pool })
    }

    pub fn from_pool(pool: sqlx::PgPool) -> Self {
        Self { connection_pool: pool }
    }

    /// Creates the markets table when missing.
    pub async fn ensure_schema(&self) -> PersistResult<()> {
        sqlx::query(MARKETS_DDL).execute(&self.connection_pool).await?;
        Ok(())
    }
}

fn market_from_row(row: &PgRow) -> PersistResult<Market> {
    // Fees are nullable in the table; a missing fee means no fee.
    let ask_fee: Option<Decimal> = row.try_get("ask_fee")?;
    let bid_fee: Option<Decimal> = row.try_get("bid_fee")?;

    Ok(Market {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        code: row.try_get("code")?,
        price_group_fixed: row.try_get("price_group_fixed")?,
        sort_order: row.try_get("sort_order")?,
        ask_currency_id: row.try_get("ask_currency_id")?,
        bid_currency_id: row.try_get("bid_currency_id")?,
        ask_fee: ask_fee.unwrap_or(Decimal::ZERO),
        bid_fee: bid_fee.unwrap_or(Decimal::ZERO),
        ask_fixed: row.try_get("ask_fixed")?,
        bid_fixed: row.try_get("bid_fixed")?,
        visible: row.try_get("visible")?,
        tradable: row.try_get("tradable")?,
        ack: row.try_get("ack")?,
        durable: row.try_get("durable")?,
        matching_able: row.try_get("matching_able")?,
        matching_node: row.try_get("matching_node")?,
        trade_treat_node: row.try_get("trade_treat_node")?,
        order_cancel_node: row.try_get("order_cancel_node")?,
        matching: row.try_get("matching")?,
        trade_treat: row.try_get("trade_treat")?,
        order_cancel: row.try_get("order_cancel")?,
        ..Market::default()
    })
}

#[async_trait]
impl MarketSource for PostgresMarketStore {
    #[instrument(skip_all)]
    async fn visible_markets(&self) -> PersistResult<Vec<Market>> {
        let sql = format!("SELECT {} FROM markets WHERE visible = $1 ORDER BY sort_order, id", MARKET_COLUMNS);
        let rows = sqlx::query(&sql)
            .bind(true)
            .fetch_all(&self.connection_pool)
            .await?;
        debug!(rows = rows.len(), "Fetched visible markets");

        rows.iter().map(market_from_row).collect()
    }
}

#[async_trait]
impl MarketWriter for PostgresMarketStore {
    #[instrument(skip_all, fields(code = %new.code))]
    async fn insert_market(&self, new: &NewMarket) -> PersistResult<Market> {
        let sql = format!(
            r#"
            INSERT INTO markets (
                name, code, price_group_fixed, sort_order,
                ask_currency_id, bid_currency_id, ask_fee, bid_fee, ask_fixed, bid_fixed,
                visible, tradable, ack, durable, matching_able,
                matching, trade_treat, order_cancel
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            RETURNING {}
            "#,
            MARKET_COLUMNS
        );

        let row = sqlx::query(&sql)
            .bind(&new.name)
            .bind(&new.code)
            .bind(new.price_group_fixed)
            .bind(new.sort_order)
            .bind(new.ask_currency_id)
            .bind(new.bid_currency_id)
            .bind(new.ask_fee)
            .bind(new.bid_fee)
            .bind(new.ask_fixed)
            .bind(new.bid_fixed)
            .bind(new.visible)
            .bind(new.tradable)
            .bind(new.ack)
            .bind(new.durable)
            .bind(new.matching_able)
            .bind(&new.matching)
            .bind(&new.trade_treat)
            .bind(&new.order_cancel)
            .fetch_one(&self.connection_pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                    PersistError::DuplicateCode(new.code.clone())
                }
                other => PersistError::from(other),
            })?;

        market_from_row(&row)
    }
}
